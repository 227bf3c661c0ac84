use serde::{Deserialize, Serialize};

/// Which side of the connection an interactable copy lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetRole {
    /// Canonical server copy. Renders nothing.
    Authority,
    /// Observer copy on a client.
    Proxy,
}

impl NetRole {
    pub fn shows_highlight(self) -> bool {
        self == NetRole::Proxy
    }
}

/// Intent a client mirrors to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractRequest {
    Begin,
    End,
}

/// How a controller forwards begin/end intent. Chosen once when the
/// controller is created.
pub trait AuthorityRole: Send + Sync + 'static {
    fn is_authoritative(&self) -> bool;
    fn net_role(&self) -> NetRole {
        if self.is_authoritative() {
            NetRole::Authority
        } else {
            NetRole::Proxy
        }
    }
    fn request(&mut self, request: InteractRequest);
    /// Requests waiting to be sent to the server.
    fn drain_requests(&mut self) -> Vec<InteractRequest> {
        Vec::new()
    }
}

/// Server-side role: the local state machine is the source of truth.
#[derive(Debug, Default)]
pub struct Authoritative;

impl AuthorityRole for Authoritative {
    fn is_authoritative(&self) -> bool {
        true
    }

    fn request(&mut self, _request: InteractRequest) {}
}

/// Client-side role: every begin/end is queued for the server.
#[derive(Debug, Default)]
pub struct Proxy {
    outbox: Vec<InteractRequest>,
}

impl AuthorityRole for Proxy {
    fn is_authoritative(&self) -> bool {
        false
    }

    fn request(&mut self, request: InteractRequest) {
        self.outbox.push(request);
    }

    fn drain_requests(&mut self) -> Vec<InteractRequest> {
        std::mem::take(&mut self.outbox)
    }
}
