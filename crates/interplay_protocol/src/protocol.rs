use bevy_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::authority::InteractRequest;
use crate::handle::{EntityRef, ObjectHandle};

/// Server-authoritative fields of an interactable, as sent to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicatedInteractable {
    pub object: ObjectHandle,
    pub rep_key: u32,
    pub active: bool,
    pub display_name: String,
    pub action_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Ask to join the session as a new controlling entity.
    Join { player_name: String },
    /// Graceful disconnect.
    Leave,
    /// Viewer pose for the server's own focus checks.
    ViewUpdate { eye: Vec3, direction: Vec3 },
    RequestBeginInteract,
    RequestEndInteract,
}

impl From<InteractRequest> for ClientMessage {
    fn from(request: InteractRequest) -> Self {
        match request {
            InteractRequest::Begin => ClientMessage::RequestBeginInteract,
            InteractRequest::End => ClientMessage::RequestEndInteract,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Join accepted; the client now controls `entity`.
    Welcome { entity: EntityRef },
    /// Authoritative state of one interactable.
    InteractableState(ReplicatedInteractable),
}
