use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::handle::{EntityRef, InteractableRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionEventKind {
    FocusBegun,
    FocusEnded,
    InteractBegun,
    InteractEnded,
    /// Terminal event: the interaction completed.
    Interacted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub kind: InteractionEventKind,
    pub interactable: InteractableRef,
    pub entity: EntityRef,
}

// --- Listener trait ---

/// Observer of an interactable's lifecycle. Listeners are called
/// synchronously, in registration order, from inside the state machine.
#[allow(unused_variables)]
pub trait InteractionListener: Send + Sync + 'static {
    fn on_focus_begun(&self, event: &InteractionEvent) {}
    fn on_focus_ended(&self, event: &InteractionEvent) {}
    fn on_interact_begun(&self, event: &InteractionEvent) {}
    fn on_interact_ended(&self, event: &InteractionEvent) {}
    fn on_interacted(&self, event: &InteractionEvent) {}
}

/// Route an event to the listener method matching its kind.
pub fn dispatch(listener: &dyn InteractionListener, event: &InteractionEvent) {
    match event.kind {
        InteractionEventKind::FocusBegun => listener.on_focus_begun(event),
        InteractionEventKind::FocusEnded => listener.on_focus_ended(event),
        InteractionEventKind::InteractBegun => listener.on_interact_begun(event),
        InteractionEventKind::InteractEnded => listener.on_interact_ended(event),
        InteractionEventKind::Interacted => listener.on_interacted(event),
    }
}

// --- Journal ---

/// Listener that records every event so a host can drain them once per frame.
#[derive(Clone, Default)]
pub struct EventJournal {
    events: Arc<Mutex<Vec<InteractionEvent>>>,
}

impl EventJournal {
    pub fn drain(&self) -> Vec<InteractionEvent> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *events)
    }

    pub fn snapshot(&self) -> Vec<InteractionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: &InteractionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*event);
    }
}

impl InteractionListener for EventJournal {
    fn on_focus_begun(&self, event: &InteractionEvent) {
        self.record(event);
    }

    fn on_focus_ended(&self, event: &InteractionEvent) {
        self.record(event);
    }

    fn on_interact_begun(&self, event: &InteractionEvent) {
        self.record(event);
    }

    fn on_interact_ended(&self, event: &InteractionEvent) {
        self.record(event);
    }

    fn on_interacted(&self, event: &InteractionEvent) {
        self.record(event);
    }
}
