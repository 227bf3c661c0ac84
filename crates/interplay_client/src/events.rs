use std::sync::Mutex;

use bevy::prelude::*;

pub use interplay_protocol::events::{InteractionEvent, InteractionEventKind, InteractionListener};
use interplay_protocol::events::dispatch;

// --- Events ---

/// A lifecycle event of an interactable, as observed by the local world.
#[derive(Event, Debug, Clone, Copy)]
pub struct InteractionLifecycleEvent(pub InteractionEvent);

/// Player input for the interact key.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractInput {
    Pressed,
    Released,
}

// --- Registry ---

#[derive(Resource)]
struct ListenerRegistry {
    listeners: Vec<Box<dyn InteractionListener>>,
}

// --- Dispatch system ---

fn dispatch_lifecycle(
    mut reader: EventReader<InteractionLifecycleEvent>,
    registry: Res<ListenerRegistry>,
) {
    for event in reader.read() {
        for listener in &registry.listeners {
            dispatch(listener.as_ref(), &event.0);
        }
    }
}

// --- EventsPlugin builder ---

pub struct EventsPlugin {
    listeners: Mutex<Vec<Box<dyn InteractionListener>>>,
}

impl EventsPlugin {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn new_with(listeners: Vec<Box<dyn InteractionListener>>) -> Self {
        Self {
            listeners: Mutex::new(listeners),
        }
    }

    pub fn add_listener(self, listener: impl InteractionListener) -> Self {
        self.listeners.lock().unwrap().push(Box::new(listener));
        self
    }
}

impl Default for EventsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for EventsPlugin {
    fn build(&self, app: &mut App) {
        let listeners = self.listeners.lock().unwrap().drain(..).collect();
        app.insert_resource(ListenerRegistry { listeners });

        app.add_event::<InteractionLifecycleEvent>()
            .add_event::<InteractInput>()
            .add_systems(PostUpdate, dispatch_lifecycle);
    }
}
