pub mod events;
pub mod interaction;
pub mod network;

use std::sync::Mutex;

use bevy::prelude::*;
use interplay_protocol::events::InteractionListener;
use interplay_protocol::protocol::ClientMessage;
use interplay_protocol::scenario::Scenario;
use interplay_protocol::transport::ClientTransport;

use events::EventsPlugin;
use interaction::{ClientSession, InteractionPlugin};

/// Bevy Resource wrapping a boxed ClientTransport.
#[derive(Resource)]
pub struct ClientTransportRes(pub Box<dyn ClientTransport>);

/// The client plugin composes all client-side functionality:
/// local prediction, input, prompt state and listener dispatch.
pub struct ClientPlugin {
    transport: Mutex<Option<Box<dyn ClientTransport>>>,
    session: Mutex<Option<ClientSession>>,
    player_name: String,
    listeners: Mutex<Vec<Box<dyn InteractionListener>>>,
}

impl ClientPlugin {
    pub fn new(
        transport: Box<dyn ClientTransport>,
        scenario: &Scenario,
        player_name: impl Into<String>,
    ) -> Self {
        Self {
            transport: Mutex::new(Some(transport)),
            session: Mutex::new(Some(ClientSession::new(scenario))),
            player_name: player_name.into(),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn with_listener(self, listener: impl InteractionListener) -> Self {
        self.listeners.lock().unwrap().push(Box::new(listener));
        self
    }
}

impl Plugin for ClientPlugin {
    fn build(&self, app: &mut App) {
        let transport = self
            .transport
            .lock()
            .unwrap()
            .take()
            .expect("ClientPlugin transport already taken");

        let session = self
            .session
            .lock()
            .unwrap()
            .take()
            .expect("ClientPlugin session already taken");

        let listeners = self.listeners.lock().unwrap().drain(..).collect();

        transport.send(ClientMessage::Join {
            player_name: self.player_name.clone(),
        });

        app.insert_resource(ClientTransportRes(transport))
            .insert_resource(session)
            .add_plugins(EventsPlugin::new_with(listeners))
            .add_plugins(InteractionPlugin)
            .add_systems(Update, network::client_receive_messages)
            .add_systems(Last, network::client_leave_on_exit);
    }
}

#[cfg(test)]
mod tests {
    use interplay_protocol::Vec3;
    use interplay_protocol::events::{EventJournal, InteractionEventKind};
    use interplay_protocol::geometry::ViewPoint;
    use interplay_protocol::handle::EntityRef;
    use interplay_protocol::protocol::ServerMessage;
    use interplay_protocol::transport::{ServerTransport, create_local_transport};

    use super::*;
    use crate::events::InteractInput;
    use crate::interaction::{FocusedPrompt, ViewerPose};

    fn facing_chest() -> ViewPoint {
        ViewPoint {
            eye: Vec3::new(0.0, 0.0, 2.0),
            direction: Vec3::NEG_Z,
        }
    }

    fn kinds(journal: &EventJournal) -> Vec<InteractionEventKind> {
        journal.drain().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn predicts_locally_and_mirrors_to_the_server() {
        let scenario = Scenario::default();
        let (client, server) = create_local_transport();
        let journal = EventJournal::default();

        let mut app = App::new();
        app.init_resource::<Time>().add_plugins(
            ClientPlugin::new(Box::new(client), &scenario, "Ada").with_listener(journal.clone()),
        );
        assert_eq!(
            server.receive(),
            vec![(
                0,
                ClientMessage::Join {
                    player_name: "Ada".to_string()
                }
            )]
        );

        server.send(0, ServerMessage::Welcome { entity: EntityRef(0) });
        app.world_mut().resource_mut::<ViewerPose>().0 = facing_chest();
        app.update();

        assert_eq!(kinds(&journal), vec![InteractionEventKind::FocusBegun]);
        let (chest, prompt) = app
            .world()
            .resource::<FocusedPrompt>()
            .0
            .clone()
            .unwrap();
        assert_eq!(prompt.name, "Chest");
        assert!(prompt.visible);
        assert!(prompt.highlighted);
        assert!(matches!(
            server.receive().as_slice(),
            [(0, ClientMessage::ViewUpdate { .. })]
        ));

        app.world_mut().send_event(InteractInput::Pressed);
        app.update();
        assert_eq!(kinds(&journal), vec![InteractionEventKind::InteractBegun]);
        assert_eq!(
            server.receive(),
            vec![(0, ClientMessage::RequestBeginInteract)]
        );

        let session = app.world().resource::<ClientSession>();
        let mut state = session.world.snapshot(chest).unwrap();
        state.active = false;
        server.broadcast(ServerMessage::InteractableState(state));
        app.update();

        assert_eq!(
            kinds(&journal),
            vec![
                InteractionEventKind::FocusEnded,
                InteractionEventKind::InteractEnded
            ]
        );
        assert_eq!(app.world().resource::<FocusedPrompt>().0, None);
    }

    #[test]
    fn input_before_welcome_is_dropped() {
        let (client, server) = create_local_transport();
        let mut app = App::new();
        app.init_resource::<Time>().add_plugins(ClientPlugin::new(
            Box::new(client),
            &Scenario::default(),
            "Ada",
        ));
        server.receive();

        app.world_mut().send_event(InteractInput::Pressed);
        app.update();

        assert!(server.receive().is_empty());
        assert!(app.world().resource::<ClientSession>().local.is_none());
    }
}
