pub mod server_session;
pub mod systems;

use std::sync::Mutex;

use bevy::prelude::*;

use interplay_protocol::scenario::Scenario;
use interplay_protocol::transport::ServerTransport;

use server_session::ServerSession;
use systems::{
    ServerTransportRes, server_log_events, server_process_messages, server_replicate,
    server_run_schedule, server_step,
};

pub struct ServerPlugin {
    transport: Mutex<Option<Box<dyn ServerTransport>>>,
    session: Mutex<Option<ServerSession>>,
}

impl ServerPlugin {
    pub fn new(transport: impl ServerTransport, scenario: &Scenario) -> Self {
        Self {
            transport: Mutex::new(Some(Box::new(transport))),
            session: Mutex::new(Some(ServerSession::new(scenario))),
        }
    }
}

impl Plugin for ServerPlugin {
    fn build(&self, app: &mut App) {
        let transport = self
            .transport
            .lock()
            .unwrap()
            .take()
            .expect("ServerPlugin transport already taken");

        let session = self
            .session
            .lock()
            .unwrap()
            .take()
            .expect("ServerPlugin session already taken");

        info!(
            "Server ready with {} interactable(s)",
            session.world.interactables().count()
        );

        app.insert_resource(ServerTransportRes(transport))
            .insert_resource(session)
            .add_systems(
                Update,
                (
                    server_process_messages,
                    server_run_schedule.after(server_process_messages),
                    server_step.after(server_run_schedule),
                    server_log_events.after(server_step),
                    server_replicate.after(server_log_events),
                ),
            );
    }
}
