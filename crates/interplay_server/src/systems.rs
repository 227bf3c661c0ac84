use bevy::prelude::*;

use interplay_protocol::authority::InteractRequest;
use interplay_protocol::events::InteractionEventKind;
use interplay_protocol::geometry::ViewPoint;
use interplay_protocol::protocol::{ClientMessage, ServerMessage};
use interplay_protocol::replication::ReplicationTracker;
use interplay_protocol::transport::ServerTransport;

use crate::server_session::ServerSession;

/// Bevy Resource wrapping a boxed ServerTransport.
#[derive(Resource)]
pub struct ServerTransportRes(pub Box<dyn ServerTransport>);

/// Apply one client message to the authoritative session.
pub fn handle_client_message(
    session: &mut ServerSession,
    transport: &dyn ServerTransport,
    client_id: u64,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::Join { player_name } => {
            let entity = session.add_player(client_id, player_name.clone());
            transport.send(client_id, ServerMessage::Welcome { entity });

            // Initial sync: full state of every interactable
            for snapshot in ReplicationTracker::collect_all(&session.world) {
                transport.send(client_id, ServerMessage::InteractableState(snapshot));
            }

            info!("Player '{}' (id={}) joined", player_name, client_id);
        }

        ClientMessage::Leave => {
            if let Some(player) = session.remove_player(client_id) {
                info!("Player '{}' (id={}) left", player.name, client_id);
            }
        }

        ClientMessage::ViewUpdate { eye, direction } => {
            session.update_view(client_id, ViewPoint { eye, direction });
        }

        ClientMessage::RequestBeginInteract => {
            apply_request(session, client_id, InteractRequest::Begin);
        }

        ClientMessage::RequestEndInteract => {
            apply_request(session, client_id, InteractRequest::End);
        }
    }
}

fn apply_request(session: &mut ServerSession, client_id: u64, request: InteractRequest) {
    let Some(entity) = session.players.get(&client_id).map(|p| p.entity) else {
        warn!("Interact request from unknown client {}", client_id);
        return;
    };
    session.world.apply_request(entity, request);
}

/// Process all incoming client messages.
pub fn server_process_messages(
    mut session: ResMut<ServerSession>,
    transport: Res<ServerTransportRes>,
) {
    for (client_id, msg) in transport.0.receive() {
        handle_client_message(&mut session, transport.0.as_ref(), client_id, msg);
    }
}

/// Run the scripted prop changes of the scenario.
pub fn server_run_schedule(time: Res<Time>, mut session: ResMut<ServerSession>) {
    session.elapsed += time.delta_secs();

    for object in session.run_schedule() {
        let name = session
            .world
            .interactable(object)
            .map(|i| i.display_name().to_string())
            .unwrap_or_default();
        info!("'{}' deactivated", name);
    }
}

/// Advance focus checks, hold timers and progress refreshes.
pub fn server_step(time: Res<Time>, mut session: ResMut<ServerSession>) {
    let ServerSession {
        ref mut world,
        ref geometry,
        ..
    } = *session;

    world.step(time.delta_secs(), geometry);
}

/// Log the authoritative lifecycle events of this frame.
pub fn server_log_events(session: Res<ServerSession>) {
    for event in session.world.drain_events() {
        let name = session
            .world
            .interactable(event.interactable)
            .map(|i| i.display_name())
            .unwrap_or("<gone>");
        match event.kind {
            InteractionEventKind::Interacted => {
                info!("Entity {} interacted with '{}'", event.entity.0, name);
            }
            kind => debug!("Entity {} {:?} '{}'", event.entity.0, kind, name),
        }
    }
}

/// Broadcast interactables whose replicated state changed.
pub fn server_replicate(mut session: ResMut<ServerSession>, transport: Res<ServerTransportRes>) {
    let ServerSession {
        ref world,
        ref mut tracker,
        ..
    } = *session;

    for snapshot in tracker.collect_dirty(world) {
        transport.0.broadcast(ServerMessage::InteractableState(snapshot));
    }
}
