use bevy::prelude::*;

use interplay_protocol::protocol::{ClientMessage, ServerMessage};

use crate::ClientTransportRes;
use crate::interaction::ClientSession;

/// Receives all server messages and applies them to the client state.
pub fn client_receive_messages(
    transport: Res<ClientTransportRes>,
    mut session: ResMut<ClientSession>,
) {
    let messages = transport.0.receive();

    for msg in messages {
        match msg {
            ServerMessage::Welcome { entity } => {
                session.welcome(entity);
                info!("Joined as entity {}", entity.0);
            }

            ServerMessage::InteractableState(state) => {
                if !session.world.apply_snapshot(&state) {
                    warn!("State for unknown interactable {:?}", state.object);
                }
            }
        }
    }
}

/// Tell the server we are leaving when the app shuts down.
pub fn client_leave_on_exit(
    mut exits: EventReader<AppExit>,
    transport: Res<ClientTransportRes>,
) {
    if exits.read().next().is_some() {
        transport.0.send(ClientMessage::Leave);
    }
}
