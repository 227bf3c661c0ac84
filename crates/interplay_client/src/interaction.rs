use std::collections::HashMap;

use bevy::prelude::*;

use interplay_protocol::config::FocusConfig;
use interplay_protocol::geometry::{SceneGeometry, ViewPoint};
use interplay_protocol::handle::{EntityRef, ObjectHandle};
use interplay_protocol::presentation::{PromptView, SharedPrompt};
use interplay_protocol::protocol::ClientMessage;
use interplay_protocol::scenario::Scenario;
use interplay_protocol::world::InteractionWorld;

use crate::ClientTransportRes;
use crate::events::{InteractInput, InteractionLifecycleEvent};

/// Client-side mirror of the interaction subsystem: a proxy world holding
/// the local player only, predicted locally and corrected by the server.
#[derive(Resource)]
pub struct ClientSession {
    pub world: InteractionWorld,
    pub geometry: SceneGeometry,
    pub prompts: HashMap<ObjectHandle, SharedPrompt>,
    pub focus: FocusConfig,
    pub local: Option<EntityRef>,
}

impl ClientSession {
    pub fn new(scenario: &Scenario) -> Self {
        let mut world = InteractionWorld::proxy();
        let mut geometry = SceneGeometry::default();
        let mut created = Vec::new();
        let props = scenario.populate(&mut world, &mut geometry, |_| {
            let prompt = SharedPrompt::default();
            created.push(prompt.clone());
            Box::new(prompt)
        });
        let prompts = props.into_iter().zip(created).collect();

        Self {
            world,
            geometry,
            prompts,
            focus: scenario.focus,
            local: None,
        }
    }

    /// Take control of `entity` once the server welcomed us.
    pub fn welcome(&mut self, entity: EntityRef) {
        if let Some(previous) = self.local.replace(entity) {
            self.world.remove_controller(previous);
        }
        self.world.add_controller(entity, None, self.focus);
    }

    /// Prompt state of whatever the local player is looking at.
    pub fn focused_prompt(&self) -> Option<(ObjectHandle, PromptView)> {
        let target = self.world.controller(self.local?)?.current_target()?;
        let prompt = self.prompts.get(&target)?;
        Some((target, prompt.view()))
    }
}

/// Where the local player is looking. Gameplay code writes it, the
/// interaction systems read it.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct ViewerPose(pub ViewPoint);

/// What the prompt widget should currently draw.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct FocusedPrompt(pub Option<(ObjectHandle, PromptView)>);

/// Push a changed pose into the local world and on to the server.
pub fn client_apply_view(
    pose: Res<ViewerPose>,
    mut session: ResMut<ClientSession>,
    transport: Res<ClientTransportRes>,
) {
    let Some(local) = session.local else {
        return;
    };
    if session.world.controller(local).map(|c| c.view()) == Some(pose.0) {
        return;
    }

    session.world.set_view(local, pose.0);
    transport.0.send(ClientMessage::ViewUpdate {
        eye: pose.0.eye,
        direction: pose.0.direction,
    });
}

pub fn client_handle_input(
    mut inputs: EventReader<InteractInput>,
    mut session: ResMut<ClientSession>,
) {
    let Some(local) = session.local else {
        inputs.clear();
        return;
    };

    for input in inputs.read() {
        match input {
            InteractInput::Pressed => {
                let outcome = session.world.begin_interact(local);
                debug!("Interact pressed: {:?}", outcome);
            }
            InteractInput::Released => session.world.end_interact(local),
        }
    }
}

pub fn client_step(time: Res<Time>, mut session: ResMut<ClientSession>) {
    let ClientSession {
        ref mut world,
        ref geometry,
        ..
    } = *session;

    world.step(time.delta_secs(), geometry);
}

/// Mirror queued begin/end requests to the server.
pub fn client_flush_requests(
    mut session: ResMut<ClientSession>,
    transport: Res<ClientTransportRes>,
) {
    let Some(local) = session.local else {
        return;
    };
    for request in session.world.drain_requests(local) {
        transport.0.send(request.into());
    }
}

pub fn client_publish_prompt(session: Res<ClientSession>, mut prompt: ResMut<FocusedPrompt>) {
    let current = session.focused_prompt();
    if prompt.0 != current {
        prompt.0 = current;
    }
}

pub fn client_forward_events(
    session: Res<ClientSession>,
    mut writer: EventWriter<InteractionLifecycleEvent>,
) {
    for event in session.world.drain_events() {
        writer.send(InteractionLifecycleEvent(event));
    }
}

pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewerPose>()
            .init_resource::<FocusedPrompt>()
            .add_systems(
                Update,
                (
                    client_apply_view,
                    client_handle_input.after(client_apply_view),
                    client_step.after(client_handle_input),
                    client_flush_requests.after(client_step),
                    client_publish_prompt.after(client_step),
                    client_forward_events.after(client_step),
                )
                    .after(crate::network::client_receive_messages),
            );
    }
}
