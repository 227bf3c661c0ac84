use std::collections::HashMap;

use bevy::prelude::*;

use interplay_protocol::config::FocusConfig;
use interplay_protocol::geometry::{Collider, SceneGeometry, ViewPoint};
use interplay_protocol::handle::{EntityRef, ObjectHandle};
use interplay_protocol::presentation::SharedPrompt;
use interplay_protocol::replication::ReplicationTracker;
use interplay_protocol::scenario::Scenario;
use interplay_protocol::world::InteractionWorld;

/// Radius of the sphere standing in for a connected player's body.
pub const BODY_RADIUS: f32 = 0.3;

/// A connected client and the objects it controls.
pub struct PlayerState {
    pub name: String,
    pub entity: EntityRef,
    pub body: ObjectHandle,
}

/// Server-side session containing all authoritative interaction state.
#[derive(Resource)]
pub struct ServerSession {
    pub elapsed: f32,
    pub world: InteractionWorld,
    pub geometry: SceneGeometry,
    pub tracker: ReplicationTracker,
    pub players: HashMap<u64, PlayerState>,
    focus: FocusConfig,
    /// Props still waiting for their scripted deactivation.
    pending_disables: Vec<(ObjectHandle, f32)>,
}

impl ServerSession {
    pub fn new(scenario: &Scenario) -> Self {
        let mut world = InteractionWorld::authoritative();
        let mut geometry = SceneGeometry::default();
        let props = scenario.populate(&mut world, &mut geometry, |_| {
            Box::new(SharedPrompt::default())
        });

        let pending_disables = props
            .iter()
            .zip(&scenario.props)
            .filter_map(|(object, prop)| prop.disable_after.map(|after| (*object, after)))
            .collect();

        Self {
            elapsed: 0.0,
            world,
            geometry,
            tracker: ReplicationTracker::default(),
            players: HashMap::new(),
            focus: scenario.focus,
            pending_disables,
        }
    }

    /// Spawn a body and a controller for a new client. The entity id is
    /// the client id.
    pub fn add_player(&mut self, client_id: u64, name: String) -> EntityRef {
        if let Some(existing) = self.players.get(&client_id) {
            return existing.entity;
        }

        let entity = EntityRef(client_id);
        let view = ViewPoint::default();
        let body = self.world.spawn_object();
        self.geometry.insert(
            body,
            Collider::Sphere {
                center: view.eye,
                radius: BODY_RADIUS,
            },
        );
        self.world.add_controller(entity, Some(body), self.focus);
        self.players.insert(client_id, PlayerState { name, entity, body });
        entity
    }

    /// Ends the player's interaction and focus, then despawns its body.
    pub fn remove_player(&mut self, client_id: u64) -> Option<PlayerState> {
        let player = self.players.remove(&client_id)?;
        self.world.remove_controller(player.entity);
        self.world.despawn_object(player.body);
        self.geometry.remove(player.body);
        Some(player)
    }

    pub fn update_view(&mut self, client_id: u64, view: ViewPoint) {
        let Some(player) = self.players.get(&client_id) else {
            return;
        };
        if let Some(Collider::Sphere { center, .. }) = self.geometry.get_mut(player.body) {
            *center = view.eye;
        }
        self.world.set_view(player.entity, view);
    }

    /// Deactivate every prop whose scripted time has come. Returns them.
    pub fn run_schedule(&mut self) -> Vec<ObjectHandle> {
        let now = self.elapsed;
        let (due, pending): (Vec<_>, Vec<_>) = self
            .pending_disables
            .drain(..)
            .partition(|(_, after)| *after <= now);
        self.pending_disables = pending;

        due.into_iter()
            .map(|(object, _)| {
                self.world.deactivate(object);
                object
            })
            .collect()
    }
}
