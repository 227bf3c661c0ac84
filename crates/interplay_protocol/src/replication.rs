use std::collections::HashMap;

use tracing::debug;

use crate::handle::{InteractableRef, ObjectHandle};
use crate::protocol::ReplicatedInteractable;
use crate::world::InteractionWorld;

impl InteractionWorld {
    pub fn snapshot(&self, handle: InteractableRef) -> Option<ReplicatedInteractable> {
        let interactable = self.interactable(handle)?;
        Some(ReplicatedInteractable {
            object: handle,
            rep_key: interactable.rep_key(),
            active: interactable.is_active(),
            display_name: interactable.display_name().to_string(),
            action_text: interactable.action_text().to_string(),
        })
    }

    /// Apply authoritative state on an observer. Unknown objects are
    /// ignored; they converge once both sides agree on the scene.
    pub fn apply_snapshot(&mut self, snapshot: &ReplicatedInteractable) -> bool {
        let Some(interactable) = self.interactable(snapshot.object) else {
            return false;
        };
        let active_changed = interactable.is_active() != snapshot.active;
        let name_changed = interactable.display_name() != snapshot.display_name;
        let action_changed = interactable.action_text() != snapshot.action_text;

        if active_changed {
            if snapshot.active {
                self.activate(snapshot.object);
            } else {
                self.deactivate(snapshot.object);
            }
        }
        if name_changed {
            self.set_display_name(snapshot.object, snapshot.display_name.clone());
        }
        if action_changed {
            self.set_action_text(snapshot.object, snapshot.action_text.clone());
        }

        if active_changed || name_changed || action_changed {
            debug!(object = ?snapshot.object, "applied replicated state");
        }
        true
    }
}

/// Remembers the last replication key sent per object so only changed
/// interactables go over the wire.
#[derive(Debug, Default)]
pub struct ReplicationTracker {
    sent: HashMap<ObjectHandle, u32>,
}

impl ReplicationTracker {
    /// Snapshots whose key differs from the last one collected.
    pub fn collect_dirty(&mut self, world: &InteractionWorld) -> Vec<ReplicatedInteractable> {
        self.sent.retain(|object, _| world.interactable(*object).is_some());

        let mut dirty: Vec<_> = world
            .interactables()
            .filter(|interactable| {
                self.sent.get(&interactable.owner()) != Some(&interactable.rep_key())
            })
            .filter_map(|interactable| world.snapshot(interactable.owner()))
            .collect();
        dirty.sort_by_key(|snapshot| (snapshot.object.index, snapshot.object.generation));

        for snapshot in &dirty {
            self.sent.insert(snapshot.object, snapshot.rep_key);
        }
        dirty
    }

    /// Everything, regardless of what was sent before (initial sync).
    pub fn collect_all(world: &InteractionWorld) -> Vec<ReplicatedInteractable> {
        let mut all: Vec<_> = world
            .interactables()
            .filter_map(|interactable| world.snapshot(interactable.owner()))
            .collect();
        all.sort_by_key(|snapshot| (snapshot.object.index, snapshot.object.generation));
        all
    }
}

#[cfg(test)]
mod tests {
    use bevy_math::Vec3;

    use super::*;
    use crate::config::{FocusConfig, InteractableConfig};
    use crate::geometry::{Collider, SceneGeometry, ViewPoint};
    use crate::handle::EntityRef;
    use crate::presentation::SharedPrompt;

    fn mirrored_pair() -> (InteractionWorld, InteractionWorld, ObjectHandle, SharedPrompt) {
        let mut server = InteractionWorld::authoritative();
        let mut client = InteractionWorld::proxy();

        let on_server = server.spawn_object();
        let on_client = client.spawn_object();
        assert_eq!(on_server, on_client);

        server.attach_interactable(on_server, InteractableConfig::default(), Box::new(SharedPrompt::default()));
        let prompt = SharedPrompt::default();
        client.attach_interactable(on_client, InteractableConfig::default(), Box::new(prompt.clone()));
        (server, client, on_server, prompt)
    }

    #[test]
    fn tracker_only_resends_changed_interactables() {
        let (mut server, _, door, _) = mirrored_pair();
        let mut tracker = ReplicationTracker::default();

        assert_eq!(tracker.collect_dirty(&server).len(), 1);
        assert!(tracker.collect_dirty(&server).is_empty());

        server.set_display_name(door, "Cellar Door");
        let dirty = tracker.collect_dirty(&server);
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].display_name, "Cellar Door");
    }

    #[test]
    fn tracker_forgets_despawned_objects() {
        let (mut server, _, door, _) = mirrored_pair();
        let mut tracker = ReplicationTracker::default();
        tracker.collect_dirty(&server);
        assert!(tracker.sent.contains_key(&door));

        assert!(server.despawn_object(door));
        assert!(tracker.collect_dirty(&server).is_empty());
        assert!(tracker.sent.is_empty());
    }

    #[test]
    fn client_applies_deactivation_and_loses_focus() {
        let (mut server, mut client, door, prompt) = mirrored_pair();
        let mut scene = SceneGeometry::default();
        scene.insert(door, Collider::cube(Vec3::ZERO, 0.5));

        let me = EntityRef(0);
        client.add_controller(me, None, FocusConfig::default());
        client.set_view(me, ViewPoint {
            eye: Vec3::new(0.0, 0.0, 1.0),
            direction: Vec3::NEG_Z,
        });
        client.step(0.016, &scene);
        assert!(prompt.view().highlighted);

        server.deactivate(door);
        let snapshot = server.snapshot(door).unwrap();
        assert!(client.apply_snapshot(&snapshot));
        client.step(0.016, &scene);

        assert!(!client.interactable(door).unwrap().is_active());
        assert_eq!(client.controller(me).unwrap().current_target(), None);
        assert!(!prompt.view().visible);
        assert!(!prompt.view().highlighted);
    }

    #[test]
    fn unknown_object_is_ignored() {
        let (server, mut client, door, _) = mirrored_pair();
        let mut snapshot = server.snapshot(door).unwrap();
        snapshot.object.index += 10;
        assert!(!client.apply_snapshot(&snapshot));
    }
}
