use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::authority::{Authoritative, AuthorityRole, InteractRequest, NetRole, Proxy};
use crate::config::{FocusConfig, InteractableConfig};
use crate::events::{EventJournal, InteractionEvent, InteractionListener};
use crate::focus::{Controller, FocusChange, Interactables};
use crate::geometry::{ViewPoint, WorldQuery};
use crate::handle::{EntityRef, InteractableRef, ObjectHandle, ObjectTable};
use crate::interactable::{Interactable, SessionClock};
use crate::presentation::Presentation;
use crate::session::SessionOutcome;
use crate::timer::{TimerService, TimerWheel};

/// Answers progress queries from the controllers' running sessions.
struct SessionView<'a> {
    controllers: &'a BTreeMap<EntityRef, Controller>,
    timers: &'a TimerWheel<EntityRef>,
}

impl SessionClock for SessionView<'_> {
    fn remaining_time(&self, entity: EntityRef) -> Option<f32> {
        let session = self.controllers.get(&entity)?.session()?;
        self.timers
            .is_active(session.timer)
            .then(|| session.remaining(self.timers))
    }
}

/// One participant's view of the interaction subsystem: the objects,
/// their interactables, the controllers driving them, and the timer wheel.
///
/// The server runs an authoritative world holding every player; each client
/// runs a proxy world holding its local player only.
pub struct InteractionWorld {
    net_role: NetRole,
    objects: ObjectTable,
    interactables: Interactables,
    controllers: BTreeMap<EntityRef, Controller>,
    timers: TimerWheel<EntityRef>,
    journal: EventJournal,
    now: f32,
}

impl InteractionWorld {
    pub fn new(net_role: NetRole) -> Self {
        Self {
            net_role,
            objects: ObjectTable::default(),
            interactables: Interactables::new(),
            controllers: BTreeMap::new(),
            timers: TimerWheel::default(),
            journal: EventJournal::default(),
            now: 0.0,
        }
    }

    pub fn authoritative() -> Self {
        Self::new(NetRole::Authority)
    }

    pub fn proxy() -> Self {
        Self::new(NetRole::Proxy)
    }

    pub fn net_role(&self) -> NetRole {
        self.net_role
    }

    pub fn now(&self) -> f32 {
        self.now
    }

    // --- Objects ---

    pub fn spawn_object(&mut self) -> ObjectHandle {
        self.objects.spawn()
    }

    pub fn object_exists(&self, object: ObjectHandle) -> bool {
        self.objects.contains(object)
    }

    /// Destroys the object together with its interactable. Controllers
    /// engaged with it drop their target silently.
    pub fn despawn_object(&mut self, object: ObjectHandle) -> bool {
        if !self.objects.despawn(object) {
            return false;
        }
        for controller in self.controllers.values_mut() {
            if controller.current_target() == Some(object) {
                controller.forget_target(&mut self.timers);
            }
        }
        self.interactables.remove(&object);
        true
    }

    // --- Interactables ---

    /// Attach an interactable to a live object. Returns false if the owner
    /// is gone or already has one.
    pub fn attach_interactable(
        &mut self,
        owner: ObjectHandle,
        config: InteractableConfig,
        presentation: Box<dyn Presentation>,
    ) -> bool {
        if !self.objects.contains(owner) || self.interactables.contains_key(&owner) {
            return false;
        }
        let mut interactable = Interactable::new(owner, self.net_role, config, presentation);
        interactable.add_listener(Arc::new(self.journal.clone()));
        self.interactables.insert(owner, interactable);
        true
    }

    pub fn interactable(&self, handle: InteractableRef) -> Option<&Interactable> {
        if !self.objects.contains(handle) {
            return None;
        }
        self.interactables.get(&handle)
    }

    pub fn interactables(&self) -> impl Iterator<Item = &Interactable> {
        self.interactables.values()
    }

    pub fn add_listener(
        &mut self,
        handle: InteractableRef,
        listener: Arc<dyn InteractionListener>,
    ) -> bool {
        match self.interactable_mut(handle) {
            Some(interactable) => {
                interactable.add_listener(listener);
                true
            }
            None => false,
        }
    }

    pub fn can_interact(&self, handle: InteractableRef, entity: EntityRef) -> bool {
        self.interactable(handle)
            .is_some_and(|interactable| interactable.can_interact(entity))
    }

    /// Disables the interactable. Every interactor's pending hold is
    /// cancelled before the interactable ends their focus and interaction.
    pub fn deactivate(&mut self, handle: InteractableRef) {
        let Some(interactable) = self.interactables.get(&handle) else {
            return;
        };
        let interactors = interactable.interactors().to_vec();

        for controller in self.controllers.values_mut() {
            let engaged = interactors.contains(&controller.entity());
            let holding_on_target = controller
                .session()
                .is_some_and(|session| session.target == handle);
            if holding_on_target {
                controller.cancel_session(&mut self.timers);
            }
            if engaged && controller.current_target() == Some(handle) {
                controller.forget_target(&mut self.timers);
            }
        }

        if let Some(interactable) = self.interactable_mut(handle) {
            debug!(?handle, "interactable deactivated");
            interactable.deactivate();
        }
    }

    pub fn activate(&mut self, handle: InteractableRef) {
        if let Some(interactable) = self.interactable_mut(handle) {
            interactable.activate();
        }
    }

    pub fn set_display_name(&mut self, handle: InteractableRef, text: impl Into<String>) {
        let clock = SessionView {
            controllers: &self.controllers,
            timers: &self.timers,
        };
        if let Some(interactable) = self.interactables.get_mut(&handle) {
            interactable.set_display_name(text, &clock);
        }
    }

    pub fn set_action_text(&mut self, handle: InteractableRef, text: impl Into<String>) {
        let clock = SessionView {
            controllers: &self.controllers,
            timers: &self.timers,
        };
        if let Some(interactable) = self.interactables.get_mut(&handle) {
            interactable.set_action_text(text, &clock);
        }
    }

    pub fn interaction_progress(&self, handle: InteractableRef) -> f32 {
        let clock = SessionView {
            controllers: &self.controllers,
            timers: &self.timers,
        };
        self.interactable(handle)
            .map_or(0.0, |interactable| interactable.interaction_progress(&clock))
    }

    fn interactable_mut(&mut self, handle: InteractableRef) -> Option<&mut Interactable> {
        if !self.objects.contains(handle) {
            return None;
        }
        self.interactables.get_mut(&handle)
    }

    // --- Controllers ---

    /// Register a controlling entity. Its authority strategy follows the
    /// world's role.
    pub fn add_controller(
        &mut self,
        entity: EntityRef,
        body: Option<ObjectHandle>,
        config: FocusConfig,
    ) {
        let role: Box<dyn AuthorityRole> = match self.net_role {
            NetRole::Authority => Box::new(Authoritative),
            NetRole::Proxy => Box::new(Proxy::default()),
        };
        self.controllers
            .insert(entity, Controller::new(entity, body, config, role));
    }

    /// Removes the controller after ending its interaction and focus.
    pub fn remove_controller(&mut self, entity: EntityRef) -> Option<Controller> {
        let mut controller = self.controllers.remove(&entity)?;
        controller.end_interact(&mut self.interactables, &mut self.timers);
        controller.cancel_session(&mut self.timers);
        if let Some(target) = controller.current_target() {
            if let Some(interactable) = self.interactables.get_mut(&target) {
                interactable.end_focus(entity);
            }
        }
        Some(controller)
    }

    pub fn controller(&self, entity: EntityRef) -> Option<&Controller> {
        self.controllers.get(&entity)
    }

    pub fn controllers(&self) -> impl Iterator<Item = &Controller> {
        self.controllers.values()
    }

    pub fn set_view(&mut self, entity: EntityRef, view: ViewPoint) {
        if let Some(controller) = self.controllers.get_mut(&entity) {
            controller.set_view(view);
        }
    }

    pub fn begin_interact(&mut self, entity: EntityRef) -> SessionOutcome {
        let outcome = match self.controllers.get_mut(&entity) {
            Some(controller) => controller.begin_interact(&mut self.interactables, &mut self.timers),
            None => SessionOutcome::Ignored,
        };
        self.refresh_progress();
        outcome
    }

    pub fn end_interact(&mut self, entity: EntityRef) {
        if let Some(controller) = self.controllers.get_mut(&entity) {
            controller.end_interact(&mut self.interactables, &mut self.timers);
        }
        self.refresh_progress();
    }

    pub fn apply_request(&mut self, entity: EntityRef, request: InteractRequest) {
        match request {
            InteractRequest::Begin => {
                self.begin_interact(entity);
            }
            InteractRequest::End => self.end_interact(entity),
        }
    }

    /// Runs one focus check right now, ignoring the check interval.
    pub fn perform_check(&mut self, entity: EntityRef, query: &dyn WorldQuery) -> FocusChange {
        match self.controllers.get_mut(&entity) {
            Some(controller) => controller.perform_check(
                self.now,
                query,
                &mut self.interactables,
                &mut self.timers,
            ),
            None => FocusChange::Unchanged,
        }
    }

    pub fn is_interacting(&self, entity: EntityRef) -> bool {
        self.controllers
            .get(&entity)
            .is_some_and(|controller| controller.is_interacting(&self.timers))
    }

    pub fn remaining_interact_time(&self, entity: EntityRef) -> f32 {
        self.controllers
            .get(&entity)
            .map_or(0.0, |controller| controller.remaining_interact_time(&self.timers))
    }

    pub fn drain_requests(&mut self, entity: EntityRef) -> Vec<InteractRequest> {
        self.controllers
            .get_mut(&entity)
            .map(Controller::drain_requests)
            .unwrap_or_default()
    }

    // --- Frame step ---

    /// Advance the world by one frame: focus checks first, so a lost target
    /// cancels its timer before the wheel can fire it, then timers, then
    /// progress refreshes.
    pub fn step(&mut self, dt: f32, query: &dyn WorldQuery) {
        self.now += dt;

        for controller in self.controllers.values_mut() {
            controller.tick_focus(self.now, query, &mut self.interactables, &mut self.timers);
        }

        for (timer, entity) in self.timers.advance(dt) {
            if let Some(controller) = self.controllers.get_mut(&entity) {
                controller.on_timer_fired(timer, &mut self.interactables, &mut self.timers);
            }
        }

        self.refresh_progress();
    }

    /// Pushes the current progress to every presentation showing a stale
    /// value.
    fn refresh_progress(&mut self) {
        let clock = SessionView {
            controllers: &self.controllers,
            timers: &self.timers,
        };
        for interactable in self.interactables.values_mut() {
            interactable.refresh_if_stale(&clock);
        }
    }

    /// Lifecycle events emitted since the last drain, in emission order.
    pub fn drain_events(&self) -> Vec<InteractionEvent> {
        self.journal.drain()
    }
}

#[cfg(test)]
mod tests {
    use bevy_math::Vec3;

    use super::*;
    use crate::events::InteractionEventKind;
    use crate::geometry::{Collider, SceneGeometry};
    use crate::presentation::SharedPrompt;

    const P1: EntityRef = EntityRef(1);
    const P2: EntityRef = EntityRef(2);

    fn looking_at_origin(z: f32) -> ViewPoint {
        ViewPoint {
            eye: Vec3::new(0.0, 0.0, z),
            direction: Vec3::NEG_Z,
        }
    }

    fn world_with_prop(config: InteractableConfig) -> (InteractionWorld, SceneGeometry, ObjectHandle, SharedPrompt) {
        let mut world = InteractionWorld::authoritative();
        let mut scene = SceneGeometry::default();
        let prop = world.spawn_object();
        scene.insert(prop, Collider::cube(Vec3::ZERO, 0.5));
        let prompt = SharedPrompt::default();
        assert!(world.attach_interactable(prop, config, Box::new(prompt.clone())));
        (world, scene, prop, prompt)
    }

    #[test]
    fn deactivate_cancels_pending_holds() {
        let (mut world, scene, prop, _) =
            world_with_prop(InteractableConfig::default().with_duration(2.0));
        world.add_controller(P1, None, FocusConfig::default());
        world.add_controller(P2, None, FocusConfig::default());
        world.set_view(P1, looking_at_origin(1.5));
        world.set_view(P2, looking_at_origin(1.0));
        world.step(0.016, &scene);

        assert_eq!(world.begin_interact(P1), SessionOutcome::Pending);
        assert_eq!(world.begin_interact(P2), SessionOutcome::Pending);
        world.drain_events();

        world.deactivate(prop);
        world.step(5.0, &scene);

        let events = world.drain_events();
        assert!(!events.iter().any(|e| e.kind == InteractionEventKind::Interacted));
        for entity in [P1, P2] {
            let ended = |kind: InteractionEventKind| {
                events
                    .iter()
                    .filter(|e| e.kind == kind && e.entity == entity)
                    .count()
            };
            assert_eq!(ended(InteractionEventKind::FocusEnded), 1);
            assert_eq!(ended(InteractionEventKind::InteractEnded), 1);
            assert!(!world.is_interacting(entity));
            assert_eq!(world.controller(entity).unwrap().current_target(), None);
        }
    }

    #[test]
    fn despawned_owner_no_longer_resolves() {
        let (mut world, scene, prop, _) = world_with_prop(InteractableConfig::default());
        world.add_controller(P1, None, FocusConfig::default());
        world.set_view(P1, looking_at_origin(1.0));
        world.step(0.016, &scene);
        assert_eq!(world.controller(P1).unwrap().current_target(), Some(prop));

        assert!(world.despawn_object(prop));
        assert!(world.interactable(prop).is_none());
        assert!(!world.can_interact(prop, P1));
        assert_eq!(world.controller(P1).unwrap().current_target(), None);
        assert!(!world.attach_interactable(prop, InteractableConfig::default(), Box::new(SharedPrompt::default())));
    }

    #[test]
    fn progress_refreshes_while_holding() {
        let (mut world, scene, prop, prompt) =
            world_with_prop(InteractableConfig::default().with_duration(1.0));
        world.add_controller(P1, None, FocusConfig::default());
        world.set_view(P1, looking_at_origin(1.0));
        world.step(0.0, &scene);
        world.begin_interact(P1);

        world.step(0.25, &scene);
        let quarter = prompt.view().progress;
        world.step(0.25, &scene);
        let half = prompt.view().progress;

        assert!((quarter - 0.25).abs() < 1e-4);
        assert!((half - 0.5).abs() < 1e-4);
        assert!((world.interaction_progress(prop) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn released_hold_resets_the_prompt() {
        let (mut world, scene, prop, prompt) =
            world_with_prop(InteractableConfig::default().with_duration(1.0));
        world.add_controller(P1, None, FocusConfig::default());
        world.set_view(P1, looking_at_origin(1.0));
        world.step(0.0, &scene);
        world.begin_interact(P1);
        world.step(0.5, &scene);
        assert!((prompt.view().progress - 0.5).abs() < 1e-4);

        world.end_interact(P1);
        world.step(0.016, &scene);
        world.step(0.016, &scene);

        assert_eq!(prompt.view().progress, world.interaction_progress(prop));
        assert_eq!(prompt.view().progress, 0.0);
    }

    #[test]
    fn instant_interaction_shows_full_progress() {
        let (mut world, scene, prop, prompt) = world_with_prop(InteractableConfig::default());
        world.add_controller(P1, None, FocusConfig::default());
        world.set_view(P1, looking_at_origin(1.0));
        world.step(0.0, &scene);

        assert_eq!(world.begin_interact(P1), SessionOutcome::Fired);
        world.step(0.016, &scene);

        assert_eq!(world.interaction_progress(prop), 1.0);
        assert_eq!(prompt.view().progress, 1.0);
    }

    #[test]
    fn removing_a_controller_releases_the_interactable() {
        let (mut world, scene, prop, prompt) =
            world_with_prop(InteractableConfig::default().single_interactor().with_duration(1.0));
        world.add_controller(P1, None, FocusConfig::default());
        world.set_view(P1, looking_at_origin(1.0));
        world.step(0.0, &scene);
        world.begin_interact(P1);

        assert!(world.remove_controller(P1).is_some());
        assert!(world.interactable(prop).unwrap().interactors().is_empty());
        assert!(world.can_interact(prop, P2));
        assert!(!prompt.view().visible);
    }

    #[test]
    fn proxy_world_queues_requests_for_the_server() {
        let mut world = InteractionWorld::proxy();
        world.add_controller(P1, None, FocusConfig::default());
        world.begin_interact(P1);
        world.end_interact(P1);

        assert_eq!(
            world.drain_requests(P1),
            vec![InteractRequest::Begin, InteractRequest::End]
        );
        assert!(!world.controller(P1).unwrap().is_authoritative());
    }
}
