use std::collections::HashMap;

use tracing::{debug, trace};

use crate::authority::AuthorityRole;
use crate::config::FocusConfig;
use crate::geometry::{ViewPoint, WorldQuery};
use crate::handle::{EntityRef, InteractableRef, ObjectHandle};
use crate::interactable::Interactable;
use crate::session::InteractionSession;
use crate::timer::TimerWheel;

pub type Interactables = HashMap<ObjectHandle, Interactable>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusState {
    pub current_target: Option<InteractableRef>,
    pub last_check_timestamp: f32,
    pub interact_held: bool,
}

impl Default for FocusState {
    fn default() -> Self {
        Self {
            current_target: None,
            // First frame always checks.
            last_check_timestamp: f32::NEG_INFINITY,
            interact_held: false,
        }
    }
}

/// What a focus check decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    Unchanged,
    Changed { from: Option<InteractableRef>, to: InteractableRef },
    Lost(InteractableRef),
}

/// Per-entity interaction driver: focus tracking plus the hold session.
pub struct Controller {
    pub(crate) entity: EntityRef,
    pub(crate) body: Option<ObjectHandle>,
    pub(crate) config: FocusConfig,
    pub(crate) view: ViewPoint,
    pub(crate) focus: FocusState,
    pub(crate) session: Option<InteractionSession>,
    pub(crate) role: Box<dyn AuthorityRole>,
}

impl Controller {
    pub fn new(
        entity: EntityRef,
        body: Option<ObjectHandle>,
        config: FocusConfig,
        role: Box<dyn AuthorityRole>,
    ) -> Self {
        Self {
            entity,
            body,
            config,
            view: ViewPoint::default(),
            focus: FocusState::default(),
            session: None,
            role,
        }
    }

    pub fn entity(&self) -> EntityRef {
        self.entity
    }

    pub fn body(&self) -> Option<ObjectHandle> {
        self.body
    }

    pub fn focus(&self) -> &FocusState {
        &self.focus
    }

    pub fn current_target(&self) -> Option<InteractableRef> {
        self.focus.current_target
    }

    pub fn view(&self) -> ViewPoint {
        self.view
    }

    pub fn set_view(&mut self, view: ViewPoint) {
        self.view = view;
    }

    pub fn config(&self) -> &FocusConfig {
        &self.config
    }

    pub fn is_authoritative(&self) -> bool {
        self.role.is_authoritative()
    }

    /// Per-frame entry point; only raycasts once the check interval elapsed.
    pub fn tick_focus(
        &mut self,
        now: f32,
        query: &dyn WorldQuery,
        interactables: &mut Interactables,
        timers: &mut TimerWheel<EntityRef>,
    ) -> Option<FocusChange> {
        if now - self.focus.last_check_timestamp > self.config.check_interval {
            Some(self.perform_check(now, query, interactables, timers))
        } else {
            None
        }
    }

    pub fn perform_check(
        &mut self,
        now: f32,
        query: &dyn WorldQuery,
        interactables: &mut Interactables,
        timers: &mut TimerWheel<EntityRef>,
    ) -> FocusChange {
        self.focus.last_check_timestamp = now;

        let hit = query.raycast_nearest(
            self.view.eye,
            self.view.direction,
            self.config.check_distance,
            self.body,
        );
        trace!(entity = ?self.entity, ?hit, "focus check");

        let candidate = hit.and_then(|hit| {
            let interactable = interactables.get(&hit.object)?;
            interactable.is_active().then(|| {
                (
                    hit.object,
                    self.view.eye.distance(hit.impact_point),
                    interactable.interaction_radius(),
                )
            })
        });

        let current = self.focus.current_target;
        match candidate {
            Some((object, distance, radius)) => {
                if current != Some(object) && distance <= radius {
                    self.found_new_interactable(object, interactables, timers);
                    FocusChange::Changed {
                        from: current,
                        to: object,
                    }
                } else if distance > radius && current.is_some() {
                    self.lost_interactable(interactables, timers)
                } else {
                    FocusChange::Unchanged
                }
            }
            None if current.is_some() => self.lost_interactable(interactables, timers),
            None => FocusChange::Unchanged,
        }
    }

    fn found_new_interactable(
        &mut self,
        object: InteractableRef,
        interactables: &mut Interactables,
        timers: &mut TimerWheel<EntityRef>,
    ) {
        debug!(entity = ?self.entity, target = ?object, "focus target changed");

        if self.focus.interact_held || self.session.is_some() {
            self.end_interact(interactables, timers);
        }
        if let Some(old) = self.focus.current_target {
            if let Some(previous) = interactables.get_mut(&old) {
                previous.end_focus(self.entity);
            }
        }
        if let Some(next) = interactables.get_mut(&object) {
            next.begin_focus(self.entity);
        }
        self.focus.current_target = Some(object);
    }

    fn lost_interactable(
        &mut self,
        interactables: &mut Interactables,
        timers: &mut TimerWheel<EntityRef>,
    ) -> FocusChange {
        self.cancel_session(timers);

        let Some(old) = self.focus.current_target else {
            return FocusChange::Unchanged;
        };
        debug!(entity = ?self.entity, target = ?old, "focus target lost");

        if let Some(previous) = interactables.get_mut(&old) {
            previous.end_focus(self.entity);
        }
        if self.focus.interact_held {
            self.end_interact(interactables, timers);
        }
        self.focus.current_target = None;
        FocusChange::Lost(old)
    }

    /// Drop all focus state without notifying the target. Used when the
    /// target has already ended this entity's focus itself.
    pub(crate) fn forget_target(&mut self, timers: &mut TimerWheel<EntityRef>) {
        self.cancel_session(timers);
        self.focus.current_target = None;
        self.focus.interact_held = false;
    }
}
