use tracing::debug;

use crate::authority::InteractRequest;
use crate::focus::{Controller, Interactables};
use crate::handle::{EntityRef, InteractableRef};
use crate::interactable::is_instant;
use crate::timer::{TimerHandle, TimerService, TimerWheel};

/// A pending hold-to-interact timer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSession {
    pub target: InteractableRef,
    pub timer: TimerHandle,
    pub total: f32,
}

impl InteractionSession {
    pub fn remaining(&self, timers: &impl TimerService<EntityRef>) -> f32 {
        timers.remaining_time(self.timer)
    }
}

/// Result of pressing the interact key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Already held, no target, or the target refused.
    Ignored,
    /// Zero-duration interaction fired synchronously.
    Fired,
    /// Hold timer armed.
    Pending,
}

impl Controller {
    pub fn session(&self) -> Option<&InteractionSession> {
        self.session.as_ref()
    }

    pub fn is_interacting(&self, timers: &TimerWheel<EntityRef>) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| timers.is_active(session.timer))
    }

    pub fn remaining_interact_time(&self, timers: &TimerWheel<EntityRef>) -> f32 {
        self.session
            .as_ref()
            .map_or(0.0, |session| session.remaining(timers))
    }

    /// Requests queued for the authoritative side since the last drain.
    pub fn drain_requests(&mut self) -> Vec<InteractRequest> {
        self.role.drain_requests()
    }

    pub fn begin_interact(
        &mut self,
        interactables: &mut Interactables,
        timers: &mut TimerWheel<EntityRef>,
    ) -> SessionOutcome {
        if self.focus.interact_held {
            return SessionOutcome::Ignored;
        }

        self.role.request(InteractRequest::Begin);
        self.focus.interact_held = true;

        let Some(target) = self.focus.current_target else {
            return SessionOutcome::Ignored;
        };
        let Some(interactable) = interactables.get_mut(&target) else {
            return SessionOutcome::Ignored;
        };
        if !interactable.can_interact(self.entity) {
            return SessionOutcome::Ignored;
        }

        interactable.begin_interact(self.entity);
        let duration = interactable.interaction_duration();
        if is_instant(duration) {
            self.interact(interactables, timers);
            return SessionOutcome::Fired;
        }

        self.cancel_session(timers);
        let timer = timers.schedule_once(duration, self.entity);
        debug!(entity = ?self.entity, ?target, duration, "hold timer armed");
        self.session = Some(InteractionSession {
            target,
            timer,
            total: duration,
        });
        SessionOutcome::Pending
    }

    pub fn end_interact(
        &mut self,
        interactables: &mut Interactables,
        timers: &mut TimerWheel<EntityRef>,
    ) {
        if !self.focus.interact_held && self.session.is_none() {
            return;
        }

        self.role.request(InteractRequest::End);
        self.focus.interact_held = false;
        self.cancel_session(timers);

        if let Some(target) = self.focus.current_target {
            if let Some(interactable) = interactables.get_mut(&target) {
                interactable.end_interact(self.entity);
            }
        }
    }

    /// Completion of the hold timer (or an instant interaction).
    pub fn interact(
        &mut self,
        interactables: &mut Interactables,
        timers: &mut TimerWheel<EntityRef>,
    ) {
        self.cancel_session(timers);

        if let Some(target) = self.focus.current_target {
            if let Some(interactable) = interactables.get_mut(&target) {
                interactable.interact(self.entity);
            }
        }
    }

    /// Called by the owner of the timer wheel when `timer` expired.
    pub fn on_timer_fired(
        &mut self,
        timer: TimerHandle,
        interactables: &mut Interactables,
        timers: &mut TimerWheel<EntityRef>,
    ) -> bool {
        if self.session.map(|session| session.timer) != Some(timer) {
            return false;
        }
        self.interact(interactables, timers);
        true
    }

    pub(crate) fn cancel_session(&mut self, timers: &mut TimerWheel<EntityRef>) {
        if let Some(session) = self.session.take() {
            timers.cancel(session.timer);
            debug!(entity = ?self.entity, target = ?session.target, "hold timer cancelled");
        }
    }
}
