use std::sync::Arc;

use tracing::debug;

use crate::authority::NetRole;
use crate::config::InteractableConfig;
use crate::events::{InteractionEvent, InteractionEventKind, InteractionListener, dispatch};
use crate::handle::{EntityRef, ObjectHandle};
use crate::presentation::Presentation;

/// Durations at or below this are treated as instantaneous.
pub const DURATION_EPSILON: f32 = 1.0e-8;

pub fn is_instant(duration: f32) -> bool {
    duration.abs() <= DURATION_EPSILON
}

/// Looks up how long an interactor's hold timer still has to run.
pub trait SessionClock {
    /// `None` when the entity has no running session.
    fn remaining_time(&self, entity: EntityRef) -> Option<f32>;
}

/// Clock for contexts where no session can be running.
pub struct NoSessions;

impl SessionClock for NoSessions {
    fn remaining_time(&self, _entity: EntityRef) -> Option<f32> {
        None
    }
}

/// Capability of a world object to be focused and interacted with.
///
/// The owner is referenced by handle only; `InteractionWorld` hands out an
/// interactable only while that owner is alive.
pub struct Interactable {
    owner: ObjectHandle,
    net_role: NetRole,
    active: bool,
    config: InteractableConfig,
    interactors: Vec<EntityRef>,
    /// Bumped whenever a replicated field changes.
    rep_key: u32,
    /// Progress last handed to the presentation.
    shown_progress: f32,
    presentation: Box<dyn Presentation>,
    listeners: Vec<Arc<dyn InteractionListener>>,
}

impl Interactable {
    pub fn new(
        owner: ObjectHandle,
        net_role: NetRole,
        config: InteractableConfig,
        mut presentation: Box<dyn Presentation>,
    ) -> Self {
        presentation.set_visible(false);
        presentation.refresh(&config.display_name, &config.action_text, 0.0);
        Self {
            owner,
            net_role,
            active: true,
            config,
            interactors: Vec::new(),
            rep_key: 0,
            shown_progress: 0.0,
            presentation,
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, listener: Arc<dyn InteractionListener>) {
        self.listeners.push(listener);
    }

    pub fn owner(&self) -> ObjectHandle {
        self.owner
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &InteractableConfig {
        &self.config
    }

    pub fn display_name(&self) -> &str {
        &self.config.display_name
    }

    pub fn action_text(&self) -> &str {
        &self.config.action_text
    }

    pub fn interaction_duration(&self) -> f32 {
        self.config.interaction_duration
    }

    pub fn interaction_radius(&self) -> f32 {
        self.config.interaction_radius
    }

    pub fn rep_key(&self) -> u32 {
        self.rep_key
    }

    /// Entities mid-interaction, in the order they began.
    pub fn interactors(&self) -> &[EntityRef] {
        &self.interactors
    }

    pub fn can_interact(&self, entity: EntityRef) -> bool {
        self.active
            && (self.config.allow_multiple_interactors
                || self.interactors.is_empty()
                || self.interactors.contains(&entity))
    }

    pub fn begin_focus(&mut self, entity: EntityRef) {
        if !self.active {
            return;
        }

        debug!(owner = ?self.owner, ?entity, "focus begun");
        self.broadcast(InteractionEventKind::FocusBegun, entity);
        self.presentation.set_visible(true);
        if self.net_role.shows_highlight() {
            self.presentation.set_highlighted(true);
        }
    }

    pub fn end_focus(&mut self, entity: EntityRef) {
        debug!(owner = ?self.owner, ?entity, "focus ended");
        self.broadcast(InteractionEventKind::FocusEnded, entity);
        self.presentation.set_visible(false);
        if self.net_role.shows_highlight() {
            self.presentation.set_highlighted(false);
        }
    }

    pub fn begin_interact(&mut self, entity: EntityRef) {
        if !self.can_interact(entity) {
            return;
        }

        if !self.interactors.contains(&entity) {
            self.interactors.push(entity);
        }
        debug!(owner = ?self.owner, ?entity, "interact begun");
        self.broadcast(InteractionEventKind::InteractBegun, entity);
    }

    pub fn end_interact(&mut self, entity: EntityRef) {
        if let Some(index) = self.interactors.iter().position(|e| *e == entity) {
            self.interactors.remove(index);
        }
        debug!(owner = ?self.owner, ?entity, "interact ended");
        self.broadcast(InteractionEventKind::InteractEnded, entity);
    }

    /// Fires the terminal event. Membership is left untouched.
    pub fn interact(&mut self, entity: EntityRef) {
        if !self.can_interact(entity) {
            return;
        }

        debug!(owner = ?self.owner, ?entity, "interacted");
        self.broadcast(InteractionEventKind::Interacted, entity);
    }

    pub fn deactivate(&mut self) {
        if self.active {
            self.mark_dirty();
        }
        self.active = false;

        let interactors = self.interactors.clone();
        for entity in interactors.into_iter().rev() {
            self.end_focus(entity);
            self.end_interact(entity);
        }
        self.interactors.clear();
    }

    pub fn activate(&mut self) {
        if !self.active {
            self.active = true;
            self.mark_dirty();
        }
    }

    /// Hold progress of the first interactor, in `[0, 1]`.
    pub fn interaction_progress(&self, clock: &dyn SessionClock) -> f32 {
        let Some(first) = self.interactors.first() else {
            return 0.0;
        };
        let duration = self.config.interaction_duration;
        if is_instant(duration) {
            return 1.0;
        }
        let Some(remaining) = clock.remaining_time(*first) else {
            return 0.0;
        };
        (1.0 - (remaining / duration).abs()).clamp(0.0, 1.0)
    }

    pub fn set_display_name(&mut self, text: impl Into<String>, clock: &dyn SessionClock) {
        self.config.display_name = text.into();
        self.mark_dirty();
        self.refresh(clock);
    }

    pub fn set_action_text(&mut self, text: impl Into<String>, clock: &dyn SessionClock) {
        self.config.action_text = text.into();
        self.mark_dirty();
        self.refresh(clock);
    }

    pub fn refresh(&mut self, clock: &dyn SessionClock) {
        let progress = self.interaction_progress(clock);
        self.shown_progress = progress;
        self.presentation.refresh(
            &self.config.display_name,
            &self.config.action_text,
            progress,
        );
    }

    /// Refresh only when the progress differs from what the presentation
    /// last showed. Returns whether a refresh happened.
    pub fn refresh_if_stale(&mut self, clock: &dyn SessionClock) -> bool {
        if self.interaction_progress(clock) == self.shown_progress {
            return false;
        }
        self.refresh(clock);
        true
    }

    fn mark_dirty(&mut self) {
        self.rep_key = self.rep_key.wrapping_add(1);
    }

    fn broadcast(&self, kind: InteractionEventKind, entity: EntityRef) {
        let event = InteractionEvent {
            kind,
            interactable: self.owner,
            entity,
        };
        for listener in &self.listeners {
            dispatch(listener.as_ref(), &event);
        }
    }
}
