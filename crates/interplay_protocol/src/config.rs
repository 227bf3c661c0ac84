use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::DEFAULT_CHECK_DISTANCE;

pub const DEFAULT_INTERACTION_RADIUS: f32 = 2.0;
pub const DEFAULT_DISPLAY_NAME: &str = "Interactable Object";
pub const DEFAULT_ACTION_TEXT: &str = "Interact";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidNumber { field: &'static str, value: f32 },
    #[error("{field} must be a positive number (got {value})")]
    NotPositive { field: &'static str, value: f32 },
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidNumber { field, value })
    }
}

/// Tunables of a single interactable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractableConfig {
    pub display_name: String,
    pub action_text: String,
    /// Seconds the interact key must be held; `0` fires immediately.
    pub interaction_duration: f32,
    pub interaction_radius: f32,
    pub allow_multiple_interactors: bool,
}

impl Default for InteractableConfig {
    fn default() -> Self {
        Self {
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            action_text: DEFAULT_ACTION_TEXT.to_string(),
            interaction_duration: 0.0,
            interaction_radius: DEFAULT_INTERACTION_RADIUS,
            allow_multiple_interactors: true,
        }
    }
}

impl InteractableConfig {
    pub fn named(display_name: impl Into<String>, action_text: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            action_text: action_text.into(),
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.interaction_duration = seconds;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.interaction_radius = radius;
        self
    }

    pub fn single_interactor(mut self) -> Self {
        self.allow_multiple_interactors = false;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("interaction_duration", self.interaction_duration)?;
        non_negative("interaction_radius", self.interaction_radius)
    }
}

/// Tunables of a viewer's focus tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Seconds between raycasts; `0` checks every frame.
    pub check_interval: f32,
    pub check_distance: f32,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            check_interval: 0.0,
            check_distance: DEFAULT_CHECK_DISTANCE,
        }
    }
}

impl FocusConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("check_interval", self.check_interval)?;
        if !(self.check_distance.is_finite() && self.check_distance > 0.0) {
            return Err(ConfigError::NotPositive {
                field: "check_distance",
                value: self.check_distance,
            });
        }
        Ok(())
    }
}
