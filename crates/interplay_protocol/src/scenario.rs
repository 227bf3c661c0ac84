use bevy_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, FocusConfig, InteractableConfig};
use crate::geometry::{Collider, SceneGeometry, ViewPoint};
use crate::handle::ObjectHandle;
use crate::presentation::Presentation;
use crate::world::InteractionWorld;

/// A box-shaped prop carrying an interactable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropSpec {
    pub center: Vec3,
    #[serde(default = "default_half_extent")]
    pub half_extent: f32,
    #[serde(flatten)]
    pub interactable: InteractableConfig,
    /// Seconds after start at which the authority deactivates the prop.
    #[serde(default)]
    pub disable_after: Option<f32>,
}

fn default_half_extent() -> f32 {
    0.5
}

/// Straight-line walk of the scripted viewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerPath {
    pub from: Vec3,
    pub to: Vec3,
    pub direction: Vec3,
    /// Seconds to get from `from` to `to`.
    pub duration: f32,
}

impl ViewerPath {
    pub fn view_at(&self, elapsed: f32) -> ViewPoint {
        let t = if self.duration > 0.0 {
            (elapsed / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        ViewPoint {
            eye: self.from.lerp(self.to, t),
            direction: self.direction.normalize_or(Vec3::NEG_Z),
        }
    }
}

/// Scene description shared by the server and every client. Both sides
/// populate their worlds from the same scenario in the same order, so the
/// object handles agree without an id exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub props: Vec<PropSpec>,
    #[serde(default)]
    pub focus: FocusConfig,
    pub walk: ViewerPath,
}

impl Default for Scenario {
    /// Three props along a corridor, walked past from left to right.
    fn default() -> Self {
        let prop = |x: f32, config: InteractableConfig| PropSpec {
            center: Vec3::new(x, 0.0, 0.0),
            half_extent: default_half_extent(),
            interactable: config,
            disable_after: None,
        };
        Self {
            props: vec![
                prop(-3.0, InteractableConfig::named("Lever", "Pull").with_radius(2.5)),
                prop(0.0, InteractableConfig::named("Chest", "Open").with_duration(1.5)),
                PropSpec {
                    disable_after: Some(16.0),
                    ..prop(
                        3.0,
                        InteractableConfig::named("Terminal", "Use")
                            .with_duration(0.5)
                            .single_interactor(),
                    )
                },
            ],
            focus: FocusConfig::default(),
            walk: ViewerPath {
                from: Vec3::new(-5.0, 0.0, 2.0),
                to: Vec3::new(5.0, 0.0, 2.0),
                direction: Vec3::NEG_Z,
                duration: 20.0,
            },
        }
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.focus.validate()?;
        for prop in &self.props {
            prop.interactable.validate()?;
            if !(prop.half_extent.is_finite() && prop.half_extent > 0.0) {
                return Err(ConfigError::NotPositive {
                    field: "half_extent",
                    value: prop.half_extent,
                });
            }
            if let Some(after) = prop.disable_after {
                if !(after.is_finite() && after >= 0.0) {
                    return Err(ConfigError::InvalidNumber {
                        field: "disable_after",
                        value: after,
                    });
                }
            }
        }
        if !(self.walk.duration.is_finite() && self.walk.duration >= 0.0) {
            return Err(ConfigError::InvalidNumber {
                field: "walk.duration",
                value: self.walk.duration,
            });
        }
        Ok(())
    }

    /// Spawn every prop into `world` and `geometry`. Returns the handles in
    /// prop order.
    pub fn populate(
        &self,
        world: &mut InteractionWorld,
        geometry: &mut SceneGeometry,
        mut presentation: impl FnMut(&PropSpec) -> Box<dyn Presentation>,
    ) -> Vec<ObjectHandle> {
        self.props
            .iter()
            .map(|prop| {
                let object = world.spawn_object();
                geometry.insert(object, Collider::cube(prop.center, prop.half_extent));
                world.attach_interactable(object, prop.interactable.clone(), presentation(prop));
                object
            })
            .collect()
    }
}
