use bevy_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::handle::ObjectHandle;

/// Default maximum length of a focus ray.
pub const DEFAULT_CHECK_DISTANCE: f32 = 10.0;

/// Where a viewer is looking from and towards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPoint {
    pub eye: Vec3,
    pub direction: Vec3,
}

impl Default for ViewPoint {
    fn default() -> Self {
        Self {
            eye: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub object: ObjectHandle,
    pub impact_point: Vec3,
}

/// World geometry as seen by the focus tracker.
pub trait WorldQuery {
    /// Returns the first object along the ray within `max_distance`,
    /// skipping `ignore` (usually the viewer's own body).
    fn raycast_nearest(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        ignore: Option<ObjectHandle>,
    ) -> Option<RayHit>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Collider {
    Sphere { center: Vec3, radius: f32 },
    Aabb { min: Vec3, max: Vec3 },
}

impl Collider {
    pub fn cube(center: Vec3, half_extent: f32) -> Self {
        Collider::Aabb {
            min: center - Vec3::splat(half_extent),
            max: center + Vec3::splat(half_extent),
        }
    }

    /// Distance along a normalized ray to the first surface crossing.
    /// A ray starting inside the collider reports its exit point.
    pub fn ray_distance(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        match *self {
            Collider::Sphere { center, radius } => ray_sphere(origin, dir, center, radius),
            Collider::Aabb { min, max } => ray_aabb(origin, dir, min, max),
        }
    }

    pub fn translate(&mut self, offset: Vec3) {
        match self {
            Collider::Sphere { center, .. } => *center += offset,
            Collider::Aabb { min, max } => {
                *min += offset;
                *max += offset;
            }
        }
    }
}

fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }

    let root = disc.sqrt();
    let near = -b - root;
    if near >= 0.0 {
        return Some(near);
    }
    let far = -b + root;
    (far >= 0.0).then_some(far)
}

fn ray_aabb(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d == 0.0 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }

    if t_min >= 0.0 {
        Some(t_min)
    } else if t_max >= 0.0 {
        Some(t_max)
    } else {
        None
    }
}

/// Flat list of colliders, good enough for scenes with a handful of props.
#[derive(Default, Clone)]
pub struct SceneGeometry {
    colliders: Vec<(ObjectHandle, Collider)>,
}

impl SceneGeometry {
    pub fn insert(&mut self, object: ObjectHandle, collider: Collider) {
        self.remove(object);
        self.colliders.push((object, collider));
    }

    pub fn remove(&mut self, object: ObjectHandle) {
        self.colliders.retain(|(handle, _)| *handle != object);
    }

    pub fn get(&self, object: ObjectHandle) -> Option<&Collider> {
        self.colliders
            .iter()
            .find(|(handle, _)| *handle == object)
            .map(|(_, collider)| collider)
    }

    pub fn get_mut(&mut self, object: ObjectHandle) -> Option<&mut Collider> {
        self.colliders
            .iter_mut()
            .find(|(handle, _)| *handle == object)
            .map(|(_, collider)| collider)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

impl WorldQuery for SceneGeometry {
    fn raycast_nearest(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        ignore: Option<ObjectHandle>,
    ) -> Option<RayHit> {
        let dir = direction.try_normalize()?;

        self.colliders
            .iter()
            .filter(|(handle, _)| Some(*handle) != ignore)
            .filter_map(|(handle, collider)| {
                collider
                    .ray_distance(origin, dir)
                    .filter(|t| *t <= max_distance)
                    .map(|t| (*handle, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(object, t)| RayHit {
                object,
                impact_point: origin + dir * t,
            })
    }
}
