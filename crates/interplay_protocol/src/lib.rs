pub mod authority;
pub mod config;
pub mod events;
pub mod focus;
pub mod geometry;
pub mod handle;
pub mod interactable;
pub mod presentation;
pub mod protocol;
pub mod replication;
pub mod scenario;
pub mod session;
pub mod timer;
pub mod transport;
pub mod world;

pub use bevy_math::Vec3;
