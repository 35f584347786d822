//! Collision detection and response
//!
//! Provides channel-based collision filtering, axis-aligned collider
//! shapes aggregated into bodies, and the per-tick collision pipeline
//! (broad-phase via the quadtree in [`crate::spatial`], narrow-phase
//! AABB tests, block resolution and overlap lifecycle events).

pub mod body;
pub mod channels;
pub mod collision_world;
pub mod response;
pub mod shape;
pub mod shape_registry;

use slotmap::new_key_type;

new_key_type! {
    /// Stable handle to a collision body
    pub struct BodyKey;

    /// Stable handle to a collider shape
    pub struct ShapeKey;
}

/// Errors produced while configuring collision data
#[derive(thiserror::Error, Debug)]
pub enum CollisionError {
    /// All 32 collision channels are already assigned
    #[error("channel limit of 32 exceeded while registering '{name}'")]
    ChannelLimitExceeded {
        /// The channel name that could not be assigned
        name: String,
    },

    /// The shape type name has no registered constructor
    #[error("unknown shape type: {name}")]
    UnknownShapeType {
        /// The unrecognized type name
        name: String,
    },

    /// The shape attribute record failed validation
    #[error("invalid shape data: {reason}")]
    InvalidShapeData {
        /// Why the record was rejected
        reason: String,
    },
}

pub use body::Body;
pub use channels::{Channel, ChannelRegistry, DEFAULT_CHANNEL_NAME, MAX_CHANNELS};
pub use collision_world::CollisionWorld;
pub use response::{CollisionProfile, Response, ResponseKind};
pub use shape::{BoxShape, Shape, ShapeGeometry};
pub use shape_registry::{ShapeSpec, ShapeTypeRegistry};
