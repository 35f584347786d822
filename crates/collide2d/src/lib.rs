//! # collide2d
//!
//! A 2D collision subsystem for fixed-tick game simulations.
//!
//! ## Features
//!
//! - **Quadtree Broad Phase**: Dynamic spatial partitioning over a
//!   fixed world rectangle, with straddling bodies registered in every
//!   leaf they touch
//! - **Channel Filtering**: Up to 32 named collision channels with
//!   per-collider ignore/overlap/block response tables
//! - **Block Resolution**: Axis-aligned push-out along the shorter
//!   overlap axis with velocity projection
//! - **Overlap Lifecycle**: Begin, per-tick update and exit events for
//!   tracked overlapping pairs, dispatched synchronously to per-shape
//!   subscribers
//! - **Data-Driven Shapes**: Collider construction from TOML records
//!   through an extensible shape type registry
//!
//! ## Quick Start
//!
//! ```rust
//! use collide2d::prelude::*;
//!
//! let mut world = CollisionWorld::new(CollisionConfig::default());
//!
//! let wall = world.create_body(Vec2::zeros(), true);
//! world.add_shape(
//!     wall,
//!     Shape::new(
//!         "wall",
//!         Box::new(BoxShape::new(Vec2::zeros(), 10.0, 10.0)),
//!         CollisionProfile::default(),
//!     ),
//! );
//!
//! let player = world.create_body(Vec2::new(20.0, 0.0), false);
//! let hull = world
//!     .add_shape(
//!         player,
//!         Shape::new(
//!             "hull",
//!             Box::new(BoxShape::new(Vec2::zeros(), 10.0, 10.0)),
//!             CollisionProfile::default(),
//!         ),
//!     )
//!     .unwrap();
//!
//! world.on_contact(hull, ContactKind::Hit, |_, event| {
//!     println!("bumped into {:?}", event.other_body);
//! });
//!
//! // Once per fixed tick, after gameplay has applied positions
//! world.set_body_position(player, Vec2::new(5.0, 0.0));
//! world.run_collisions();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod events;
pub mod foundation;
pub mod physics;
pub mod spatial;

pub use config::{CollisionConfig, ConfigError};
pub use physics::CollisionError;

/// Common imports for collision users
pub mod prelude {
    pub use crate::{
        config::CollisionConfig,
        events::{ContactEvent, ContactKind},
        foundation::math::{Rect, Vec2},
        physics::{
            Body, BodyKey, BoxShape, Channel, ChannelRegistry, CollisionError, CollisionProfile,
            CollisionWorld, Response, Shape, ShapeKey, ShapeSpec, ShapeTypeRegistry,
        },
        spatial::{Quadtree, QuadtreeConfig},
    };
}
