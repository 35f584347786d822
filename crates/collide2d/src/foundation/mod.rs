//! Foundation utilities shared by every subsystem
//!
//! Provides fundamental math types for 2D collision detection.

pub mod math;

pub use math::{Rect, Vec2};
