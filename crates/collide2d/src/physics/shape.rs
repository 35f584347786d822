//! Collider shapes
//!
//! Shapes store their geometry relative to the owning body and are
//! translated to world space on demand during collision tests. Geometry
//! is polymorphic behind [`ShapeGeometry`] so new shape types can plug
//! in through the type registry without the body or the collision world
//! knowing concrete types.

use crate::foundation::math::{Rect, Vec2};
use crate::physics::response::{CollisionProfile, Response};
use crate::physics::{BodyKey, ShapeKey};
use std::collections::HashSet;
use std::fmt;

/// Geometry capability a collider variant must expose
pub trait ShapeGeometry: fmt::Debug {
    /// Bounding rectangle relative to the owning body's position
    fn rect_relative(&self) -> Rect;
}

/// Axis-aligned box collider, the one built-in geometry variant
#[derive(Debug, Clone)]
pub struct BoxShape {
    /// Offset of the box's min corner from the owning body's position
    pub position: Vec2,
    /// Box width
    pub width: f32,
    /// Box height
    pub height: f32,
}

impl BoxShape {
    /// Create a box collider from its relative position and dimensions
    pub fn new(position: Vec2, width: f32, height: f32) -> Self {
        Self {
            position,
            width,
            height,
        }
    }
}

impl ShapeGeometry for BoxShape {
    fn rect_relative(&self) -> Rect {
        Rect::from_position_size(self.position, self.width, self.height)
    }
}

/// A collider: geometry plus channel profile, enable state and the set
/// of shapes it currently overlaps
#[derive(Debug)]
pub struct Shape {
    name: String,
    geometry: Box<dyn ShapeGeometry>,
    enabled: bool,
    profile: CollisionProfile,
    pub(crate) overlapping: HashSet<ShapeKey>,
    owner: BodyKey,
}

impl Shape {
    /// Create an enabled shape; ownership is established when the shape
    /// is added to a body
    pub fn new(
        name: impl Into<String>,
        geometry: Box<dyn ShapeGeometry>,
        profile: CollisionProfile,
    ) -> Self {
        Self {
            name: name.into(),
            geometry,
            enabled: true,
            profile,
            overlapping: HashSet::new(),
            owner: BodyKey::default(),
        }
    }

    /// Name this shape is registered under on its body
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bounding rectangle relative to the owning body
    pub fn rect_relative(&self) -> Rect {
        self.geometry.rect_relative()
    }

    /// Bounding rectangle translated by the owning body's position
    pub fn rect_world(&self, owner_position: Vec2) -> Rect {
        self.geometry.rect_relative().translated(owner_position)
    }

    /// Whether this shape participates in collision
    ///
    /// Toggled through
    /// [`CollisionWorld::set_shape_enabled`](crate::physics::CollisionWorld::set_shape_enabled)
    /// so that active overlaps are wound down first.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The collider's channel membership and response table
    pub fn profile(&self) -> &CollisionProfile {
        &self.profile
    }

    /// Mutable access to the channel profile
    pub fn profile_mut(&mut self) -> &mut CollisionProfile {
        &mut self.profile
    }

    /// This shape's declared response toward another shape's channel
    pub fn response_to_shape(&self, other: &Shape) -> Response {
        self.profile.response_to(other.profile.channel())
    }

    /// The body this shape belongs to
    pub fn owner(&self) -> BodyKey {
        self.owner
    }

    /// Shapes this one currently overlaps
    pub fn overlapping(&self) -> &HashSet<ShapeKey> {
        &self.overlapping
    }

    pub(crate) fn set_owner(&mut self, owner: BodyKey) {
        self.owner = owner;
    }

    pub(crate) fn set_enabled_flag(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
