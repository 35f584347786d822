//! Collision bodies
//!
//! A body aggregates one or more named shapes under one owning entity
//! and caches the union bounding rectangle of its enabled shapes. The
//! transform/physics collaborator writes position and velocity each
//! tick before the collision world runs.

use crate::foundation::math::{Rect, Vec2};
use crate::physics::shape::Shape;
use crate::physics::ShapeKey;
use slotmap::SlotMap;
use std::collections::HashMap;

/// One collidable entity: named shapes plus movement state
#[derive(Debug)]
pub struct Body {
    pub(crate) shapes: HashMap<String, ShapeKey>,
    pub(crate) bounding: Rect,
    pub(crate) is_static: bool,
    pub(crate) collision_enabled: bool,
    pub(crate) queued_destroy: bool,
    pub(crate) position: Vec2,
    pub(crate) last_position: Vec2,
    pub(crate) velocity: Vec2,
}

impl Body {
    pub(crate) fn new(position: Vec2, is_static: bool) -> Self {
        Self {
            shapes: HashMap::new(),
            bounding: Rect::zero(),
            is_static,
            collision_enabled: true,
            queued_destroy: false,
            position,
            last_position: position,
            velocity: Vec2::zeros(),
        }
    }

    /// Current world position
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Position at the previous tick
    pub fn last_position(&self) -> Vec2 {
        self.last_position
    }

    /// Current velocity
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Whether the body is excluded from the active per-tick sweep
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Whether the body participates in collision at all
    pub fn collision_enabled(&self) -> bool {
        self.collision_enabled
    }

    /// Whether the owning entity is queued for destruction
    pub fn is_queued_for_destroy(&self) -> bool {
        self.queued_destroy
    }

    /// Cached union bounding rectangle, relative to the body position
    ///
    /// A body with zero enabled shapes reports the degenerate zero rect,
    /// not "no collision"; broad-phase rejection relies on this.
    pub fn bounding_rect(&self) -> Rect {
        self.bounding
    }

    /// Bounding rectangle translated to world space
    pub fn world_rect(&self) -> Rect {
        self.bounding.translated(self.position)
    }

    /// Look up a shape handle by the name it was added under
    pub fn shape(&self, name: &str) -> Option<ShapeKey> {
        self.shapes.get(name).copied()
    }

    /// Handles of every shape on this body
    pub fn shape_keys(&self) -> impl Iterator<Item = ShapeKey> + '_ {
        self.shapes.values().copied()
    }

    /// Number of shapes on this body
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Recompute the cached union of all enabled shapes' relative rects
    ///
    /// Zero enabled shapes collapse to the zero rect; a single enabled
    /// shape is copied exactly; two or more are unioned starting from
    /// the zero rect, growing edges outward only.
    pub(crate) fn recompute_bounding(&mut self, shapes: &SlotMap<ShapeKey, Shape>) {
        let enabled: Vec<Rect> = self
            .shapes
            .values()
            .filter_map(|&key| shapes.get(key))
            .filter(|shape| shape.is_enabled())
            .map(Shape::rect_relative)
            .collect();

        self.bounding = match enabled.as_slice() {
            [] => Rect::zero(),
            [only] => *only,
            many => {
                let mut union = Rect::zero();
                for rect in many {
                    union.encapsulate(rect);
                }
                union
            }
        };
    }

    pub(crate) fn has_enabled_shape(&self, shapes: &SlotMap<ShapeKey, Shape>) -> bool {
        self.shapes
            .values()
            .any(|&key| shapes.get(key).is_some_and(Shape::is_enabled))
    }
}
