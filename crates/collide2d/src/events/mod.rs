//! Contact event multicast
//!
//! Every shape exposes four outbound event channels: hit, begin
//! overlap, overlap update and exit overlap. External game-logic
//! components subscribe callbacks per shape and per channel; dispatch
//! is synchronous and happens from inside the collision pipeline, so
//! handlers receive mutable access to the world and may toggle
//! collision state mid-tick.

use crate::physics::collision_world::CollisionWorld;
use crate::physics::{BodyKey, ShapeKey};
use std::collections::HashMap;

/// Which contact channel an event was delivered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKind {
    /// A blocking collision was resolved against another shape
    Hit,
    /// Two shapes started overlapping this tick
    BeginOverlap,
    /// An existing overlap persisted through this tick
    OverlapUpdate,
    /// Two shapes stopped overlapping this tick
    ExitOverlap,
}

/// Payload delivered to contact handlers
#[derive(Debug, Clone, Copy)]
pub struct ContactEvent {
    /// The shape the handler is subscribed on
    pub shape: ShapeKey,
    /// The shape on the other side of the contact
    pub other_shape: ShapeKey,
    /// The body owning the other shape
    pub other_body: BodyKey,
}

/// Boxed contact callback
pub type ContactHandler = Box<dyn FnMut(&mut CollisionWorld, &ContactEvent)>;

/// Per-shape multicast handler lists
///
/// Handlers are keyed by (shape, channel). During dispatch the list is
/// taken out of the map, invoked, and reinstalled so a handler may
/// re-enter the world; handlers subscribed during dispatch are kept.
#[derive(Default)]
pub struct ContactDispatcher {
    handlers: HashMap<(ShapeKey, ContactKind), Vec<ContactHandler>>,
}

impl ContactDispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a callback to one contact channel of one shape
    pub fn subscribe<F>(&mut self, shape: ShapeKey, kind: ContactKind, handler: F)
    where
        F: FnMut(&mut CollisionWorld, &ContactEvent) + 'static,
    {
        self.handlers
            .entry((shape, kind))
            .or_default()
            .push(Box::new(handler));
    }

    /// Number of handlers on one contact channel of one shape
    pub fn handler_count(&self, shape: ShapeKey, kind: ContactKind) -> usize {
        self.handlers.get(&(shape, kind)).map_or(0, Vec::len)
    }

    /// Drop every handler subscribed on a shape
    pub fn clear_shape(&mut self, shape: ShapeKey) {
        self.handlers.retain(|&(s, _), _| s != shape);
    }

    pub(crate) fn take(&mut self, shape: ShapeKey, kind: ContactKind) -> Option<Vec<ContactHandler>> {
        self.handlers.remove(&(shape, kind))
    }

    pub(crate) fn reinstall(
        &mut self,
        shape: ShapeKey,
        kind: ContactKind,
        mut list: Vec<ContactHandler>,
    ) {
        // Handlers subscribed while the list was out belong after the
        // original subscribers
        if let Some(added) = self.handlers.remove(&(shape, kind)) {
            list.extend(added);
        }
        self.handlers.insert((shape, kind), list);
    }
}
