//! Collision coordinator
//!
//! Owns the body and shape arenas, the quadtree broad phase and the
//! contact dispatcher, and drives the per-tick pipeline: refresh tree
//! membership, pairwise-test co-resident bodies, resolve blocking
//! contacts, then sweep the persistent overlap set for update/exit
//! events.
//!
//! Single-threaded by design: one world per simulation, invoked once
//! per fixed tick after gameplay updates have applied positions.
//! Active bodies are processed in current vector order, which is not
//! stable across ticks because removal swaps from the back.

use crate::config::CollisionConfig;
use crate::events::{ContactDispatcher, ContactEvent, ContactKind};
use crate::foundation::math::{Rect, Vec2};
use crate::physics::body::Body;
use crate::physics::channels::ChannelRegistry;
use crate::physics::response::{CollisionProfile, Response};
use crate::physics::shape::Shape;
use crate::physics::shape_registry::{ShapeSpec, ShapeTypeRegistry};
use crate::physics::{BodyKey, CollisionError, ShapeKey};
use crate::spatial::{CellKey, Quadtree};
use slotmap::SlotMap;
use std::collections::HashSet;

/// Coordinator for one simulation world's collision state
pub struct CollisionWorld {
    bodies: SlotMap<BodyKey, Body>,
    shapes: SlotMap<ShapeKey, Shape>,
    tree: Quadtree,
    /// Non-static, collision-enabled bodies with at least one enabled
    /// shape
    active: Vec<BodyKey>,
    /// Shapes with at least one live overlap, re-checked every tick
    pending_overlaps: Vec<ShapeKey>,
    /// Pairs that began overlapping this tick; their first update event
    /// waits until the next tick
    begun_this_tick: HashSet<(ShapeKey, ShapeKey)>,
    dispatcher: ContactDispatcher,
    config: CollisionConfig,
}

impl CollisionWorld {
    /// Create a world from configuration
    pub fn new(config: CollisionConfig) -> Self {
        let tree = Quadtree::new(config.world_bounds, config.quadtree_config());
        Self {
            bodies: SlotMap::with_key(),
            shapes: SlotMap::with_key(),
            tree,
            active: Vec::new(),
            pending_overlaps: Vec::new(),
            begun_this_tick: HashSet::new(),
            dispatcher: ContactDispatcher::new(),
            config,
        }
    }

    /// The configuration this world was built from
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Broad-phase structure, exposed for inspection and debug overlays
    pub fn quadtree(&self) -> &Quadtree {
        &self.tree
    }

    /// Replace the world rectangle and rebuild the tree
    ///
    /// Every collidable body is reinserted with its current rectangle.
    pub fn set_world_bounds(&mut self, bounds: Rect) {
        self.config.world_bounds = bounds;
        self.tree = Quadtree::new(bounds, self.config.quadtree_config());
        let keys: Vec<BodyKey> = self.bodies.keys().collect();
        for body in keys {
            self.update_membership(body);
        }
    }

    // ---- body lifecycle -------------------------------------------------

    /// Create a body at a world position
    pub fn create_body(&mut self, position: Vec2, is_static: bool) -> BodyKey {
        let key = self.bodies.insert(Body::new(position, is_static));
        self.update_membership(key);
        key
    }

    /// Look up a body
    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of bodies on the active per-tick sweep
    pub fn active_body_count(&self) -> usize {
        self.active.len()
    }

    /// Mark a body's owner as queued for destruction
    ///
    /// The body stops participating in pairing immediately; storage is
    /// reclaimed by [`destroy_body`](Self::destroy_body).
    pub fn queue_destroy(&mut self, body: BodyKey) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.queued_destroy = true;
        }
        self.refresh_active(body);
        self.update_membership(body);
    }

    /// Destroy a body and all of its shapes
    pub fn destroy_body(&mut self, body: BodyKey) {
        let shape_keys: Vec<ShapeKey> = self
            .bodies
            .get(body)
            .map(|b| b.shape_keys().collect())
            .unwrap_or_default();
        for key in shape_keys {
            self.drop_shape_storage(key);
        }
        self.tree.remove(body);
        if let Some(index) = self.active.iter().position(|&b| b == body) {
            self.active.swap_remove(index);
        }
        self.bodies.remove(body);
    }

    /// Write a body's position for this tick, keeping last-position
    /// tracking
    pub fn set_body_position(&mut self, body: BodyKey, position: Vec2) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.last_position = b.position;
            b.position = position;
        }
        self.update_membership(body);
    }

    /// Write a body's velocity for this tick
    pub fn set_body_velocity(&mut self, body: BodyKey, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.velocity = velocity;
        }
    }

    /// Toggle a body between static and active
    ///
    /// Becoming active resets velocity and last-position tracking.
    pub fn set_body_static(&mut self, body: BodyKey, is_static: bool) {
        if let Some(b) = self.bodies.get_mut(body) {
            if b.is_static == is_static {
                return;
            }
            b.is_static = is_static;
            if !is_static {
                b.velocity = Vec2::zeros();
                b.last_position = b.position;
            }
        }
        self.refresh_active(body);
    }

    /// Enable or disable collision for a whole body
    pub fn set_body_collision_enabled(&mut self, body: BodyKey, enabled: bool) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.collision_enabled = enabled;
        }
        self.refresh_active(body);
        self.update_membership(body);
    }

    // ---- shape lifecycle ------------------------------------------------

    /// Add a shape to a body
    ///
    /// A duplicate shape name is logged and ignored, leaving the
    /// existing shape untouched.
    pub fn add_shape(&mut self, body: BodyKey, shape: Shape) -> Option<ShapeKey> {
        let Some(b) = self.bodies.get(body) else {
            log::warn!("add_shape on a body that no longer exists");
            return None;
        };
        if b.shapes.contains_key(shape.name()) {
            log::warn!(
                "body already has a shape named '{}'; keeping the existing one",
                shape.name()
            );
            return None;
        }

        let enabled = shape.is_enabled();
        let name = shape.name().to_owned();
        let key = self.shapes.insert(shape);
        self.shapes[key].set_owner(body);
        if let Some(b) = self.bodies.get_mut(body) {
            b.shapes.insert(name, key);
            if enabled {
                b.recompute_bounding(&self.shapes);
            }
        }
        self.refresh_active(body);
        self.update_membership(body);
        Some(key)
    }

    /// Build a shape from a data record and add it to a body
    ///
    /// Channel names in the record are registered on first use;
    /// construction failure is fatal for the object being loaded, while
    /// a duplicate name is the usual logged no-op.
    pub fn add_shape_from_spec(
        &mut self,
        body: BodyKey,
        name: &str,
        spec: &ShapeSpec,
        types: &ShapeTypeRegistry,
        channels: &mut ChannelRegistry,
    ) -> Result<Option<ShapeKey>, CollisionError> {
        let shape = types.build_shape(name, spec, channels)?;
        Ok(self.add_shape(body, shape))
    }

    /// Remove a shape from a body by name
    ///
    /// Active overlaps are purged from every partner's set without
    /// firing exit events; use
    /// [`set_shape_enabled`](Self::set_shape_enabled) first when exit
    /// notifications are wanted.
    pub fn remove_shape(&mut self, body: BodyKey, name: &str) -> bool {
        let Some(key) = self.bodies.get(body).and_then(|b| b.shape(name)) else {
            return false;
        };
        let was_enabled = self.shapes.get(key).is_some_and(Shape::is_enabled);
        self.drop_shape_storage(key);
        if let Some(b) = self.bodies.get_mut(body) {
            b.shapes.remove(name);
            if was_enabled {
                b.recompute_bounding(&self.shapes);
            }
        }
        self.refresh_active(body);
        self.update_membership(body);
        true
    }

    /// Look up a shape
    pub fn shape(&self, key: ShapeKey) -> Option<&Shape> {
        self.shapes.get(key)
    }

    /// Mutable access to a shape, for channel/response configuration
    pub fn shape_mut(&mut self, key: ShapeKey) -> Option<&mut Shape> {
        self.shapes.get_mut(key)
    }

    /// Iterate every live shape
    pub fn shapes(&self) -> impl Iterator<Item = (ShapeKey, &Shape)> {
        self.shapes.iter()
    }

    /// True if both shapes are in each other's overlap set
    pub fn are_overlapping(&self, a: ShapeKey, b: ShapeKey) -> bool {
        self.shapes.get(a).is_some_and(|s| s.overlapping.contains(&b))
    }

    /// Enable or disable a single shape
    ///
    /// Disabling a shape that currently overlaps synchronously fires
    /// exit-overlap to every partner, clears both sides' sets, and
    /// drops the shape from the pending-update list.
    pub fn set_shape_enabled(&mut self, key: ShapeKey, enabled: bool) {
        let Some(shape) = self.shapes.get(key) else {
            return;
        };
        if shape.is_enabled() == enabled {
            return;
        }
        let owner = shape.owner();

        if !enabled {
            self.end_all_overlaps(key);
            self.purge_pending(key);
        }
        if let Some(shape) = self.shapes.get_mut(key) {
            shape.set_enabled_flag(enabled);
        }
        if let Some(b) = self.bodies.get_mut(owner) {
            b.recompute_bounding(&self.shapes);
        }
        self.refresh_active(owner);
        self.update_membership(owner);
    }

    /// Subscribe a contact callback on one channel of one shape
    pub fn on_contact<F>(&mut self, shape: ShapeKey, kind: ContactKind, handler: F)
    where
        F: FnMut(&mut CollisionWorld, &ContactEvent) + 'static,
    {
        self.dispatcher.subscribe(shape, kind, handler);
    }

    // ---- per-tick pipeline ----------------------------------------------

    /// Run one fixed tick of collision detection and response
    ///
    /// Call after all gameplay updates have applied position changes
    /// for the tick.
    pub fn run_collisions(&mut self) {
        self.begun_this_tick.clear();
        let mut index = 0;
        while index < self.active.len() {
            let body = self.active[index];
            self.check_collision(body);
            index += 1;
        }
        self.update_overlapping_shapes();
    }

    fn check_collision(&mut self, body: BodyKey) {
        let Some(b) = self.bodies.get(body) else {
            return;
        };
        debug_assert!(b.collision_enabled, "disabled body on the active list");
        if !b.collision_enabled {
            return;
        }

        self.update_membership(body);
        if self.tree.cells_of(body).is_empty() {
            // Fully outside world bounds
            log::trace!("active body occupies no cell, skipping pair tests");
            return;
        }
        self.run_collision_for_body(body);
        // A block resolution may have moved the body
        self.update_membership(body);
    }

    fn update_membership(&mut self, body: BodyKey) {
        self.tree.remove(body);
        if let Some(b) = self.bodies.get(body) {
            if b.collision_enabled && !b.queued_destroy {
                self.tree.insert(body, b.world_rect());
            }
        }
    }

    fn run_collision_for_body(&mut self, body: BodyKey) {
        let cells: Vec<CellKey> = self.tree.cells_of(body).to_vec();
        for cell in cells {
            let others: Vec<BodyKey> = self.tree.bodies_in(cell).to_vec();
            for other in others {
                if other == body {
                    continue;
                }
                let Some(me) = self.bodies.get(body) else {
                    return;
                };
                if me.queued_destroy || !me.collision_enabled {
                    return;
                }
                let Some(them) = self.bodies.get(other) else {
                    continue;
                };
                if them.queued_destroy {
                    continue;
                }
                if !me.world_rect().intersects(&them.world_rect()) {
                    continue;
                }

                let my_shapes: Vec<ShapeKey> = me.shape_keys().collect();
                let their_shapes: Vec<ShapeKey> = them.shape_keys().collect();
                for mine in &my_shapes {
                    for theirs in &their_shapes {
                        self.test_shape_pair(body, *mine, other, *theirs);
                    }
                }
            }
        }
    }

    fn test_shape_pair(
        &mut self,
        body: BodyKey,
        mine: ShapeKey,
        other: BodyKey,
        theirs: ShapeKey,
    ) {
        let (Some(shape_a), Some(shape_b)) = (self.shapes.get(mine), self.shapes.get(theirs))
        else {
            return;
        };
        if !shape_a.is_enabled() || !shape_b.is_enabled() {
            return;
        }

        let combined = CollisionProfile::combined(shape_a.profile(), shape_b.profile());
        if combined.contains(Response::IGNORE) {
            return;
        }

        let (Some(me), Some(them)) = (self.bodies.get(body), self.bodies.get(other)) else {
            return;
        };
        let rect_a = shape_a.rect_world(me.position);
        let rect_b = shape_b.rect_world(them.position);
        let Some(intersection) = rect_a.intersection(&rect_b) else {
            return;
        };

        if combined == Response::BLOCK {
            self.resolve_block(body, &rect_a, &rect_b, &intersection);
            self.dispatch(ContactKind::Hit, mine, theirs, other);
            self.dispatch(ContactKind::Hit, theirs, mine, body);
        } else {
            self.begin_overlap(body, mine, other, theirs);
        }
    }

    /// Push the calling body out along the shorter overlap axis
    ///
    /// Only this body is corrected; the other body is left untouched,
    /// so resolution order across a tick is asymmetric. The velocity is
    /// replaced by its projection onto the contact face normal.
    fn resolve_block(&mut self, body: BodyKey, rect_a: &Rect, rect_b: &Rect, overlap: &Rect) {
        let Some(me) = self.bodies.get_mut(body) else {
            return;
        };
        // The wider overlap edge is the contact face; displacement is
        // perpendicular to it
        let (delta, normal) = if overlap.width() > overlap.height() {
            let direction = if rect_a.min.y < rect_b.min.y { -1.0 } else { 1.0 };
            (
                Vec2::new(0.0, direction * overlap.height()),
                Vec2::new(0.0, direction),
            )
        } else {
            let direction = if rect_a.min.x < rect_b.min.x { -1.0 } else { 1.0 };
            (
                Vec2::new(direction * overlap.width(), 0.0),
                Vec2::new(direction, 0.0),
            )
        };
        me.position += delta;
        me.velocity = normal * me.velocity.dot(&normal);
    }

    fn begin_overlap(&mut self, body: BodyKey, mine: ShapeKey, other: BodyKey, theirs: ShapeKey) {
        if self
            .shapes
            .get(mine)
            .is_some_and(|s| s.overlapping.contains(&theirs))
        {
            // Already tracked; the overlap sweep handles updates
            return;
        }

        if let Some(shape) = self.shapes.get_mut(mine) {
            shape.overlapping.insert(theirs);
        }
        if let Some(shape) = self.shapes.get_mut(theirs) {
            shape.overlapping.insert(mine);
        }
        self.push_pending(mine);
        self.push_pending(theirs);
        self.begun_this_tick.insert((mine, theirs));
        self.begun_this_tick.insert((theirs, mine));

        self.dispatch(ContactKind::BeginOverlap, mine, theirs, other);
        // A callback may have disabled collision on either side; the
        // second broadcast is suppressed in that case
        let both_enabled = self
            .bodies
            .get(body)
            .is_some_and(|b| b.collision_enabled)
            && self
                .bodies
                .get(other)
                .is_some_and(|b| b.collision_enabled);
        if both_enabled {
            self.dispatch(ContactKind::BeginOverlap, theirs, mine, body);
        }
    }

    /// Sweep every shape with a live overlap for update/exit events
    ///
    /// Iterates the pending list swap-and-pop style, so entry order is
    /// not stable. Each entry fires updates for its own side of a pair;
    /// separation is noticed by whichever entry comes first, which
    /// removes the pair symmetrically and fires both exit events.
    fn update_overlapping_shapes(&mut self) {
        let mut index = 0;
        while index < self.pending_overlaps.len() {
            let key = self.pending_overlaps[index];
            let live = self
                .shapes
                .get(key)
                .is_some_and(|s| !s.overlapping.is_empty());
            if !live {
                self.pending_overlaps.swap_remove(index);
                continue;
            }

            let partners: Vec<ShapeKey> = self.shapes[key].overlapping.iter().copied().collect();
            for partner in partners {
                if self.shapes.get(partner).is_none() {
                    if let Some(shape) = self.shapes.get_mut(key) {
                        shape.overlapping.remove(&partner);
                    }
                    continue;
                }
                let Some((rect_a, owner_a)) = self.shape_world_rect(key) else {
                    break;
                };
                let Some((rect_b, owner_b)) = self.shape_world_rect(partner) else {
                    continue;
                };

                if rect_a.intersection(&rect_b).is_none() {
                    if let Some(shape) = self.shapes.get_mut(key) {
                        shape.overlapping.remove(&partner);
                    }
                    if let Some(shape) = self.shapes.get_mut(partner) {
                        shape.overlapping.remove(&key);
                    }
                    self.dispatch(ContactKind::ExitOverlap, key, partner, owner_b);
                    self.dispatch(ContactKind::ExitOverlap, partner, key, owner_a);
                } else if !self.begun_this_tick.contains(&(key, partner)) {
                    self.dispatch(ContactKind::OverlapUpdate, key, partner, owner_b);
                }
            }

            let emptied = self
                .shapes
                .get(key)
                .is_none_or(|s| s.overlapping.is_empty());
            if emptied {
                self.pending_overlaps.swap_remove(index);
            } else {
                index += 1;
            }
        }
    }

    // ---- internals ------------------------------------------------------

    fn shape_world_rect(&self, key: ShapeKey) -> Option<(Rect, BodyKey)> {
        let shape = self.shapes.get(key)?;
        let owner = self.bodies.get(shape.owner())?;
        Some((shape.rect_world(owner.position), shape.owner()))
    }

    fn dispatch(
        &mut self,
        kind: ContactKind,
        shape: ShapeKey,
        other_shape: ShapeKey,
        other_body: BodyKey,
    ) {
        let Some(mut handlers) = self.dispatcher.take(shape, kind) else {
            return;
        };
        let event = ContactEvent {
            shape,
            other_shape,
            other_body,
        };
        for handler in &mut handlers {
            handler(self, &event);
        }
        self.dispatcher.reinstall(shape, kind, handlers);
    }

    /// Wind down every overlap of a shape, firing exit events both ways
    fn end_all_overlaps(&mut self, key: ShapeKey) {
        let partners: Vec<ShapeKey> = self
            .shapes
            .get(key)
            .map(|s| s.overlapping.iter().copied().collect())
            .unwrap_or_default();
        for partner in partners {
            if let Some(shape) = self.shapes.get_mut(key) {
                shape.overlapping.remove(&partner);
            }
            if let Some(shape) = self.shapes.get_mut(partner) {
                shape.overlapping.remove(&key);
            }
            let owner_a = self.shapes.get(key).map(Shape::owner);
            let owner_b = self.shapes.get(partner).map(Shape::owner);
            if let (Some(owner_a), Some(owner_b)) = (owner_a, owner_b) {
                self.dispatch(ContactKind::ExitOverlap, key, partner, owner_b);
                self.dispatch(ContactKind::ExitOverlap, partner, key, owner_a);
            }
        }
    }

    /// Remove a shape's arena storage, purging every reference to it
    fn drop_shape_storage(&mut self, key: ShapeKey) {
        self.purge_pending(key);
        let partners: Vec<ShapeKey> = self
            .shapes
            .get(key)
            .map(|s| s.overlapping.iter().copied().collect())
            .unwrap_or_default();
        for partner in partners {
            if let Some(shape) = self.shapes.get_mut(partner) {
                shape.overlapping.remove(&key);
            }
        }
        self.dispatcher.clear_shape(key);
        self.shapes.remove(key);
    }

    fn purge_pending(&mut self, key: ShapeKey) {
        self.pending_overlaps.retain(|&k| k != key);
    }

    fn push_pending(&mut self, key: ShapeKey) {
        // Linear duplicate guard, same as the active list
        if !self.pending_overlaps.contains(&key) {
            self.pending_overlaps.push(key);
        }
    }

    fn refresh_active(&mut self, body: BodyKey) {
        let should_be_active = self.bodies.get(body).is_some_and(|b| {
            !b.is_static
                && b.collision_enabled
                && !b.queued_destroy
                && b.has_enabled_shape(&self.shapes)
        });
        let position = self.active.iter().position(|&b| b == body);
        match (should_be_active, position) {
            (true, None) => self.active.push(body),
            (false, Some(index)) => {
                self.active.swap_remove(index);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::shape::BoxShape;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    type EventLog = Rc<RefCell<Vec<ContactKind>>>;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn test_world() -> CollisionWorld {
        init_logging();
        let mut config = CollisionConfig::default();
        config.world_bounds = Rect::from_center_extents(Vec2::zeros(), Vec2::new(100.0, 100.0));
        config.max_depth = 4;
        config.split_threshold = 4;
        CollisionWorld::new(config)
    }

    fn box_shape(name: &str, width: f32, height: f32, profile: CollisionProfile) -> Shape {
        Shape::new(
            name,
            Box::new(BoxShape::new(Vec2::zeros(), width, height)),
            profile,
        )
    }

    /// "alpha" and "beta" colliders that overlap each other
    fn overlap_pair_profiles(
        channels: &mut ChannelRegistry,
    ) -> (CollisionProfile, CollisionProfile) {
        let mut alpha = CollisionProfile::default();
        alpha.set_channel_by_name(channels, "alpha").unwrap();
        alpha
            .set_response_by_name(channels, "beta", Response::OVERLAP)
            .unwrap();
        let mut beta = CollisionProfile::default();
        beta.set_channel_by_name(channels, "beta").unwrap();
        beta.set_response_by_name(channels, "alpha", Response::OVERLAP)
            .unwrap();
        (alpha, beta)
    }

    fn record_all(world: &mut CollisionWorld, shape: ShapeKey, log: &EventLog) {
        for kind in [
            ContactKind::Hit,
            ContactKind::BeginOverlap,
            ContactKind::OverlapUpdate,
            ContactKind::ExitOverlap,
        ] {
            let log = Rc::clone(log);
            world.on_contact(shape, kind, move |_, _| log.borrow_mut().push(kind));
        }
    }

    #[test]
    fn test_overlap_lifecycle_sequence() {
        let mut world = test_world();
        let mut channels = ChannelRegistry::new();
        let (alpha, beta) = overlap_pair_profiles(&mut channels);

        let mover = world.create_body(Vec2::zeros(), false);
        let sensor = world
            .add_shape(mover, box_shape("sensor", 10.0, 10.0, alpha))
            .unwrap();
        let anchor = world.create_body(Vec2::new(30.0, 0.0), true);
        let hull = world
            .add_shape(anchor, box_shape("hull", 10.0, 10.0, beta))
            .unwrap();

        let log_a: EventLog = Rc::default();
        let log_b: EventLog = Rc::default();
        record_all(&mut world, sensor, &log_a);
        record_all(&mut world, hull, &log_b);

        // Apart: nothing fires
        world.run_collisions();
        assert!(log_a.borrow().is_empty());
        assert!(log_b.borrow().is_empty());

        // Move into overlap: begin fires on both sides, no update yet
        world.set_body_position(mover, Vec2::new(25.0, 0.0));
        world.run_collisions();
        assert_eq!(&*log_a.borrow(), &[ContactKind::BeginOverlap]);
        assert_eq!(&*log_b.borrow(), &[ContactKind::BeginOverlap]);
        assert!(world.are_overlapping(sensor, hull));
        assert!(world.are_overlapping(hull, sensor));

        // Two more ticks in place: one update per side per tick
        world.run_collisions();
        world.run_collisions();
        assert_eq!(
            &*log_a.borrow(),
            &[
                ContactKind::BeginOverlap,
                ContactKind::OverlapUpdate,
                ContactKind::OverlapUpdate,
            ]
        );
        assert_eq!(log_a.borrow().len(), log_b.borrow().len());

        // Move apart: exit fires on both sides, sets drain
        world.set_body_position(mover, Vec2::zeros());
        world.run_collisions();
        assert_eq!(log_a.borrow().last(), Some(&ContactKind::ExitOverlap));
        assert_eq!(log_b.borrow().last(), Some(&ContactKind::ExitOverlap));
        assert_eq!(log_a.borrow().len(), 4);
        assert_eq!(log_b.borrow().len(), 4);
        assert!(!world.are_overlapping(sensor, hull));
        assert!(world.shape(sensor).unwrap().overlapping().is_empty());
        assert!(world.shape(hull).unwrap().overlapping().is_empty());
    }

    #[test]
    fn test_block_resolution_pushes_out_and_projects_velocity() {
        let mut world = test_world();

        let wall = world.create_body(Vec2::zeros(), true);
        let wall_shape = world
            .add_shape(wall, box_shape("wall", 10.0, 10.0, CollisionProfile::default()))
            .unwrap();
        let mover = world.create_body(Vec2::new(20.0, 0.0), false);
        let hull = world
            .add_shape(mover, box_shape("hull", 10.0, 10.0, CollisionProfile::default()))
            .unwrap();

        let log_wall: EventLog = Rc::default();
        let log_mover: EventLog = Rc::default();
        record_all(&mut world, wall_shape, &log_wall);
        record_all(&mut world, hull, &log_mover);

        // Step the mover deep into the wall
        world.set_body_position(mover, Vec2::new(5.0, 0.0));
        world.set_body_velocity(mover, Vec2::new(-15.0, 0.0));
        world.run_collisions();

        // Pushed back out along X to rest against the wall face
        let body = world.body(mover).unwrap();
        assert_relative_eq!(body.position().x, 10.0);
        assert_relative_eq!(body.position().y, 0.0);
        assert_relative_eq!(body.velocity().x, -15.0);
        assert_relative_eq!(body.velocity().y, 0.0);
        assert_relative_eq!(body.last_position().x, 20.0);

        // Only the moving body is corrected
        let wall_body = world.body(wall).unwrap();
        assert_relative_eq!(wall_body.position().x, 0.0);

        // One hit per side and no overlap tracking
        assert_eq!(&*log_wall.borrow(), &[ContactKind::Hit]);
        assert_eq!(&*log_mover.borrow(), &[ContactKind::Hit]);
        assert!(!world.are_overlapping(hull, wall_shape));
    }

    #[test]
    fn test_ignore_pair_produces_no_events() {
        let mut world = test_world();
        let mut channels = ChannelRegistry::new();

        let mut alpha = CollisionProfile::default();
        alpha.set_channel_by_name(&mut channels, "alpha").unwrap();
        alpha
            .set_response_by_name(&mut channels, "beta", Response::IGNORE)
            .unwrap();
        let mut beta = CollisionProfile::default();
        beta.set_channel_by_name(&mut channels, "beta").unwrap();
        beta.set_response_by_name(&mut channels, "alpha", Response::OVERLAP)
            .unwrap();

        let mover = world.create_body(Vec2::zeros(), false);
        let sensor = world.add_shape(mover, box_shape("sensor", 10.0, 10.0, alpha)).unwrap();
        let anchor = world.create_body(Vec2::new(5.0, 0.0), true);
        let hull = world.add_shape(anchor, box_shape("hull", 10.0, 10.0, beta)).unwrap();

        let log: EventLog = Rc::default();
        record_all(&mut world, sensor, &log);
        record_all(&mut world, hull, &log);

        // One ignore flag on either side suppresses the pair entirely
        world.run_collisions();
        world.run_collisions();
        assert!(log.borrow().is_empty());
        assert!(!world.are_overlapping(sensor, hull));
        assert_relative_eq!(world.body(mover).unwrap().position().x, 0.0);
    }

    #[test]
    fn test_mixed_block_and_overlap_takes_overlap_path() {
        let mut world = test_world();
        let mut channels = ChannelRegistry::new();

        let mut alpha = CollisionProfile::default();
        alpha.set_channel_by_name(&mut channels, "alpha").unwrap();
        alpha
            .set_response_by_name(&mut channels, "beta", Response::OVERLAP)
            .unwrap();
        // Blocks alpha by default
        let mut beta = CollisionProfile::default();
        beta.set_channel_by_name(&mut channels, "beta").unwrap();

        let mover = world.create_body(Vec2::zeros(), false);
        let sensor = world.add_shape(mover, box_shape("sensor", 10.0, 10.0, alpha)).unwrap();
        let anchor = world.create_body(Vec2::new(5.0, 0.0), true);
        let hull = world.add_shape(anchor, box_shape("hull", 10.0, 10.0, beta)).unwrap();

        let log: EventLog = Rc::default();
        record_all(&mut world, sensor, &log);

        // Block must be exclusive to resolve; block|overlap only tracks
        world.run_collisions();
        assert_eq!(&*log.borrow(), &[ContactKind::BeginOverlap]);
        assert!(world.are_overlapping(sensor, hull));
        assert_relative_eq!(world.body(mover).unwrap().position().x, 0.0);
    }

    #[test]
    fn test_disable_shape_exits_all_partners() {
        let mut world = test_world();
        let mut channels = ChannelRegistry::new();
        let (alpha, beta) = overlap_pair_profiles(&mut channels);

        let mover = world.create_body(Vec2::zeros(), false);
        let sensor = world
            .add_shape(mover, box_shape("sensor", 30.0, 10.0, alpha))
            .unwrap();
        let left = world.create_body(Vec2::new(5.0, 0.0), true);
        let left_hull = world
            .add_shape(left, box_shape("hull", 5.0, 5.0, beta.clone()))
            .unwrap();
        let right = world.create_body(Vec2::new(20.0, 0.0), true);
        let right_hull = world.add_shape(right, box_shape("hull", 5.0, 5.0, beta)).unwrap();

        let log_sensor: EventLog = Rc::default();
        let log_left: EventLog = Rc::default();
        let log_right: EventLog = Rc::default();
        record_all(&mut world, sensor, &log_sensor);
        record_all(&mut world, left_hull, &log_left);
        record_all(&mut world, right_hull, &log_right);

        world.run_collisions();
        assert_eq!(
            &*log_sensor.borrow(),
            &[ContactKind::BeginOverlap, ContactKind::BeginOverlap]
        );

        // Overlap sets stay symmetric across every tracked pair
        let tracked: Vec<(ShapeKey, ShapeKey)> = world
            .shapes()
            .flat_map(|(key, shape)| {
                shape.overlapping().iter().map(move |&partner| (key, partner))
            })
            .collect();
        assert_eq!(tracked.len(), 4);
        for (key, partner) in tracked {
            assert!(world.are_overlapping(partner, key));
        }

        // Disabling the sensor synchronously exits both partners
        world.set_shape_enabled(sensor, false);
        assert_eq!(
            &*log_sensor.borrow(),
            &[
                ContactKind::BeginOverlap,
                ContactKind::BeginOverlap,
                ContactKind::ExitOverlap,
                ContactKind::ExitOverlap,
            ]
        );
        assert_eq!(
            &*log_left.borrow(),
            &[ContactKind::BeginOverlap, ContactKind::ExitOverlap]
        );
        assert_eq!(
            &*log_right.borrow(),
            &[ContactKind::BeginOverlap, ContactKind::ExitOverlap]
        );

        // Nothing lingers on the next tick
        world.run_collisions();
        assert_eq!(log_sensor.borrow().len(), 4);
        assert!(world.shape(sensor).unwrap().overlapping().is_empty());
    }

    #[test]
    fn test_begin_callback_can_suppress_second_broadcast() {
        let mut world = test_world();
        let mut channels = ChannelRegistry::new();
        let (alpha, beta) = overlap_pair_profiles(&mut channels);

        let mover = world.create_body(Vec2::zeros(), false);
        let sensor = world.add_shape(mover, box_shape("sensor", 10.0, 10.0, alpha)).unwrap();
        let anchor = world.create_body(Vec2::new(5.0, 0.0), true);
        let hull = world.add_shape(anchor, box_shape("hull", 10.0, 10.0, beta)).unwrap();

        let log_hull: EventLog = Rc::default();
        record_all(&mut world, hull, &log_hull);
        world.on_contact(sensor, ContactKind::BeginOverlap, |world, event| {
            world.set_body_collision_enabled(event.other_body, false);
        });

        // The first side's callback disabled the other body, so the
        // second begin broadcast is dropped
        world.run_collisions();
        assert!(log_hull.borrow().is_empty());
        assert!(!world.body(anchor).unwrap().collision_enabled());
    }

    #[test]
    fn test_duplicate_shape_name_is_rejected() {
        let mut world = test_world();
        let body = world.create_body(Vec2::zeros(), false);

        let first = world.add_shape(body, box_shape("hull", 4.0, 4.0, CollisionProfile::default()));
        let second = world.add_shape(body, box_shape("hull", 8.0, 8.0, CollisionProfile::default()));

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(world.body(body).unwrap().shape_count(), 1);
    }

    #[test]
    fn test_active_list_tracks_body_state() {
        let mut world = test_world();
        let body = world.create_body(Vec2::zeros(), false);
        assert_eq!(world.active_body_count(), 0);

        let shape = world
            .add_shape(body, box_shape("hull", 4.0, 4.0, CollisionProfile::default()))
            .unwrap();
        assert_eq!(world.active_body_count(), 1);

        world.set_shape_enabled(shape, false);
        assert_eq!(world.active_body_count(), 0);
        world.set_shape_enabled(shape, true);
        assert_eq!(world.active_body_count(), 1);

        world.set_body_static(body, true);
        assert_eq!(world.active_body_count(), 0);
        world.set_body_static(body, false);
        assert_eq!(world.active_body_count(), 1);

        world.queue_destroy(body);
        assert_eq!(world.active_body_count(), 0);
    }

    #[test]
    fn test_queued_destroy_suppresses_pairing() {
        let mut world = test_world();
        let wall = world.create_body(Vec2::zeros(), true);
        let wall_shape = world
            .add_shape(wall, box_shape("wall", 10.0, 10.0, CollisionProfile::default()))
            .unwrap();
        let mover = world.create_body(Vec2::new(5.0, 0.0), false);
        world
            .add_shape(mover, box_shape("hull", 10.0, 10.0, CollisionProfile::default()))
            .unwrap();

        let log: EventLog = Rc::default();
        record_all(&mut world, wall_shape, &log);

        world.queue_destroy(wall);
        world.run_collisions();
        assert!(log.borrow().is_empty());
        assert_relative_eq!(world.body(mover).unwrap().position().x, 5.0);

        world.destroy_body(wall);
        assert_eq!(world.body_count(), 1);
        assert!(world.shape(wall_shape).is_none());
    }

    #[test]
    fn test_body_outside_world_bounds_is_skipped() {
        let mut world = test_world();
        let body = world.create_body(Vec2::new(500.0, 500.0), false);
        let shape = world
            .add_shape(body, box_shape("hull", 4.0, 4.0, CollisionProfile::default()))
            .unwrap();

        let log: EventLog = Rc::default();
        record_all(&mut world, shape, &log);

        // Occupies no cell, so the tick is a no-op for it
        world.run_collisions();
        assert!(world.quadtree().cells_of(body).is_empty());
        assert!(log.borrow().is_empty());
        assert_eq!(world.active_body_count(), 1);
    }

    #[test]
    fn test_set_world_bounds_reinserts_bodies() {
        let mut world = test_world();
        let outside = world.create_body(Vec2::new(500.0, 500.0), false);
        world
            .add_shape(outside, box_shape("hull", 4.0, 4.0, CollisionProfile::default()))
            .unwrap();
        assert!(world.quadtree().cells_of(outside).is_empty());

        world.set_world_bounds(Rect::from_center_extents(
            Vec2::zeros(),
            Vec2::new(1000.0, 1000.0),
        ));
        assert!(!world.quadtree().cells_of(outside).is_empty());
    }

    #[test]
    fn test_add_shape_from_spec() {
        let mut world = test_world();
        let mut channels = ChannelRegistry::new();
        let types = ShapeTypeRegistry::new();
        let body = world.create_body(Vec2::zeros(), false);

        let spec: ShapeSpec = toml::from_str(
            r#"
            width = 4.0
            height = 4.0
            channel = "player"

            [responses]
            trigger = "overlap"
            "#,
        )
        .unwrap();

        let key = world
            .add_shape_from_spec(body, "hull", &spec, &types, &mut channels)
            .unwrap()
            .expect("name is free");
        let shape = world.shape(key).unwrap();
        assert_eq!(shape.name(), "hull");

        let trigger = channels.get("trigger").unwrap();
        assert_eq!(shape.profile().response_to(trigger), Response::OVERLAP);
    }
}
