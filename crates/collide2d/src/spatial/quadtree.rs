//! Quadtree spatial partitioning structure
//!
//! Divides a fixed world rectangle into hierarchical cells for fast
//! broad-phase culling. A leaf subdivides into 4 quadrants when body
//! density exceeds a threshold; a body whose rectangle straddles a cell
//! boundary is registered in every leaf it overlaps, which deliberately
//! duplicates it across the broad phase.
//!
//! Membership maintenance is remove-everything-then-reinsert: `remove`
//! unconditionally clears a body from every cell it occupies and the
//! caller reinserts with the current rectangle. This trades asymptotics
//! for simplicity; an incremental diff would be the first place to look
//! if the broad phase ever shows up in a profile.

use crate::foundation::math::{Rect, Vec2};
use crate::physics::BodyKey;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    /// Stable handle to a quadtree cell
    pub struct CellKey;
}

/// Configuration for quadtree behavior
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuadtreeConfig {
    /// Maximum bodies a leaf holds before an insertion triggers
    /// subdivision
    pub split_threshold: usize,

    /// Maximum subdivision depth; a cell at `depth + 1 >= max_depth`
    /// never subdivides
    pub max_depth: u32,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            split_threshold: 8,
            max_depth: 8,
        }
    }
}

/// Single cell in the quadtree hierarchy
///
/// A cell is a leaf while `children` is `None`; only leaves hold bodies.
#[derive(Debug)]
pub struct Cell {
    /// World-space bounds of this cell
    pub bounds: Rect,

    /// Depth in the tree (0 = root)
    pub depth: u32,

    /// Parent cell, `None` for the root
    pub parent: Option<CellKey>,

    /// Child quadrants, `None` if this is a leaf
    pub children: Option<[CellKey; 4]>,

    /// Bodies resident in this cell (leaves only)
    pub bodies: Vec<BodyKey>,
}

impl Cell {
    fn new(bounds: Rect, depth: u32, parent: Option<CellKey>) -> Self {
        Self {
            bounds,
            depth,
            parent,
            children: None,
            bodies: Vec::new(),
        }
    }

    /// Check if this cell is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

#[derive(Debug)]
struct BodyEntry {
    rect: Rect,
    cells: Vec<CellKey>,
}

/// Quadtree over a fixed world rectangle
#[derive(Debug)]
pub struct Quadtree {
    cells: SlotMap<CellKey, Cell>,
    entries: SecondaryMap<BodyKey, BodyEntry>,
    root: CellKey,
    config: QuadtreeConfig,
}

impl Quadtree {
    /// Create a new quadtree covering the given world bounds
    pub fn new(world_bounds: Rect, config: QuadtreeConfig) -> Self {
        let mut cells = SlotMap::with_key();
        let root = cells.insert(Cell::new(world_bounds, 0, None));
        Self {
            cells,
            entries: SecondaryMap::new(),
            root,
            config,
        }
    }

    /// The fixed rectangle the tree covers
    pub fn world_bounds(&self) -> Rect {
        self.cells[self.root].bounds
    }

    /// Handle of the root cell
    pub fn root(&self) -> CellKey {
        self.root
    }

    /// Look up a cell by handle
    pub fn cell(&self, key: CellKey) -> Option<&Cell> {
        self.cells.get(key)
    }

    /// Insert a body with its current world rectangle
    ///
    /// The body lands in every leaf its rectangle overlaps; a rectangle
    /// fully outside the world bounds lands in no cell at all.
    pub fn insert(&mut self, body: BodyKey, rect: Rect) {
        self.entries.insert(
            body,
            BodyEntry {
                rect,
                cells: Vec::new(),
            },
        );
        self.insert_into(self.root, body);
    }

    /// Remove a body from every cell it occupies
    ///
    /// Unconditional: no attempt is made to keep membership in cells
    /// that would still be valid. Callers reinsert with the current
    /// rectangle when the body remains collidable.
    pub fn remove(&mut self, body: BodyKey) {
        let Some(entry) = self.entries.remove(body) else {
            return;
        };
        for cell_key in entry.cells {
            if let Some(cell) = self.cells.get_mut(cell_key) {
                if let Some(index) = cell.bodies.iter().position(|&b| b == body) {
                    cell.bodies.swap_remove(index);
                }
            }
        }
    }

    /// Refresh a body's membership for a new rectangle
    pub fn update(&mut self, body: BodyKey, rect: Rect) {
        self.remove(body);
        self.insert(body, rect);
    }

    /// Leaf cells the body currently occupies
    pub fn cells_of(&self, body: BodyKey) -> &[CellKey] {
        self.entries
            .get(body)
            .map_or(&[], |entry| entry.cells.as_slice())
    }

    /// Bodies resident in a cell (empty for internal cells)
    pub fn bodies_in(&self, cell: CellKey) -> &[BodyKey] {
        self.cells
            .get(cell)
            .map_or(&[], |cell| cell.bodies.as_slice())
    }

    /// True if the body is registered in the tree
    pub fn contains(&self, body: BodyKey) -> bool {
        self.entries.contains_key(body)
    }

    /// Number of registered bodies
    pub fn body_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of leaf cells
    pub fn leaf_count(&self) -> usize {
        self.cells.values().filter(|cell| cell.is_leaf()).count()
    }

    /// Total number of cells, leaves and internal alike
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Drop every body and cell, keeping the world bounds
    pub fn clear(&mut self) {
        let bounds = self.world_bounds();
        self.cells.clear();
        self.entries.clear();
        self.root = self.cells.insert(Cell::new(bounds, 0, None));
    }

    fn insert_into(&mut self, cell_key: CellKey, body: BodyKey) {
        let Some(rect) = self.entries.get(body).map(|entry| entry.rect) else {
            return;
        };
        if !self.cells[cell_key].bounds.intersects(&rect) {
            return;
        }

        if self.cells[cell_key].is_leaf()
            && self.cells[cell_key].bodies.len() + 1 > self.config.split_threshold
        {
            self.subdivide(cell_key);
        }

        if self.cells[cell_key].is_leaf() {
            self.cells[cell_key].bodies.push(body);
            self.entries[body].cells.push(cell_key);
        } else if let Some(children) = self.cells[cell_key].children {
            // Recurse into every overlapping quadrant; a straddling body
            // registers in each of them
            for child in children {
                self.insert_into(child, body);
            }
        }
    }

    /// Split a leaf into 4 equal quadrants and redistribute its bodies
    fn subdivide(&mut self, cell_key: CellKey) {
        let (bounds, depth) = {
            let cell = &self.cells[cell_key];
            if cell.children.is_some() || cell.depth + 1 >= self.config.max_depth {
                return;
            }
            (cell.bounds, cell.depth)
        };

        let center = bounds.center();
        // Quadrant layout: 0: -X -Y, 1: +X -Y, 2: -X +Y, 3: +X +Y
        let quadrants = [
            Rect::new(bounds.min, center),
            Rect::new(
                Vec2::new(center.x, bounds.min.y),
                Vec2::new(bounds.max.x, center.y),
            ),
            Rect::new(
                Vec2::new(bounds.min.x, center.y),
                Vec2::new(center.x, bounds.max.y),
            ),
            Rect::new(center, bounds.max),
        ];

        let mut children = [CellKey::default(); 4];
        for (slot, quadrant) in children.iter_mut().zip(quadrants) {
            *slot = self
                .cells
                .insert(Cell::new(quadrant, depth + 1, Some(cell_key)));
        }
        self.cells[cell_key].children = Some(children);

        // Residents move down into whichever children they overlap,
        // possibly more than one
        let residents = std::mem::take(&mut self.cells[cell_key].bodies);
        for body in residents {
            if let Some(entry) = self.entries.get_mut(body) {
                entry.cells.retain(|&c| c != cell_key);
            }
            for child in children {
                self.insert_into(child, body);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn world() -> Rect {
        Rect::new(Vec2::new(-100.0, -100.0), Vec2::new(100.0, 100.0))
    }

    fn small_config() -> QuadtreeConfig {
        QuadtreeConfig {
            split_threshold: 4,
            max_depth: 4,
        }
    }

    fn mint_bodies(count: usize) -> (SlotMap<BodyKey, ()>, Vec<BodyKey>) {
        let mut arena: SlotMap<BodyKey, ()> = SlotMap::with_key();
        let keys = (0..count).map(|_| arena.insert(())).collect();
        (arena, keys)
    }

    fn unit_rect_at(x: f32, y: f32) -> Rect {
        Rect::from_position_size(Vec2::new(x, y), 1.0, 1.0)
    }

    #[test]
    fn test_insert_inside_single_leaf() {
        let mut tree = Quadtree::new(world(), small_config());
        let (_arena, bodies) = mint_bodies(1);

        tree.insert(bodies[0], unit_rect_at(10.0, 10.0));
        assert_eq!(tree.cells_of(bodies[0]).len(), 1);
        assert_eq!(tree.body_count(), 1);
    }

    #[test]
    fn test_insert_outside_world_registers_nowhere() {
        let mut tree = Quadtree::new(world(), small_config());
        let (_arena, bodies) = mint_bodies(1);

        tree.insert(bodies[0], unit_rect_at(500.0, 500.0));
        assert!(tree.cells_of(bodies[0]).is_empty());
    }

    #[test]
    fn test_subdivision_threshold() {
        let mut tree = Quadtree::new(world(), small_config());
        let (_arena, bodies) = mint_bodies(5);

        // Four bodies, one per quadrant, fit in the root leaf
        let rects = [
            unit_rect_at(-50.0, -50.0),
            unit_rect_at(50.0, -50.0),
            unit_rect_at(-50.0, 50.0),
            unit_rect_at(50.0, 50.0),
        ];
        for (body, rect) in bodies.iter().zip(rects) {
            tree.insert(*body, rect);
        }
        assert_eq!(tree.leaf_count(), 1);

        // The fifth insertion subdivides and redistributes by
        // geometric containment
        tree.insert(bodies[4], unit_rect_at(25.0, 25.0));
        assert_eq!(tree.leaf_count(), 4);

        let root_children = tree.cell(tree.root()).unwrap().children.unwrap();
        let total: usize = root_children
            .iter()
            .map(|&child| tree.bodies_in(child).len())
            .sum();
        assert_eq!(total, 5);

        // Quadrant 3 (+X +Y) holds both bodies on that side
        assert_eq!(tree.bodies_in(root_children[3]).len(), 2);
        for body in &bodies {
            assert_eq!(tree.cells_of(*body).len(), 1);
        }
    }

    #[test]
    fn test_straddler_registers_in_every_overlapping_leaf() {
        let mut tree = Quadtree::new(world(), small_config());
        let (_arena, bodies) = mint_bodies(6);

        for (i, body) in bodies[..5].iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let offset = i as f32;
            tree.insert(*body, unit_rect_at(-80.0 + offset * 3.0, -80.0));
        }
        assert!(tree.leaf_count() > 1);

        // A rect centered on the root split point overlaps all four
        // quadrants
        let straddler = Rect::from_center_extents(Vec2::zeros(), Vec2::new(5.0, 5.0));
        tree.insert(bodies[5], straddler);
        assert_eq!(tree.cells_of(bodies[5]).len(), 4);

        tree.remove(bodies[5]);
        assert!(tree.cells_of(bodies[5]).is_empty());
        for cell in tree
            .cell(tree.root())
            .unwrap()
            .children
            .unwrap()
            .into_iter()
        {
            assert!(!tree.bodies_in(cell).contains(&bodies[5]));
        }
    }

    #[test]
    fn test_max_depth_stops_subdivision() {
        let config = QuadtreeConfig {
            split_threshold: 2,
            max_depth: 1,
        };
        let mut tree = Quadtree::new(world(), config);
        let (_arena, bodies) = mint_bodies(6);

        // With max_depth 1 the root may never subdivide, so every body
        // stays in the root leaf regardless of the threshold
        for body in &bodies {
            tree.insert(*body, unit_rect_at(0.0, 0.0));
        }
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.bodies_in(tree.root()).len(), 6);
    }

    #[test]
    fn test_update_moves_membership() {
        let mut tree = Quadtree::new(world(), small_config());
        let (_arena, bodies) = mint_bodies(1);

        tree.insert(bodies[0], unit_rect_at(-50.0, -50.0));
        let before = tree.cells_of(bodies[0]).to_vec();

        tree.update(bodies[0], unit_rect_at(50.0, 50.0));
        let after = tree.cells_of(bodies[0]).to_vec();

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 1);
        // Same tree shape here, so both rects land in the root leaf
        assert_eq!(before, after);

        tree.update(bodies[0], unit_rect_at(900.0, 900.0));
        assert!(tree.cells_of(bodies[0]).is_empty());
    }

    #[test]
    fn test_clear_resets_to_single_leaf() {
        let mut tree = Quadtree::new(world(), small_config());
        let (_arena, bodies) = mint_bodies(5);
        for (i, body) in bodies.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let offset = i as f32;
            tree.insert(*body, unit_rect_at(-80.0 + offset * 40.0, 0.0));
        }

        tree.clear();
        assert_eq!(tree.body_count(), 0);
        assert_eq!(tree.cell_count(), 1);
        assert_eq!(tree.world_bounds(), world());
    }
}
