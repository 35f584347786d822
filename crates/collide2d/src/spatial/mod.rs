//! Spatial partitioning for broad-phase collision detection

pub mod quadtree;

pub use quadtree::{Cell, CellKey, Quadtree, QuadtreeConfig};
