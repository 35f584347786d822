//! Collision world configuration
//!
//! The scene/world layer supplies the world rectangle and tree tuning
//! at construction time, either programmatically or from a TOML file.

use crate::foundation::math::{Rect, Vec2};
use crate::spatial::QuadtreeConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Semantically invalid configuration
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for a collision world
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Fixed world rectangle the quadtree covers
    pub world_bounds: Rect,

    /// Maximum quadtree subdivision depth
    pub max_depth: u32,

    /// Maximum bodies per leaf before subdivision triggers
    pub split_threshold: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        let tree = QuadtreeConfig::default();
        Self {
            world_bounds: Rect::from_center_extents(Vec2::zeros(), Vec2::new(1000.0, 1000.0)),
            max_depth: tree.max_depth,
            split_threshold: tree.split_threshold,
        }
    }
}

impl CollisionConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for semantic errors
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.world_bounds.has_area() {
            return Err(ConfigError::Invalid(
                "world_bounds must enclose a positive area".to_owned(),
            ));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_depth must be at least 1".to_owned(),
            ));
        }
        if self.split_threshold == 0 {
            return Err(ConfigError::Invalid(
                "split_threshold must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// The quadtree tuning portion of this configuration
    pub fn quadtree_config(&self) -> QuadtreeConfig {
        QuadtreeConfig {
            split_threshold: self.split_threshold,
            max_depth: self.max_depth,
        }
    }
}
