//! Shape type registry and data-driven shape construction
//!
//! The data-loading layer describes colliders with a textual type name
//! and an attribute record ([`ShapeSpec`]). The registry maps type names
//! to constructor closures, which is how new geometry variants plug in
//! without the body or the collision world knowing concrete types.
//!
//! The registry is an explicit object handed to the loading layer, not
//! a process-wide singleton.

use crate::foundation::math::Vec2;
use crate::physics::channels::ChannelRegistry;
use crate::physics::response::{CollisionProfile, ResponseKind};
use crate::physics::shape::{BoxShape, Shape, ShapeGeometry};
use crate::physics::CollisionError;
use serde::Deserialize;
use std::collections::HashMap;

/// Attribute record a shape is built from
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeSpec {
    /// Registered type name of the geometry to construct
    #[serde(default = "ShapeSpec::default_shape_type")]
    pub shape_type: String,

    /// Position relative to the owning body
    #[serde(default = "Vec2::zeros")]
    pub position: Vec2,

    /// Geometry width
    pub width: f32,

    /// Geometry height
    pub height: f32,

    /// Whether the shape starts enabled
    #[serde(default = "ShapeSpec::default_enabled")]
    pub enabled: bool,

    /// Channel name this shape belongs to; the reserved default when
    /// omitted
    #[serde(default)]
    pub channel: Option<String>,

    /// Per-channel response overrides, keyed by channel name
    #[serde(default)]
    pub responses: HashMap<String, ResponseKind>,
}

impl ShapeSpec {
    fn default_shape_type() -> String {
        "box".to_owned()
    }

    fn default_enabled() -> bool {
        true
    }

    /// Build the collision profile this record describes, registering
    /// any channel names it mentions
    pub fn build_profile(
        &self,
        channels: &mut ChannelRegistry,
    ) -> Result<CollisionProfile, CollisionError> {
        let mut profile = CollisionProfile::default();
        if let Some(name) = &self.channel {
            profile.set_channel_by_name(channels, name)?;
        }
        for (name, kind) in &self.responses {
            profile.set_response_by_name(channels, name, (*kind).into())?;
        }
        Ok(profile)
    }
}

/// Constructor closure for one geometry variant
pub type GeometryCtor = Box<dyn Fn(&ShapeSpec) -> Result<Box<dyn ShapeGeometry>, CollisionError>>;

/// Maps shape type names to geometry constructors
pub struct ShapeTypeRegistry {
    ctors: HashMap<String, GeometryCtor>,
}

impl ShapeTypeRegistry {
    /// Create a registry with the built-in `"box"` type registered
    pub fn new() -> Self {
        let mut registry = Self {
            ctors: HashMap::new(),
        };
        registry.register("box", |spec| {
            if !(spec.width.is_finite() && spec.height.is_finite())
                || spec.width <= 0.0
                || spec.height <= 0.0
            {
                return Err(CollisionError::InvalidShapeData {
                    reason: format!(
                        "box dimensions must be positive and finite, got {}x{}",
                        spec.width, spec.height
                    ),
                });
            }
            let geometry: Box<dyn ShapeGeometry> =
                Box::new(BoxShape::new(spec.position, spec.width, spec.height));
            Ok(geometry)
        });
        registry
    }

    /// Register a constructor for a geometry type name
    ///
    /// Re-registering a name replaces the previous constructor.
    pub fn register<F>(&mut self, type_name: impl Into<String>, ctor: F)
    where
        F: Fn(&ShapeSpec) -> Result<Box<dyn ShapeGeometry>, CollisionError> + 'static,
    {
        self.ctors.insert(type_name.into(), Box::new(ctor));
    }

    /// True if a constructor is registered for the type name
    pub fn contains(&self, type_name: &str) -> bool {
        self.ctors.contains_key(type_name)
    }

    /// Construct geometry for the record's type name
    pub fn build_geometry(
        &self,
        spec: &ShapeSpec,
    ) -> Result<Box<dyn ShapeGeometry>, CollisionError> {
        let Some(ctor) = self.ctors.get(&spec.shape_type) else {
            log::error!("no shape type registered under '{}'", spec.shape_type);
            return Err(CollisionError::UnknownShapeType {
                name: spec.shape_type.clone(),
            });
        };
        ctor(spec)
    }

    /// Construct a complete shape (geometry + profile) from a record
    ///
    /// Channel names mentioned by the record are registered on first
    /// use. Construction failure is fatal for the object being loaded.
    pub fn build_shape(
        &self,
        name: &str,
        spec: &ShapeSpec,
        channels: &mut ChannelRegistry,
    ) -> Result<Shape, CollisionError> {
        let geometry = self.build_geometry(spec)?;
        let profile = spec.build_profile(channels)?;
        let mut shape = Shape::new(name, geometry, profile);
        shape.set_enabled_flag(spec.enabled);
        Ok(shape)
    }
}

impl Default for ShapeTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
