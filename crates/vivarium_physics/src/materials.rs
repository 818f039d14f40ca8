//! # Material Table
//!
//! Named surface and bulk properties. The built-in entries cover the common
//! prop materials; configuration may override or extend them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, PhysicsResult};

/// Name of the entry used when a request names no material.
pub const DEFAULT_MATERIAL: &str = "default";

/// Bulk and surface properties of a material.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Density in kg/m³.
    pub density: f32,
    /// Coulomb friction coefficient.
    pub friction: f32,
    /// Bounciness in `[0, 1]`.
    pub restitution: f32,
}

impl Material {
    /// Creates a material.
    #[must_use]
    pub const fn new(density: f32, friction: f32, restitution: f32) -> Self {
        Self { density, friction, restitution }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(1000.0, 0.5, 0.3)
    }
}

/// Built-in materials: `(name, density, friction, restitution)`.
const BUILTIN: [(&str, f32, f32, f32); 8] = [
    (DEFAULT_MATERIAL, 1000.0, 0.5, 0.3),
    ("wood", 700.0, 0.6, 0.3),
    ("stone", 2400.0, 0.8, 0.1),
    ("metal", 7850.0, 0.4, 0.2),
    ("rubber", 1100.0, 0.9, 0.8),
    ("ice", 917.0, 0.05, 0.05),
    ("glass", 2500.0, 0.4, 0.2),
    ("plastic", 950.0, 0.5, 0.4),
];

/// Name → [`Material`] lookup.
#[derive(Clone, Debug)]
pub struct MaterialTable {
    entries: HashMap<String, Material>,
}

impl MaterialTable {
    /// Table holding only the built-in materials.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|&(name, density, friction, restitution)| {
                (name.to_owned(), Material::new(density, friction, restitution))
            })
            .collect();
        Self { entries }
    }

    /// Adds or replaces a material.
    pub fn insert(&mut self, name: impl Into<String>, material: Material) {
        self.entries.insert(name.into(), material);
    }

    /// Looks up a material by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Material> {
        self.entries.get(name).copied()
    }

    /// Resolves an optional name, falling back to [`DEFAULT_MATERIAL`].
    ///
    /// # Errors
    ///
    /// [`PhysicsError::UnknownMaterial`] if the name is not in the table.
    pub fn resolve(&self, name: Option<&str>) -> PhysicsResult<Material> {
        let name = name.unwrap_or(DEFAULT_MATERIAL);
        match self.get(name) {
            Some(material) => Ok(material),
            None if name == DEFAULT_MATERIAL => Ok(Material::default()),
            None => Err(PhysicsError::UnknownMaterial(name.to_owned())),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::builtin()
    }
}
