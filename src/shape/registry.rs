//! Case-insensitive shape lookup table.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ArrangeError;

use super::ShapeGenerator;

/// Thread-safe registry mapping shape keys to generators.
///
/// Keys are matched case-insensitively. Registration is first-writer-wins:
/// a concurrent duplicate registration fails for exactly one caller.
pub struct ShapeRegistry {
    shapes: RwLock<HashMap<String, Arc<dyn ShapeGenerator>>>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self {
            shapes: RwLock::new(HashMap::new()),
        }
    }

    /// Register a generator under its key. Fails on a blank key or when the
    /// key (case-insensitive) is already taken; never overwrites.
    pub fn register(&self, generator: Arc<dyn ShapeGenerator>) -> Result<(), ArrangeError> {
        let key = generator.key().trim().to_string();
        if key.is_empty() {
            return Err(ArrangeError::InvalidArgument(
                "shape key must not be empty or whitespace".to_string(),
            ));
        }

        let mut shapes = self.shapes.write();
        match shapes.entry(key.to_lowercase()) {
            Entry::Occupied(_) => Err(ArrangeError::InvalidArgument(format!(
                "a shape with key '{key}' is already registered"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(generator);
                Ok(())
            }
        }
    }

    /// Look up a generator. Blank and unknown keys yield `None`, never an
    /// error.
    pub fn get(&self, key: &str) -> Option<Arc<dyn ShapeGenerator>> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        self.shapes.read().get(&key.to_lowercase()).cloned()
    }

    /// All registered keys in their original casing. Order not significant.
    pub fn keys(&self) -> Vec<String> {
        self.shapes
            .read()
            .values()
            .map(|g| g.key().to_string())
            .collect()
    }
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
