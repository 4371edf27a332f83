//! Shape generators and their registry.

pub mod phallus;
pub mod registry;

pub use phallus::PhallusShape;
pub use registry::ShapeRegistry;

use crate::error::ArrangeError;
use crate::model::{Bounds, Point};

/// Produces an ordered point layout for `count` icons within `bounds`.
///
/// Contract: on success the result has exactly `count` points and every point
/// satisfies `bounds.contains`, for any `count` at or above the generator's
/// minimum. Generators are free to be non-deterministic as long as that
/// holds on every call.
pub trait ShapeGenerator: Send + Sync {
    /// Registry key. Matched case-insensitively.
    fn key(&self) -> &str;

    /// Generate exactly `count` in-bounds points. Counts below the
    /// generator's minimum fail with an argument error naming the minimum.
    fn generate(&self, count: usize, bounds: Bounds) -> Result<Vec<Point>, ArrangeError>;
}
