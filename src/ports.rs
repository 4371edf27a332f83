//! Capability contracts the orchestrator consumes.
//!
//! The resilient accessor implements both against the real surface port;
//! tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::cancel::ArrangeToken;
use crate::error::ArrangeError;
use crate::model::{Bounds, Icon};

/// Read capability over the desktop surface.
#[async_trait]
pub trait IconSource: Send + Sync {
    /// Enumerate the icons currently on the desktop, in surface order.
    /// Indices in the result are exactly `0..len` for this pass.
    async fn icons(&self, token: &ArrangeToken) -> Result<Vec<Icon>, ArrangeError>;

    /// Dimensions of the area icons may be placed in. Degrades to fallback
    /// values rather than failing on recoverable errors.
    async fn bounds(&self, token: &ArrangeToken) -> Result<Bounds, ArrangeError>;
}

/// Write capability: reposition icons on the desktop surface.
#[async_trait]
pub trait LayoutSink: Send + Sync {
    /// Apply the given positions. An empty slice is a no-op.
    async fn apply(&self, icons: &[Icon], token: &ArrangeToken) -> Result<(), ArrangeError>;
}
