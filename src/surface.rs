//! Port to the native desktop surface.
//!
//! The real shell exposes icons only through an index-based message surface
//! on a window it recreates at will. This trait captures that call surface so
//! the accessor's protocol logic stays independent of any OS binding and can
//! run against in-memory fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Bounds, Point};

/// Opaque handle to a shell window. Only valid until the shell recreates the
/// surface behind it; holders must re-validate with [`DesktopSurface::is_alive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Failure of a single probe against the surface.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe rejected by the surface: {0}")]
    Failed(String),

    #[error("surface handle is no longer valid")]
    Stale,
}

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Raw call surface of the external shell.
///
/// Synchronous methods are cheap window-table lookups; async methods send a
/// message to the shell process and may block on it arbitrarily long. The
/// accessor bounds every async probe with a timeout and treats an elapsed
/// timeout as a busy signal, not a failure of the surface.
#[async_trait]
pub trait DesktopSurface: Send + Sync {
    /// The prerequisite ancestor window, if the shell has created it yet.
    fn shell_root(&self) -> Option<SurfaceId>;

    /// Walk the known hierarchy below `parent` to the icon container.
    fn icon_container(&self, parent: SurfaceId) -> Option<SurfaceId>;

    /// All current top-level windows, for the exhaustive fallback sweep.
    fn top_level_surfaces(&self) -> Vec<SurfaceId>;

    /// Whether `id` still refers to a live window.
    fn is_alive(&self, id: SurfaceId) -> bool;

    /// Whether the shell process itself is running. Distinguishes a busy
    /// surface from a dead one.
    fn shell_running(&self) -> bool;

    /// Number of icons the container currently holds.
    async fn item_count(&self, id: SurfaceId) -> ProbeResult<usize>;

    /// Position of the icon at `index` for this enumeration pass.
    async fn item_position(&self, id: SurfaceId, index: usize) -> ProbeResult<Point>;

    /// Label of the icon at `index`, if the shell will part with it.
    async fn item_text(&self, id: SurfaceId, index: usize) -> ProbeResult<Option<String>>;

    /// Move the icon at `index` to `to`.
    async fn move_item(&self, id: SurfaceId, index: usize, to: Point) -> ProbeResult<()>;

    /// Cheap no-op message used as a responsiveness probe.
    async fn ping(&self, id: SurfaceId) -> ProbeResult<()>;

    /// Client rectangle of the container.
    async fn container_rect(&self, id: SurfaceId) -> ProbeResult<Bounds>;

    /// Pixel dimensions of the primary display, used as a bounds fallback.
    fn display_bounds(&self) -> Option<Bounds>;

    /// Ask the shell to repaint `id`. Best-effort; returns false on refusal.
    fn request_redraw(&self, id: SurfaceId) -> bool;
}
