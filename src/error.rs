//! Error taxonomy for arrangement requests.
//!
//! External-surface failures and layout validation failures are kept as
//! separate sub-enums so callers can match on the class of failure without
//! string inspection. Cancellation is a first-class variant and is never
//! reclassified by any layer.

use thiserror::Error;

use crate::model::Bounds;

/// The external desktop surface could not be used.
///
/// Internal retry/backoff has already been attempted before any of these
/// surface; callers may retry the whole request after a delay.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Discovery exhausted its retry budget without finding the icon surface.
    #[error("could not find the desktop icon surface")]
    SurfaceNotFound,

    /// The surface stopped answering probes but the shell process is still
    /// alive as far as we can tell.
    #[error("desktop surface unresponsive after {attempts} probe attempts")]
    Unresponsive { attempts: u32 },

    /// The shell process is confirmed gone.
    #[error("desktop shell process is not running")]
    ShellGone,

    /// The per-item apply loop hit its consecutive-failure threshold and a
    /// refresh did not help. Carries how far we got.
    #[error("gave up applying layout after placing {placed} of {requested} icons")]
    Aborted { placed: usize, requested: usize },
}

/// A layout failed generation or authoritative validation.
///
/// Never retried automatically; the caller may retry the whole request.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout generation failed: {0}")]
    Generation(String),

    #[error("layout has {actual} points but {expected} icons are present")]
    CountMismatch { expected: usize, actual: usize },

    #[error("{outside} of {total} layout points fall outside desktop bounds {bounds}")]
    OutOfBounds {
        outside: usize,
        total: usize,
        bounds: Bounds,
    },

    /// The desktop icon count changed between enumeration and apply by more
    /// than the configured tolerance.
    #[error("desktop icon count drifted: layout has {expected}, surface reports {actual}")]
    CountDrift { expected: usize, actual: usize },
}

/// Top-level error for one arrangement request.
#[derive(Debug, Error)]
pub enum ArrangeError {
    /// Invalid caller input. Fast-fail, never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("shape '{key}' is not registered (available: {known})", known = .available.join(", "))]
    ShapeNotFound { key: String, available: Vec<String> },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Access(#[from] AccessError),

    /// Catch-all for unexpected faults, tagged with the per-request
    /// correlation id. The original fault is retained as the source.
    #[error("arrangement for shape '{shape}' failed (request {request_id})")]
    Internal {
        shape: String,
        request_id: String,
        #[source]
        source: anyhow::Error,
    },

    /// An unclassified fault that has not yet passed through the
    /// orchestrator's wrapping step.
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    #[error("arrangement cancelled")]
    Cancelled,
}

impl ArrangeError {
    /// Process exit code for the console harness.
    pub fn exit_code(&self) -> u8 {
        match self {
            ArrangeError::InvalidArgument(_) => 2,
            _ => 1,
        }
    }
}
