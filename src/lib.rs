//! Repositions desktop icons into generated shapes, over a shell surface
//! that is assumed to be slow, unreliable, and fond of recreating its
//! windows mid-operation.
//!
//! The crate is organized around two ports: [`surface::DesktopSurface`] is
//! the raw native call surface (bound to [`sim::SimDesktop`] in this repo),
//! and [`ports::IconSource`]/[`ports::LayoutSink`] are the capabilities the
//! orchestrator consumes, implemented by [`accessor::DesktopClient`].

pub mod accessor;
pub mod arrange;
pub mod cancel;
pub mod error;
pub mod model;
pub mod ports;
pub mod retry;
pub mod shape;
pub mod sim;
pub mod surface;
pub mod tuning;

pub use accessor::DesktopClient;
pub use arrange::{ArrangeSummary, Arranger};
pub use cancel::ArrangeToken;
pub use error::{AccessError, ArrangeError, LayoutError};
pub use model::{Bounds, Icon, Point};
pub use shape::{PhallusShape, ShapeGenerator, ShapeRegistry};
pub use tuning::Tuning;
