//! Orchestrates one arrangement request from shape lookup through layout
//! apply. Single pass, no state retained between calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cancel::ArrangeToken;
use crate::error::{ArrangeError, LayoutError};
use crate::model::Icon;
use crate::ports::{IconSource, LayoutSink};
use crate::shape::ShapeRegistry;
use crate::tuning::Tuning;

/// Outcome of a completed arrangement request.
#[derive(Debug, Clone)]
pub struct ArrangeSummary {
    pub shape: String,
    pub icons_arranged: usize,
    pub elapsed: Duration,
    pub request_id: String,
}

pub struct Arranger {
    source: Arc<dyn IconSource>,
    sink: Arc<dyn LayoutSink>,
    registry: Arc<ShapeRegistry>,
    tuning: Tuning,
}

impl Arranger {
    pub fn new(
        source: Arc<dyn IconSource>,
        sink: Arc<dyn LayoutSink>,
        registry: Arc<ShapeRegistry>,
        tuning: Tuning,
    ) -> Self {
        Self {
            source,
            sink,
            registry,
            tuning,
        }
    }

    /// Arrange the desktop icons into the shape registered under `shape_key`.
    ///
    /// Fails fast on a blank key before any I/O. Known error kinds pass
    /// through unchanged; anything unexpected is wrapped with the shape key
    /// and the request's correlation id.
    pub async fn arrange(
        &self,
        shape_key: &str,
        token: &ArrangeToken,
    ) -> Result<ArrangeSummary, ArrangeError> {
        let key = shape_key.trim();
        if key.is_empty() {
            return Err(ArrangeError::InvalidArgument(
                "shape key must not be empty or whitespace".to_string(),
            ));
        }
        token.checkpoint()?;

        let request_id = short_request_id();
        let started = Instant::now();
        tracing::info!(shape = key, request_id = %request_id, "starting icon arrangement");

        match self.run(key, token).await {
            Ok(icons_arranged) => {
                let summary = ArrangeSummary {
                    shape: key.to_string(),
                    icons_arranged,
                    elapsed: started.elapsed(),
                    request_id,
                };
                tracing::info!(
                    shape = %summary.shape,
                    icons = summary.icons_arranged,
                    elapsed_ms = summary.elapsed.as_millis() as u64,
                    request_id = %summary.request_id,
                    "arrangement complete"
                );
                Ok(summary)
            }
            Err(err) => Err(classify(err, key, &request_id)),
        }
    }

    async fn run(&self, key: &str, token: &ArrangeToken) -> Result<usize, ArrangeError> {
        let generator = self.registry.get(key).ok_or_else(|| {
            let available = self.registry.keys();
            tracing::error!(shape = key, ?available, "shape not registered");
            ArrangeError::ShapeNotFound {
                key: key.to_string(),
                available,
            }
        })?;

        let icons = self.source.icons(token).await?;
        if icons.is_empty() {
            tracing::warn!("no icons found on desktop; nothing to arrange");
            return Ok(0);
        }
        tracing::info!(count = icons.len(), "retrieved icons");

        let bounds = self.source.bounds(token).await?;
        tracing::debug!(%bounds, "desktop bounds");

        let layout = generator.generate(icons.len(), bounds).map_err(|err| match err {
            // A generator argument error means the layout cannot exist for
            // this request; surface it as a layout failure with context.
            ArrangeError::InvalidArgument(message) => {
                ArrangeError::from(LayoutError::Generation(message))
            }
            other => other,
        })?;

        if layout.len() != icons.len() {
            tracing::error!(expected = icons.len(), actual = layout.len(), "layout count mismatch");
            return Err(LayoutError::CountMismatch {
                expected: icons.len(),
                actual: layout.len(),
            }
            .into());
        }
        if !bounds.contains_all(&layout) {
            let outside = layout.iter().filter(|p| !bounds.contains(**p)).count();
            tracing::error!(outside, total = layout.len(), "layout points outside desktop bounds");
            return Err(LayoutError::OutOfBounds {
                outside,
                total: layout.len(),
                bounds,
            }
            .into());
        }

        // Re-associate layout points to icon identities by ordinal position.
        let targets: Vec<Icon> = icons
            .iter()
            .zip(layout.iter())
            .map(|(icon, point)| icon.moved_to(*point))
            .collect();

        // Give the shell a moment to settle after enumeration before the
        // apply starts poking it again.
        tracing::debug!("waiting for the shell to stabilize before applying");
        token.sleep(self.tuning.stabilize()).await?;

        self.sink.apply(&targets, token).await?;
        Ok(targets.len())
    }
}

/// Pass known error kinds through untouched; wrap anything else with the
/// request's identity so logs can be correlated.
fn classify(err: ArrangeError, key: &str, request_id: &str) -> ArrangeError {
    match err {
        ArrangeError::Cancelled => {
            tracing::warn!(shape = key, request_id, "arrangement cancelled");
            ArrangeError::Cancelled
        }
        ArrangeError::Other(source) => {
            tracing::error!(shape = key, request_id, "unexpected arrangement failure: {source:#}");
            ArrangeError::Internal {
                shape: key.to_string(),
                request_id: request_id.to_string(),
                source,
            }
        }
        other => {
            tracing::error!(shape = key, request_id, error = %other, "arrangement failed");
            other
        }
    }
}

/// Short correlation id tying together all log lines of one request.
fn short_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
