//! Resilient client for the external desktop icon surface.
//!
//! The shell process that owns the surface answers slowly at the best of
//! times and likes to recreate the icon container right after it has been
//! enumerated. Every probe here is timeout-bounded, discovery is retried
//! with backoff, and enumeration and apply both tolerate isolated per-item
//! failures while refusing to hammer a surface that looks wedged.

mod apply;
mod discovery;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cancel::ArrangeToken;
use crate::error::{AccessError, ArrangeError};
use crate::model::{Bounds, Icon, Point};
use crate::ports::IconSource;
use crate::surface::{DesktopSurface, ProbeError};
use crate::tuning::Tuning;

/// Bounds used when both the container and the display refuse to answer.
const FALLBACK_BOUNDS: Bounds = Bounds::new(1024, 768);

/// Outcome of one timeout-bounded probe.
enum Probe<T> {
    Ok(T),
    /// The surface answered and refused.
    Failed(ProbeError),
    /// The probe timed out. The surface may merely be busy; this feeds the
    /// retry counters rather than failing anything outright.
    Busy,
}

/// Implements [`IconSource`] and [`crate::ports::LayoutSink`] on top of the
/// raw [`DesktopSurface`] port.
///
/// Not designed for overlapping requests against the same surface; callers
/// run one arrangement at a time.
pub struct DesktopClient {
    surface: Arc<dyn DesktopSurface>,
    tuning: Tuning,
}

impl DesktopClient {
    pub fn new(surface: Arc<dyn DesktopSurface>, tuning: Tuning) -> Self {
        Self { surface, tuning }
    }

    /// Run one surface probe under the configured timeout.
    async fn bounded<T, F>(&self, probe: F) -> Probe<T>
    where
        F: Future<Output = Result<T, ProbeError>>,
    {
        match tokio::time::timeout(self.tuning.probe_timeout(), probe).await {
            Ok(Ok(value)) => Probe::Ok(value),
            Ok(Err(err)) => Probe::Failed(err),
            Err(_) => Probe::Busy,
        }
    }
}

#[async_trait]
impl IconSource for DesktopClient {
    async fn icons(&self, token: &ArrangeToken) -> Result<Vec<Icon>, ArrangeError> {
        tracing::debug!("starting icon enumeration");
        token.sleep(self.tuning.settle()).await?;

        let mut handle = self
            .discover(self.tuning.read_discovery(), token)
            .await?
            .ok_or(AccessError::SurfaceNotFound)?;

        // The handle must actually be queryable before we trust it.
        let count = match self.bounded(self.surface.item_count(handle)).await {
            Probe::Ok(count) => count,
            Probe::Failed(err) => {
                tracing::error!(%err, "icon count probe failed");
                return Err(AccessError::SurfaceNotFound.into());
            }
            Probe::Busy => {
                tracing::error!("icon count probe timed out");
                return Err(AccessError::Unresponsive { attempts: 1 }.into());
            }
        };
        tracing::info!(count, "found icons on desktop");
        if count == 0 {
            return Ok(Vec::new());
        }

        let cooldown = self.tuning.refresh_cooldown_items;
        let mut icons = Vec::with_capacity(count);
        let mut consecutive = 0u32;
        // The first refresh needs no cooldown.
        let mut since_refresh = cooldown;
        let mut refresh_suppressed = false;

        for index in 0..count {
            token.checkpoint()?;

            let position = match self.bounded(self.surface.item_position(handle, index)).await {
                Probe::Ok(position) => {
                    consecutive = 0;
                    if refresh_suppressed && since_refresh >= cooldown {
                        tracing::debug!("surface reads recovered; re-arming refresh attempts");
                        refresh_suppressed = false;
                    }
                    Some(position)
                }
                Probe::Failed(err) => {
                    tracing::warn!(index, %err, "position probe failed; using origin fallback");
                    consecutive += 1;
                    None
                }
                Probe::Busy => {
                    tracing::warn!(index, "position probe timed out; using origin fallback");
                    consecutive += 1;
                    None
                }
            };

            if consecutive >= self.tuning.enum_failure_threshold
                && !refresh_suppressed
                && since_refresh >= cooldown
            {
                tracing::warn!(
                    consecutive,
                    index,
                    "consecutive probe failures; refreshing surface handle"
                );
                since_refresh = 0;
                match self.discover(self.tuning.single_discovery(), token).await? {
                    Some(fresh) => {
                        handle = fresh;
                        consecutive = 0;
                        tracing::info!("surface handle refreshed");
                    }
                    None => {
                        // Suppress further refreshes until reads recover,
                        // otherwise every remaining icon would trigger one.
                        refresh_suppressed = true;
                        tracing::warn!("refresh failed; continuing with the stale handle");
                    }
                }
            }

            // Text is never load-bearing; silently degrade to None.
            let text = match self.bounded(self.surface.item_text(handle, index)).await {
                Probe::Ok(text) => text,
                Probe::Failed(_) | Probe::Busy => None,
            };

            icons.push(Icon {
                index,
                position: position.unwrap_or(Point::new(0, 0)),
                text,
            });
            since_refresh += 1;
        }

        tracing::debug!(enumerated = icons.len(), "icon enumeration complete");
        Ok(icons)
    }

    async fn bounds(&self, token: &ArrangeToken) -> Result<Bounds, ArrangeError> {
        if let Some(handle) = self.discover(self.tuning.read_discovery(), token).await? {
            match self.bounded(self.surface.container_rect(handle)).await {
                Probe::Ok(bounds) => {
                    tracing::debug!(%bounds, "desktop bounds from container");
                    return Ok(bounds);
                }
                Probe::Failed(err) => tracing::warn!(%err, "container rect probe failed"),
                Probe::Busy => tracing::warn!("container rect probe timed out"),
            }
        }

        if let Some(bounds) = self.surface.display_bounds() {
            tracing::warn!(%bounds, "falling back to primary display bounds");
            return Ok(bounds);
        }

        tracing::warn!(bounds = %FALLBACK_BOUNDS, "no display bounds available; using conservative default");
        Ok(FALLBACK_BOUNDS)
    }
}
