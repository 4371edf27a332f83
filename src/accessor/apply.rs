//! Applying a layout to a surface that may drift, hang, or be recreated
//! between enumeration and the last moved icon.

use async_trait::async_trait;

use crate::cancel::ArrangeToken;
use crate::error::{AccessError, ArrangeError, LayoutError};
use crate::model::Icon;
use crate::ports::{IconSource, LayoutSink};
use crate::surface::SurfaceId;

use super::{DesktopClient, Probe};

#[async_trait]
impl LayoutSink for DesktopClient {
    async fn apply(&self, icons: &[Icon], token: &ArrangeToken) -> Result<(), ArrangeError> {
        if icons.is_empty() {
            tracing::info!("no icons to arrange");
            return Ok(());
        }

        tracing::debug!(count = icons.len(), "applying layout");
        token.sleep(self.tuning.apply_settle()).await?;

        let mut handle = self
            .discover(self.tuning.apply_discovery(), token)
            .await?
            .ok_or(AccessError::SurfaceNotFound)?;

        if !self.surface.is_alive(handle) {
            tracing::warn!("discovered handle already stale; rediscovering once");
            handle = self
                .discover(self.tuning.single_discovery(), token)
                .await?
                .ok_or(AccessError::SurfaceNotFound)?;
        }

        self.ensure_responsive(handle, token).await?;
        handle = self.reconcile_count(handle, icons.len(), token).await?;

        // Authoritative bounds check, independent of the orchestrator's
        // pre-check: the desktop may have been resized since generation.
        let bounds = self.bounds(token).await?;
        let outside = icons.iter().filter(|i| !bounds.contains(i.position)).count();
        if outside > 0 {
            tracing::error!(outside, %bounds, "layout targets fall outside current bounds");
            return Err(LayoutError::OutOfBounds {
                outside,
                total: icons.len(),
                bounds,
            }
            .into());
        }

        let placed = self.place_all(handle, icons, token).await?;
        if placed < icons.len() {
            tracing::warn!(placed, requested = icons.len(), "layout applied partially");
        } else {
            tracing::info!(count = placed, "layout applied");
        }

        // Best-effort repaint of the container and its ancestor.
        if !self.surface.request_redraw(handle) {
            tracing::warn!("container redraw request failed");
        }
        if let Some(root) = self.surface.shell_root() {
            if !self.surface.request_redraw(root) {
                tracing::warn!("shell root redraw request failed");
            }
        }

        Ok(())
    }
}

impl DesktopClient {
    /// Probe the surface until it answers, backing off between attempts.
    ///
    /// A timed-out ping means possibly-busy and is retried; a dead shell
    /// process is fatal immediately. Exhausting the budget while the process
    /// is alive reports the surface as hung.
    pub(super) async fn ensure_responsive(
        &self,
        handle: SurfaceId,
        token: &ArrangeToken,
    ) -> Result<(), ArrangeError> {
        let policy = self.tuning.ping_retry();
        for attempt in 0..policy.max_attempts {
            token.checkpoint()?;
            match self.bounded(self.surface.ping(handle)).await {
                Probe::Ok(()) => return Ok(()),
                Probe::Busy => {
                    tracing::debug!(attempt, "responsiveness probe timed out; surface may be busy")
                }
                Probe::Failed(err) => {
                    tracing::debug!(attempt, %err, "responsiveness probe failed")
                }
            }
            if !self.surface.shell_running() {
                tracing::error!("shell process is gone");
                return Err(AccessError::ShellGone.into());
            }
            if let Some(delay) = policy.backoff(attempt) {
                token.sleep(delay).await?;
            }
        }

        tracing::error!(
            attempts = policy.max_attempts,
            "surface still unresponsive; refusing to force the apply"
        );
        Err(AccessError::Unresponsive {
            attempts: policy.max_attempts,
        }
        .into())
    }

    /// Compare the surface's current icon count against the layout.
    ///
    /// Zero is treated as a possibly-transient recreation artifact and gets
    /// one refresh before we proceed best-effort. Non-zero drift beyond the
    /// tolerance aborts; drift within it proceeds with a warning.
    async fn reconcile_count(
        &self,
        handle: SurfaceId,
        expected: usize,
        token: &ArrangeToken,
    ) -> Result<SurfaceId, ArrangeError> {
        let mut handle = handle;
        let mut actual = match self.bounded(self.surface.item_count(handle)).await {
            Probe::Ok(count) => count,
            Probe::Failed(_) | Probe::Busy => 0,
        };

        if actual == 0 {
            tracing::warn!("surface reports zero icons; checking responsiveness");
            self.ensure_responsive(handle, token).await?;
            if let Some(fresh) = self.discover(self.tuning.single_discovery(), token).await? {
                handle = fresh;
                actual = match self.bounded(self.surface.item_count(handle)).await {
                    Probe::Ok(count) => count,
                    Probe::Failed(_) | Probe::Busy => 0,
                };
            }
            if actual == 0 {
                tracing::warn!(expected, "surface still reports zero icons; proceeding best-effort");
                return Ok(handle);
            }
        }

        if actual != expected {
            let drift = actual.abs_diff(expected);
            let tolerance = expected * self.tuning.count_tolerance_percent / 100;
            if drift > tolerance {
                tracing::error!(expected, actual, "icon count drifted beyond tolerance");
                return Err(LayoutError::CountDrift { expected, actual }.into());
            }
            tracing::warn!(expected, actual, "icon count drifted within tolerance; proceeding");
        }

        Ok(handle)
    }

    /// Move every icon, pacing and re-validating periodically. Returns how
    /// many icons were actually placed.
    async fn place_all(
        &self,
        mut handle: SurfaceId,
        icons: &[Icon],
        token: &ArrangeToken,
    ) -> Result<usize, ArrangeError> {
        let mut placed = 0usize;
        let mut consecutive = 0u32;

        for (progress, icon) in icons.iter().enumerate() {
            token.checkpoint()?;

            if progress > 0 && progress % self.tuning.revalidate_every == 0 {
                if !self.surface.is_alive(handle) {
                    tracing::warn!(progress, "surface handle went stale mid-apply; rediscovering");
                    handle = self
                        .discover(self.tuning.single_discovery(), token)
                        .await?
                        .ok_or(AccessError::SurfaceNotFound)?;
                }
                self.ensure_responsive(handle, token).await?;
            }
            if progress > 0 && progress % self.tuning.pace_every == 0 {
                token.sleep(self.tuning.pace_delay()).await?;
            }

            if self.try_place(handle, icon).await {
                placed += 1;
                consecutive = 0;
                continue;
            }
            consecutive += 1;

            if consecutive >= self.tuning.apply_failure_threshold {
                tracing::warn!(
                    consecutive,
                    progress,
                    "consecutive apply failures; refreshing surface handle"
                );
                let retried = match self.discover(self.tuning.single_discovery(), token).await? {
                    Some(fresh) => {
                        handle = fresh;
                        self.try_place(handle, icon).await
                    }
                    None => false,
                };
                if !retried {
                    tracing::error!(placed, requested = icons.len(), "aborting layout apply");
                    return Err(AccessError::Aborted {
                        placed,
                        requested: icons.len(),
                    }
                    .into());
                }
                placed += 1;
                consecutive = 0;
            }
        }

        Ok(placed)
    }

    async fn try_place(&self, handle: SurfaceId, icon: &Icon) -> bool {
        match self
            .bounded(self.surface.move_item(handle, icon.index, icon.position))
            .await
        {
            Probe::Ok(()) => true,
            Probe::Failed(err) => {
                tracing::warn!(index = icon.index, %err, "failed to move icon");
                false
            }
            Probe::Busy => {
                tracing::warn!(index = icon.index, "move probe timed out");
                false
            }
        }
    }
}
