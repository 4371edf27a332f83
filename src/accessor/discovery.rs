//! Locating the icon container on a shell that may still be starting up,
//! mid-recreation, or laid out with an unexpected window hierarchy.

use std::time::Instant;

use crate::cancel::ArrangeToken;
use crate::error::ArrangeError;
use crate::retry::RetryPolicy;
use crate::surface::SurfaceId;

use super::{DesktopClient, Probe};

impl DesktopClient {
    /// Locate the icon container, retrying up to the policy's budget.
    ///
    /// Exhausting the budget yields `Ok(None)`; only cancellation errors.
    pub(super) async fn discover(
        &self,
        policy: RetryPolicy,
        token: &ArrangeToken,
    ) -> Result<Option<SurfaceId>, ArrangeError> {
        self.await_shell_ready(token).await?;

        for attempt in 0..policy.max_attempts {
            token.checkpoint()?;
            if let Some(id) = self.locate(token).await? {
                if attempt > 0 {
                    tracing::debug!(attempt, "icon surface discovered after retry");
                }
                return Ok(Some(id));
            }
            match policy.backoff(attempt) {
                Some(delay) => token.sleep(delay).await?,
                None => break,
            }
        }

        tracing::warn!(
            attempts = policy.max_attempts,
            "desktop icon surface not found"
        );
        Ok(None)
    }

    /// Bounded wait for the shell root to exist before the first attempt.
    /// Running out of budget is not fatal; discovery proper will retry.
    async fn await_shell_ready(&self, token: &ArrangeToken) -> Result<(), ArrangeError> {
        let budget = self.tuning.ready_budget();
        let started = Instant::now();
        while self.surface.shell_root().is_none() {
            if started.elapsed() >= budget {
                tracing::warn!("shell root did not appear within the readiness budget");
                return Ok(());
            }
            token.sleep(self.tuning.ready_poll()).await?;
        }
        Ok(())
    }

    /// One discovery pass: the known hierarchy walk first, then an
    /// exhaustive sweep over top-level windows. Sweep candidates must own a
    /// container that answers a liveness ping before they are accepted.
    async fn locate(&self, token: &ArrangeToken) -> Result<Option<SurfaceId>, ArrangeError> {
        if let Some(root) = self.surface.shell_root() {
            if let Some(container) = self.surface.icon_container(root) {
                tracing::debug!(?container, "icon container found via shell hierarchy");
                return Ok(Some(container));
            }
        }

        tracing::debug!("shell hierarchy absent; sweeping top-level surfaces");
        for candidate in self.surface.top_level_surfaces() {
            token.checkpoint()?;
            let Some(container) = self.surface.icon_container(candidate) else {
                continue;
            };
            if matches!(self.bounded(self.surface.ping(container)).await, Probe::Ok(())) {
                tracing::debug!(?candidate, ?container, "icon container found via sweep");
                return Ok(Some(container));
            }
        }
        Ok(None)
    }
}
