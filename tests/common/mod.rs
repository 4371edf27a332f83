//! Shared fakes and helpers for the integration suites.

#![allow(dead_code, unused_imports)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use deskshape::cancel::ArrangeToken;
use deskshape::error::ArrangeError;
use deskshape::model::{Bounds, Icon, Point};
use deskshape::ports::{IconSource, LayoutSink};
use deskshape::shape::ShapeGenerator;
use deskshape::tuning::Tuning;

/// Tuning profile with every delay and timeout shrunk so suites run in
/// milliseconds while exercising the same code paths.
pub fn fast_tuning() -> Tuning {
    Tuning {
        settle_ms: 1,
        apply_settle_ms: 1,
        stabilize_ms: 1,
        probe_timeout_ms: 40,
        read_discovery_attempts: 2,
        apply_discovery_attempts: 3,
        discovery_delay_ms: 5,
        ready_budget_ms: 100,
        ready_poll_ms: 5,
        ping_attempts: 2,
        ping_backoff_ms: 5,
        enum_failure_threshold: 2,
        refresh_cooldown_items: 2,
        apply_failure_threshold: 2,
        pace_every: 10,
        pace_delay_ms: 1,
        revalidate_every: 20,
        count_tolerance_percent: 10,
    }
}

pub fn desktop_icons(count: usize) -> Vec<Icon> {
    (0..count)
        .map(|i| {
            Icon::with_text(
                i,
                Point::new(i as i32 * 40 + 10, i as i32 * 30 + 10),
                format!("icon-{i}"),
            )
        })
        .collect()
}

/// Icon source backed by fixed data, counting how often it is asked.
pub struct FakeSource {
    pub icons: Vec<Icon>,
    pub bounds: Bounds,
    pub icon_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(icons: Vec<Icon>, bounds: Bounds) -> Self {
        Self {
            icons,
            bounds,
            icon_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IconSource for FakeSource {
    async fn icons(&self, token: &ArrangeToken) -> Result<Vec<Icon>, ArrangeError> {
        token.checkpoint()?;
        self.icon_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.icons.clone())
    }

    async fn bounds(&self, token: &ArrangeToken) -> Result<Bounds, ArrangeError> {
        token.checkpoint()?;
        Ok(self.bounds)
    }
}

/// Icon source whose enumeration blows up with an unclassified fault.
pub struct ExplodingSource;

#[async_trait]
impl IconSource for ExplodingSource {
    async fn icons(&self, _token: &ArrangeToken) -> Result<Vec<Icon>, ArrangeError> {
        Err(anyhow::anyhow!("surface exploded").into())
    }

    async fn bounds(&self, _token: &ArrangeToken) -> Result<Bounds, ArrangeError> {
        Ok(Bounds::new(1920, 1080))
    }
}

/// Layout sink recording every apply call it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub applied: Mutex<Vec<Vec<Icon>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_count(&self) -> usize {
        self.applied.lock().len()
    }

    pub fn last_applied(&self) -> Option<Vec<Icon>> {
        self.applied.lock().last().cloned()
    }
}

#[async_trait]
impl LayoutSink for RecordingSink {
    async fn apply(&self, icons: &[Icon], token: &ArrangeToken) -> Result<(), ArrangeError> {
        token.checkpoint()?;
        self.applied.lock().push(icons.to_vec());
        Ok(())
    }
}

/// Generator returning a canned layout, whatever the requested count.
pub struct FixedShape {
    pub shape_key: &'static str,
    pub points: Vec<Point>,
}

impl ShapeGenerator for FixedShape {
    fn key(&self) -> &str {
        self.shape_key
    }

    fn generate(&self, _count: usize, _bounds: Bounds) -> Result<Vec<Point>, ArrangeError> {
        Ok(self.points.clone())
    }
}
