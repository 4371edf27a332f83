//! In-memory desktop surface used by the console harness and the accessor
//! integration tests.
//!
//! The fault knobs reproduce the shell behaviors the accessor is built to
//! survive: slow starts, hung message pumps, container recreation
//! mid-operation, and counts that drift under our feet.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::model::{Bounds, Icon, Point};
use crate::surface::{DesktopSurface, ProbeError, ProbeResult, SurfaceId};

const ROOT: SurfaceId = SurfaceId(1);
const WORKER: SurfaceId = SurfaceId(2);
const DECOY: SurfaceId = SurfaceId(9);

/// Fault injection knobs for [`SimDesktop`].
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Fail every Nth item probe (positions and moves share the counter).
    pub fail_every: Option<usize>,
    /// Every ping hangs past any timeout.
    pub hang_pings: bool,
    /// Hide the shell root for the first N lookups, simulating a shell that
    /// is still starting up.
    pub root_appears_after: usize,
    /// Nothing is discoverable at all: no root, no container, only decoy
    /// top-level windows.
    pub hide_root: bool,
    /// Drop the root-to-container hierarchy so discovery must fall back to
    /// the top-level sweep (the container hangs off a worker window).
    pub orphan_container: bool,
    /// Recreate the container, invalidating old handles, after N successful
    /// position probes.
    pub recreate_after_reads: Option<usize>,
    /// Recreate the container after N successful moves.
    pub recreate_after_moves: Option<usize>,
    /// Force `item_count` to report this value regardless of actual icons.
    pub reported_count: Option<usize>,
    /// Liveness checks report the shell process as gone. Window handles may
    /// linger, which is exactly the ambiguity the accessor has to resolve.
    pub process_dead: bool,
    /// Fail container rectangle probes.
    pub fail_rect: bool,
    /// Report no display bounds.
    pub no_display: bool,
}

struct SimState {
    icons: Vec<Icon>,
    generation: u64,
    root_lookups: usize,
    item_probes: usize,
    reads_done: usize,
    moves_done: usize,
    recreated_on_read: bool,
    recreated_on_move: bool,
}

/// Simulated desktop: an icon table behind the same window-discovery and
/// message-probe surface the real shell exposes.
pub struct SimDesktop {
    state: Mutex<SimState>,
    faults: Faults,
    bounds: Bounds,
}

impl SimDesktop {
    pub fn new(icon_count: usize, bounds: Bounds, faults: Faults) -> Self {
        let icons = (0..icon_count)
            .map(|i| {
                let x = (i % 8) as i32 * 120 + 16;
                let y = (i / 8) as i32 * 90 + 16;
                Icon::with_text(i, Point::new(x, y), format!("icon-{i}"))
            })
            .collect();
        Self {
            state: Mutex::new(SimState {
                icons,
                generation: 0,
                root_lookups: 0,
                item_probes: 0,
                reads_done: 0,
                moves_done: 0,
                recreated_on_read: false,
                recreated_on_move: false,
            }),
            faults,
            bounds,
        }
    }

    /// Current icon positions, in index order.
    pub fn positions(&self) -> Vec<Point> {
        self.state.lock().icons.iter().map(|i| i.position).collect()
    }

    /// How many moves the surface has accepted.
    pub fn moves_done(&self) -> usize {
        self.state.lock().moves_done
    }

    fn container(&self, generation: u64) -> SurfaceId {
        SurfaceId(100 + generation)
    }

    /// Shared failure schedule for position and move probes.
    fn item_probe_gate(&self, state: &mut SimState) -> ProbeResult<()> {
        state.item_probes += 1;
        if let Some(n) = self.faults.fail_every {
            if n > 0 && state.item_probes % n == 0 {
                return Err(ProbeError::Failed("injected item probe failure".to_string()));
            }
        }
        Ok(())
    }

    fn check_alive(&self, state: &SimState, id: SurfaceId) -> ProbeResult<()> {
        if id != self.container(state.generation) {
            return Err(ProbeError::Stale);
        }
        Ok(())
    }
}

#[async_trait]
impl DesktopSurface for SimDesktop {
    fn shell_root(&self) -> Option<SurfaceId> {
        if self.faults.hide_root {
            return None;
        }
        let mut state = self.state.lock();
        state.root_lookups += 1;
        if state.root_lookups <= self.faults.root_appears_after {
            return None;
        }
        Some(ROOT)
    }

    fn icon_container(&self, parent: SurfaceId) -> Option<SurfaceId> {
        if self.faults.hide_root {
            return None;
        }
        let state = self.state.lock();
        match parent {
            ROOT if !self.faults.orphan_container => Some(self.container(state.generation)),
            WORKER if self.faults.orphan_container => Some(self.container(state.generation)),
            _ => None,
        }
    }

    fn top_level_surfaces(&self) -> Vec<SurfaceId> {
        if self.faults.hide_root {
            vec![DECOY]
        } else {
            vec![DECOY, WORKER, ROOT]
        }
    }

    fn is_alive(&self, id: SurfaceId) -> bool {
        let state = self.state.lock();
        id == self.container(state.generation)
    }

    fn shell_running(&self) -> bool {
        !self.faults.process_dead
    }

    async fn item_count(&self, id: SurfaceId) -> ProbeResult<usize> {
        let state = self.state.lock();
        self.check_alive(&state, id)?;
        Ok(self.faults.reported_count.unwrap_or(state.icons.len()))
    }

    async fn item_position(&self, id: SurfaceId, index: usize) -> ProbeResult<Point> {
        let mut state = self.state.lock();
        self.check_alive(&state, id)?;
        self.item_probe_gate(&mut state)?;

        let position = state
            .icons
            .get(index)
            .map(|icon| icon.position)
            .ok_or_else(|| ProbeError::Failed(format!("no item at index {index}")))?;

        state.reads_done += 1;
        if let Some(n) = self.faults.recreate_after_reads {
            if state.reads_done >= n && !state.recreated_on_read {
                state.recreated_on_read = true;
                state.generation += 1;
            }
        }
        Ok(position)
    }

    async fn item_text(&self, id: SurfaceId, index: usize) -> ProbeResult<Option<String>> {
        let state = self.state.lock();
        self.check_alive(&state, id)?;
        Ok(state.icons.get(index).and_then(|icon| icon.text.clone()))
    }

    async fn move_item(&self, id: SurfaceId, index: usize, to: Point) -> ProbeResult<()> {
        let mut state = self.state.lock();
        self.check_alive(&state, id)?;
        self.item_probe_gate(&mut state)?;

        match state.icons.get_mut(index) {
            Some(icon) => icon.position = to,
            None => return Err(ProbeError::Failed(format!("no item at index {index}"))),
        }

        state.moves_done += 1;
        if let Some(n) = self.faults.recreate_after_moves {
            if state.moves_done >= n && !state.recreated_on_move {
                state.recreated_on_move = true;
                state.generation += 1;
            }
        }
        Ok(())
    }

    async fn ping(&self, id: SurfaceId) -> ProbeResult<()> {
        if self.faults.hang_pings {
            std::future::pending::<()>().await;
        }
        let state = self.state.lock();
        self.check_alive(&state, id)
    }

    async fn container_rect(&self, id: SurfaceId) -> ProbeResult<Bounds> {
        let state = self.state.lock();
        self.check_alive(&state, id)?;
        if self.faults.fail_rect {
            return Err(ProbeError::Failed("injected rect failure".to_string()));
        }
        Ok(self.bounds)
    }

    fn display_bounds(&self) -> Option<Bounds> {
        if self.faults.no_display {
            None
        } else {
            Some(self.bounds)
        }
    }

    fn request_redraw(&self, _id: SurfaceId) -> bool {
        !self.faults.hide_root
    }
}
