// File: crates/plot-core/src/scheduler.rs
// Summary: Paint request bookkeeping: pause nesting, throttled coalescing and paint state.
// Notes:
// - Time is passed in by the caller (`Instant`), the scheduler never sleeps or
//   spawns timers. The host calls `PlotView::tick` from its event loop.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    /// A paint is requested and may run at `deadline`.
    Pending { deadline: Instant },
    Painting,
}

#[derive(Debug)]
pub struct RenderScheduler {
    state: SchedulerState,
    pause_count: u32,
    throttle: Duration,
    last_paint: Option<Instant>,
    requested_during_paint: bool,
    paints: u64,
}

impl RenderScheduler {
    pub fn new(throttle: Duration) -> Self {
        Self {
            state: SchedulerState::Idle,
            pause_count: 0,
            throttle,
            last_paint: None,
            requested_during_paint: false,
            paints: 0,
        }
    }

    pub fn state(&self) -> SchedulerState { self.state }
    pub fn is_paused(&self) -> bool { self.pause_count > 0 }
    pub fn paint_count(&self) -> u64 { self.paints }

    pub fn pause(&mut self) {
        self.pause_count += 1;
    }

    /// Leaving the outermost pause always requests one paint.
    pub fn unpause(&mut self, now: Instant) {
        match self.pause_count {
            0 => {}
            1 => {
                self.pause_count = 0;
                self.request(now);
            }
            _ => self.pause_count -= 1,
        }
    }

    /// Coalescing request: an already pending paint keeps its deadline.
    pub fn request(&mut self, now: Instant) {
        match self.state {
            SchedulerState::Pending { .. } => {}
            SchedulerState::Painting => self.requested_during_paint = true,
            SchedulerState::Idle => {
                let earliest = self.last_paint.map_or(now, |t| t + self.throttle);
                self.state = SchedulerState::Pending { deadline: earliest.max(now) };
            }
        }
    }

    /// Whether a pending paint may run now.
    pub fn due(&self, now: Instant) -> bool {
        match self.state {
            SchedulerState::Pending { deadline } => !self.is_paused() && now >= deadline,
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SchedulerState::Pending { .. })
    }

    pub fn begin(&mut self) {
        self.state = SchedulerState::Painting;
    }

    /// End a paint pass; requests made while painting re-arm a pending paint.
    pub fn finish(&mut self, now: Instant) {
        self.paints += 1;
        self.last_paint = Some(now);
        self.state = SchedulerState::Idle;
        if std::mem::take(&mut self.requested_during_paint) {
            self.request(now);
        }
    }
}
