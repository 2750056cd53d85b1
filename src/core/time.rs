//! Frame timing, fixed-rate pacing and loop cancellation

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared stop signal for every engine loop.
///
/// Cloning hands out another reference to the same flag; once cancelled it
/// stays cancelled.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal every holder to stop
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Drift-corrected deadline tracker.
///
/// Deadlines advance by exactly one period per tick instead of being derived
/// from `now()`, so time spent waking up never accumulates.
#[derive(Clone, Debug)]
pub struct Pacer {
    period: Duration,
    next: Instant,
    max_lag_periods: u32,
}

impl Pacer {
    pub fn new(period: Duration, start: Instant) -> Self {
        Self {
            period,
            next: start + period,
            max_lag_periods: 5,
        }
    }

    /// How many whole periods behind schedule the pacer tolerates before it
    /// gives up catching up and re-anchors on the current time
    pub fn with_max_lag(mut self, periods: u32) -> Self {
        self.max_lag_periods = periods.max(1);
        self
    }

    /// Deadline of the tick currently being waited for
    pub fn next_deadline(&self) -> Instant {
        self.next
    }

    /// Finish a tick at `now`. Returns how long to wait before the next one
    /// (zero when running late) and moves the deadline forward one period.
    pub fn advance(&mut self, now: Instant) -> Duration {
        let wait = self.next.saturating_duration_since(now);
        if wait.is_zero() {
            let behind = now - self.next;
            if behind > self.period * self.max_lag_periods {
                log::warn!(
                    "Loop fell {:.1} ms behind schedule, resynchronising",
                    behind.as_secs_f64() * 1000.0
                );
                self.next = now;
            }
        }
        self.next += self.period;
        wait
    }
}

/// A single invocation of a fixed-rate task
#[derive(Clone, Copy, Debug)]
pub struct Tick {
    /// Zero-based tick counter
    pub index: u64,
    /// Fixed step in seconds
    pub delta: f32,
}

/// Fixed-period loop driver shared by the simulation and drain loops.
#[derive(Clone, Debug)]
pub struct FixedRateLoop {
    name: &'static str,
    period: Duration,
    max_lag_periods: u32,
}

impl FixedRateLoop {
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period,
            max_lag_periods: 5,
        }
    }

    /// Create a loop ticking `hz` times per second
    pub fn from_hz(name: &'static str, hz: f64) -> Self {
        Self::new(name, Duration::from_secs_f64(1.0 / hz))
    }

    pub fn with_max_lag(mut self, periods: u32) -> Self {
        self.max_lag_periods = periods;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run `task` once per period until `token` is cancelled.
    ///
    /// The token is checked before every tick; the only blocking call is the
    /// pacing sleep, which never exceeds one period. Returns the number of
    /// ticks executed.
    pub fn run<F: FnMut(Tick)>(&self, token: &CancellationToken, mut task: F) -> u64 {
        log::debug!("{} loop started ({:?} period)", self.name, self.period);

        let mut pacer = Pacer::new(self.period, Instant::now()).with_max_lag(self.max_lag_periods);
        let delta = self.period.as_secs_f32();
        let mut index = 0u64;

        while !token.is_cancelled() {
            task(Tick { index, delta });
            index += 1;

            let wait = pacer.advance(Instant::now());
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
        }

        log::debug!("{} loop stopped after {} ticks", self.name, index);
        index
    }
}

/// Tracks frame timing and calculates FPS for the free-running render loop
pub struct FrameTimer {
    frame_count: u64,
    fps_timer: Instant,
    fps: f32,
    fps_frame_count: u32,
}

impl FrameTimer {
    /// Create a new frame timer
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            frame_count: 0,
            fps_timer: now,
            fps: 0.0,
            fps_frame_count: 0,
        }
    }

    /// Call once per frame to update timing
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.frame_count += 1;
        self.fps_frame_count += 1;

        // Update FPS every second
        let fps_elapsed = now - self.fps_timer;
        if fps_elapsed >= Duration::from_secs(1) {
            self.fps = self.fps_frame_count as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = 0;
            self.fps_timer = now;
        }
    }

    /// Get current FPS (updated every second)
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Average milliseconds per frame derived from the current FPS
    pub fn frame_time_ms(&self) -> f32 {
        if self.fps > 0.0 { 1000.0 / self.fps } else { 0.0 }
    }

    /// Get total frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
