//! Fixed-timestep tick loop for Cryptwalk.
//!
//! The whole simulation is single-threaded and cooperative: one loop fires a
//! tick at a fixed rate, and everything that "waits" (a spawn delay, a
//! despawn animation) is a [`Continuation`](Continuations) scheduled for a
//! later tick rather than a suspended task. Nothing ever blocks the loop.
//!
//! - [`TickScheduler`] paces the loop in real time (tokio timers).
//! - [`Continuations`] holds deferred work keyed by the tick it's due on.
//!
//! # Event-driven mode
//!
//! When `tick_rate_hz` is 0, [`TickScheduler::wait_for_tick`] pends forever.
//! Tests and headless harnesses drive ticks by hand instead.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = input_rx.recv() => { /* forward to the engine */ }
//!         info = scheduler.wait_for_tick() => {
//!             game.tick(info.tick)?;
//!         }
//!     }
//! }
//! ```

mod continuations;

pub use continuations::Continuations;

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Tick rate in Hz. 0 = event-driven (tick never fires on its own).
    pub tick_rate_hz: u32,
    /// Random jitter (0–max µs) added to the *first* tick only.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 0,
            initial_jitter_us: 0,
        }
    }
}

impl TickConfig {
    /// Maximum supported tick rate.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values. Called by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick_rate_hz exceeds maximum, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self
    }

    /// Duration of one tick, or `None` in event-driven mode.
    pub fn tick_duration(&self) -> Option<Duration> {
        if self.tick_rate_hz == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64))
        }
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// What [`TickScheduler::wait_for_tick`] hands back for each tick.
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number, starting at 1.
    pub tick: u64,
    /// Fixed simulation step. Use this, not wall-clock time.
    pub dt: Duration,
    /// Ticks skipped because the loop fell behind (0 normally).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-timestep scheduler driving the simulation loop.
///
/// When the loop falls behind by more than a whole tick, missed ticks are
/// skipped and the cadence restarts from "now". Catching up would run
/// transition steps in a burst with no frames between them.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Option<Duration>,
    tick_count: u64,
    next_tick: Option<Instant>,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let next_tick = tick_duration.map(|d| {
            let jitter = if config.initial_jitter_us > 0 {
                Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
            } else {
                Duration::ZERO
            };
            Instant::now() + d + jitter
        });

        match tick_duration {
            None => debug!("tick scheduler created in event-driven mode"),
            Some(d) => debug!(
                rate_hz = config.tick_rate_hz,
                step_ms = d.as_secs_f64() * 1000.0,
                "tick scheduler created"
            ),
        }

        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick,
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits until the next tick is due.
    ///
    /// Pends forever in event-driven mode, so it is safe to use as one
    /// branch of a `tokio::select!`.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, step) = match (self.next_tick, self.tick_duration) {
            (Some(next), Some(step)) => (next, step),
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(next);
        let ticks_skipped = (late_by.as_nanos() / step.as_nanos()) as u64;
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick loop fell behind, skipping ahead"
            );
        }
        self.next_tick = Some(now + step);

        trace!(tick = self.tick_count, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: step,
            ticks_skipped,
        }
    }

    pub fn is_event_driven(&self) -> bool {
        self.tick_duration.is_none()
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }
}
