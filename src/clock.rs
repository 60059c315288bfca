// Per-round stopwatch that paints a countdown. Knows nothing about the game.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::scoring::ScoringPolicy;
use crate::{DEFAULT_COUNTDOWN_MS, DEFAULT_FRAME_INTERVAL_MS, REDUCED_MOTION_STEP_MS};

/// Monotonic time source in milliseconds
pub trait MonotonicClock {
    fn now_ms(&self) -> u64;
}

/// Wall-clock-independent time from `std::time::Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self { origin: Instant::now() }
    }
}

impl MonotonicClock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Handle of a scheduled tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

/// Host-side timer (frame callback, interval, event loop)
/// The host calls `RoundClock::on_tick` with the handle when the delay fires
pub trait FrameScheduler {
    fn schedule(&mut self, delay_ms: u32) -> TickHandle;
    fn cancel(&mut self, handle: TickHandle);
}

/// Colour bucket of the countdown, matching the scoring tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerTone {
    /// Before the round starts
    Idle,
    Fast,
    Steady,
    Slow,
    Overtime,
}

impl TimerTone {
    /// Bucket for `elapsed_ms`: first tier → Fast, second → Steady, any later
    /// tier → Slow, past every tier → Overtime
    pub fn classify(policy: &ScoringPolicy, elapsed_ms: u32) -> Self {
        match policy.tier_index(elapsed_ms) {
            Some(0) => TimerTone::Fast,
            Some(1) => TimerTone::Steady,
            Some(_) => TimerTone::Slow,
            None => TimerTone::Overtime,
        }
    }
}

/// What the presentation surface draws on each tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFrame {
    /// Remaining seconds with one decimal, e.g. "3.5"
    pub label: String,
    pub tone: TimerTone,
    pub remaining_ms: u32,
}

pub trait TimerDisplay {
    fn paint(&mut self, frame: TimerFrame);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    pub countdown_ms: u32,
    pub frame_interval_ms: u32,
    pub reduced_motion: bool,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            countdown_ms: DEFAULT_COUNTDOWN_MS,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            reduced_motion: false,
        }
    }
}

fn format_seconds(ms: u32) -> String {
    format!("{}.{}", ms / 1000, (ms % 1000) / 100)
}

pub struct RoundClock<C, S, D> {
    clock: C,
    scheduler: S,
    display: D,
    settings: ClockSettings,
    policy: ScoringPolicy,
    started_at: Option<u64>,
    pending: Option<TickHandle>,
}

impl<C, S, D> RoundClock<C, S, D>
where
    C: MonotonicClock,
    S: FrameScheduler,
    D: TimerDisplay,
{
    pub fn new(clock: C, scheduler: S, display: D, settings: ClockSettings, policy: ScoringPolicy) -> Self {
        Self {
            clock,
            scheduler,
            display,
            settings,
            policy,
            started_at: None,
            pending: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn set_reduced_motion(&mut self, reduced_motion: bool) {
        self.settings.reduced_motion = reduced_motion;
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Start timing a round. Any loop from a previous round is cancelled first
    pub fn start(&mut self) {
        self.cancel_pending();
        self.started_at = Some(self.clock.now_ms());
        self.paint_running(0);
        self.schedule_next();
    }

    /// Called by the host when a scheduled tick fires
    /// Ticks from a cancelled loop are ignored
    pub fn on_tick(&mut self, handle: TickHandle) {
        if self.pending != Some(handle) {
            log::trace!("[CLOCK] stale tick {:?} ignored", handle);
            return;
        }
        self.pending = None;
        let Some(started_at) = self.started_at else {
            return;
        };
        let elapsed = self.clock.now_ms().saturating_sub(started_at);
        self.paint_running(elapsed);
        self.schedule_next();
    }

    /// Stop timing and return the elapsed milliseconds
    /// Returns 0 when the clock was not running
    pub fn stop(&mut self) -> u32 {
        self.cancel_pending();
        match self.started_at.take() {
            Some(started_at) => {
                let elapsed = self.clock.now_ms().saturating_sub(started_at);
                u32::try_from(elapsed).unwrap_or(u32::MAX)
            }
            None => 0,
        }
    }

    /// Back to the neutral pre-start display
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.started_at = None;
        self.display.paint(TimerFrame {
            label: format_seconds(self.settings.countdown_ms),
            tone: TimerTone::Idle,
            remaining_ms: self.settings.countdown_ms,
        });
    }

    /// The frame for `elapsed_ms` into a round
    pub fn frame_at(&self, elapsed_ms: u64) -> TimerFrame {
        let elapsed = u32::try_from(elapsed_ms).unwrap_or(u32::MAX);
        let shown = if self.settings.reduced_motion {
            elapsed - elapsed % REDUCED_MOTION_STEP_MS
        } else {
            elapsed
        };
        let remaining_ms = self.settings.countdown_ms.saturating_sub(shown);
        TimerFrame {
            label: format_seconds(remaining_ms),
            tone: TimerTone::classify(&self.policy, shown),
            remaining_ms,
        }
    }

    fn paint_running(&mut self, elapsed_ms: u64) {
        let frame = self.frame_at(elapsed_ms);
        self.display.paint(frame);
    }

    fn tick_interval(&self) -> u32 {
        if self.settings.reduced_motion {
            REDUCED_MOTION_STEP_MS
        } else {
            self.settings.frame_interval_ms.max(1)
        }
    }

    fn schedule_next(&mut self) {
        self.cancel_pending();
        let delay = self.tick_interval();
        self.pending = Some(self.scheduler.schedule(delay));
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }
}
