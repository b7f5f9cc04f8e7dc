//! Countdown sub-state: one decrement per whole second of host time.

use crate::events::TimeLeft;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running { next_tick: Instant },
    /// Suspended with this much left until the next decrement.
    Paused { until_tick: Duration },
    Expired,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    /// 0 = untimed.
    configured: u32,
    remaining: u32,
    state: TimerState,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Self {
            configured: seconds,
            remaining: seconds,
            state: TimerState::Stopped,
        }
    }

    #[inline]
    pub fn is_untimed(&self) -> bool {
        self.configured == 0
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn time_left(&self) -> TimeLeft {
        if self.is_untimed() {
            TimeLeft::Unlimited
        } else {
            TimeLeft::Seconds(self.remaining)
        }
    }

    /// Begin ticking. Untimed countdowns never start.
    pub fn start(&mut self, now: Instant) {
        if self.is_untimed() || self.state != TimerState::Stopped {
            return;
        }
        self.state = TimerState::Running {
            next_tick: now + TICK,
        };
    }

    /// Stop and restore the configured duration.
    pub fn cancel(&mut self) {
        self.remaining = self.configured;
        self.state = TimerState::Stopped;
    }

    /// Freeze at the current value.
    pub fn stop(&mut self) {
        if let TimerState::Running { .. } | TimerState::Paused { .. } = self.state {
            self.state = TimerState::Stopped;
        }
    }

    /// Suspend a running countdown, keeping the partial second.
    pub fn pause(&mut self, now: Instant) {
        if let TimerState::Running { next_tick } = self.state {
            self.state = TimerState::Paused {
                until_tick: next_tick.saturating_duration_since(now),
            };
        }
    }

    /// Continue a paused countdown from `now`.
    pub fn resume(&mut self, now: Instant) {
        if let TimerState::Paused { until_tick } = self.state {
            self.state = TimerState::Running {
                next_tick: now + until_tick,
            };
        }
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        matches!(self.state, TimerState::Paused { .. })
    }

    /// Apply every whole second elapsed up to `now`. Returns the remaining
    /// seconds after each decrement, oldest first; the last entry is 0 when
    /// the countdown expired during this call.
    pub fn tick(&mut self, now: Instant) -> Vec<u32> {
        let mut changes = Vec::new();
        while let TimerState::Running { next_tick } = self.state {
            if now < next_tick {
                break;
            }
            self.remaining = self.remaining.saturating_sub(1);
            changes.push(self.remaining);
            self.state = if self.remaining == 0 {
                TimerState::Expired
            } else {
                TimerState::Running {
                    next_tick: next_tick + TICK,
                }
            };
        }
        changes
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }
}
