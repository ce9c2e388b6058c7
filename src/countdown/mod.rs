//! Live countdown for an issued code.
//!
//! A sequence starts with `ACTIVE(seconds_remaining)` for the freshly issued
//! code, re-renders on a fixed tick, and ends with exactly one `EXPIRED`
//! state once the code's window has rolled over. Every state is handed to a
//! [`DisplaySink`] once.
//!
//! The sequence is bounded: it never runs more than
//! `ceil(period / interval)` ticks, even if the clock stops moving.

pub mod render;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    cancel::CancelSignal,
    clock::Clock,
    sink::{DisplaySink, SinkError},
    totp::{IssuedCode, Totp, MAX_PERIOD},
    OtpCode,
};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(3);

/// One frame of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub code: OtpCode,
    /// In `0..=period`, always 0 once expired.
    pub seconds_remaining: u64,
    pub is_expired: bool,
    pub period: u64,
}

impl RenderState {
    pub fn active(code: OtpCode, seconds_remaining: u64, period: u64) -> Self {
        Self {
            code,
            seconds_remaining,
            is_expired: false,
            period,
        }
    }

    pub fn expired(code: OtpCode, period: u64) -> Self {
        Self {
            code,
            seconds_remaining: 0,
            is_expired: true,
            period,
        }
    }

    pub fn to_text(&self) -> String {
        render::render(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownOutcome {
    /// The terminal state was displayed.
    Expired { ticks: u32 },
    /// The sink failed; nothing was displayed after the failing state.
    Aborted { ticks: u32, error: SinkError },
    Cancelled { ticks: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    period: u64,
    interval: Duration,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(crate::totp::DEFAULT_PERIOD, DEFAULT_TICK_INTERVAL)
    }
}

impl Countdown {
    /// `period` is clamped to `1..=MAX_PERIOD`. `interval` is rounded down to
    /// whole seconds, with a floor of one second.
    pub fn new(period: u64, interval: Duration) -> Self {
        Self {
            period: period.clamp(1, MAX_PERIOD),
            interval: Duration::from_secs(interval.as_secs().max(1)),
        }
    }

    pub fn for_totp(totp: &Totp, interval: Duration) -> Self {
        Self::new(totp.period(), interval)
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// A tick can never show more than `period - interval` seconds for the
    /// code it started with. Anything above this threshold means a new
    /// window began.
    pub fn rollover_threshold(&self) -> u64 {
        self.period.saturating_sub(self.interval.as_secs()) + 1
    }

    pub fn max_ticks(&self) -> u32 {
        let ticks = self.period.div_ceil(self.interval.as_secs());
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    pub fn initial_state(&self, code: &IssuedCode) -> RenderState {
        RenderState::active(code.code, code.seconds_remaining.min(self.period), self.period)
    }

    /// Computes the state for tick number `ticks` (starting at 1) at `now`.
    pub fn step(
        &self,
        code: &IssuedCode,
        previous: &RenderState,
        now: u64,
        ticks: u32,
    ) -> RenderState {
        let expired = RenderState::expired(code.code, self.period);

        if previous.is_expired || previous.seconds_remaining == 0 {
            return expired;
        }

        let rolled_over = now >= code.expires_at || now / self.period != code.time_step;
        if rolled_over || ticks >= self.max_ticks() {
            return expired;
        }

        let remaining = self.period - now % self.period;
        if remaining > self.rollover_threshold() {
            return expired;
        }

        RenderState::active(code.code, remaining, self.period)
    }

    /// Drives the sink until the code expires, the sink fails, or the
    /// sequence is cancelled.
    pub async fn run<S, C>(
        &self,
        code: &IssuedCode,
        sink: &mut S,
        clock: &C,
        mut cancel: CancelSignal,
    ) -> CountdownOutcome
    where
        S: DisplaySink,
        C: Clock,
    {
        let mut state = self.initial_state(code);
        let mut ticks = 0;

        loop {
            if cancel.is_cancelled() {
                debug!(ticks, "countdown cancelled");
                return CountdownOutcome::Cancelled { ticks };
            }

            match sink.display(&state).await {
                Ok(()) => {}
                Err(SinkError::Unchanged) => debug!(ticks, "display unchanged"),
                Err(error) => {
                    warn!(ticks, %error, "stopping countdown");
                    return CountdownOutcome::Aborted { ticks, error };
                }
            }

            if state.is_expired {
                info!(ticks, time_step = code.time_step, "code expired");
                return CountdownOutcome::Expired { ticks };
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(ticks, "countdown cancelled");
                    return CountdownOutcome::Cancelled { ticks };
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            ticks += 1;
            state = self.step(code, &state, clock.now(), ticks);
            debug!(
                ticks,
                seconds_remaining = state.seconds_remaining,
                expired = state.is_expired,
                "tick"
            );
        }
    }
}
