//! Temporal phase of a round.
//!
//! A round's phase is never stored: it is a pure function of the round's
//! bounds and the wall clock, and callers recompute it every time a decision
//! depends on it (each countdown tick, each tap attempt).

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::Round;

/// Where a round is relative to its active window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// The round has not started yet.
    Cooldown,
    /// Taps are accepted.
    Active,
    /// The round is over and its leaderboard is final.
    Completed,
}

impl RoundPhase {
    /// Returns `true` only for [`RoundPhase::Active`].
    pub fn is_tappable(self) -> bool {
        matches!(self, RoundPhase::Active)
    }

    /// Returns `true` once the round can no longer change.
    pub fn is_final(self) -> bool {
        matches!(self, RoundPhase::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoundPhase::Cooldown => "cooldown",
            RoundPhase::Active => "active",
            RoundPhase::Completed => "completed",
        }
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Derive the phase of a round with the given bounds at `now`.
///
/// Both bounds are inclusive for the active window: a round is active at
/// exactly `start` and at exactly `end`.
pub fn derive_phase(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> RoundPhase {
    if now < start {
        RoundPhase::Cooldown
    } else if now <= end {
        RoundPhase::Active
    } else {
        RoundPhase::Completed
    }
}

impl Round {
    /// Phase of this round at `now`.
    pub fn phase_at(&self, now: DateTime<Utc>) -> RoundPhase {
        derive_phase(self.start_time, self.end_time, now)
    }

    /// Phase of this round, sampling the clock at call time.
    pub fn phase(&self) -> RoundPhase {
        self.phase_at(Utc::now())
    }

    /// The instant the round leaves `phase`, if it ever does.
    pub fn phase_deadline(&self, phase: RoundPhase) -> Option<DateTime<Utc>> {
        match phase {
            RoundPhase::Cooldown => Some(self.start_time),
            RoundPhase::Active => Some(self.end_time),
            RoundPhase::Completed => None,
        }
    }

    /// Time left until the current phase ends, clamped at zero.
    ///
    /// `None` once the round is completed.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.phase_deadline(self.phase_at(now))
            .map(|deadline| (deadline - now).max(Duration::zero()))
    }

    /// Fraction of the active window that has elapsed, in `0.0..=100.0`.
    pub fn progress_percent(&self, now: DateTime<Utc>) -> f64 {
        let total = (self.end_time - self.start_time).num_milliseconds();
        if total <= 0 {
            return if now >= self.end_time { 100.0 } else { 0.0 };
        }
        let elapsed = (now - self.start_time).num_milliseconds();
        (elapsed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    }
}
