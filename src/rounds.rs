//! Phase annotation for round listings.

use chrono::{DateTime, Utc};

use crate::phase::RoundPhase;
use crate::protocol::Round;

/// A round together with the phase it was in when last annotated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasedRound {
    pub round: Round,
    pub phase: RoundPhase,
}

impl PhasedRound {
    /// Annotate a single round at `now`.
    pub fn at(round: Round, now: DateTime<Utc>) -> Self {
        let phase = round.phase_at(now);
        Self { round, phase }
    }

    /// Annotate a single round against the current clock, e.g. one just created.
    pub fn from_round(round: Round) -> Self {
        Self::at(round, Utc::now())
    }

    /// Recompute the phase for `now`, keeping the round untouched.
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        self.phase = self.round.phase_at(now);
    }
}

/// Annotate every round with its phase at `now`, preserving order.
pub fn annotate_rounds(rounds: Vec<Round>, now: DateTime<Utc>) -> Vec<PhasedRound> {
    rounds
        .into_iter()
        .map(|round| PhasedRound::at(round, now))
        .collect()
}

/// [`annotate_rounds`] with the clock sampled once for the whole page.
pub fn annotate_rounds_now(rounds: Vec<Round>) -> Vec<PhasedRound> {
    annotate_rounds(rounds, Utc::now())
}

/// Re-annotate an already annotated listing for a new instant.
pub fn refresh_phases(rounds: &mut [PhasedRound], now: DateTime<Utc>) {
    for round in rounds {
        round.refresh(now);
    }
}
