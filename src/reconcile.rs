//! Local view of one round: authoritative server snapshots plus optimistic taps.
//!
//! [`RoundView`] has two update channels. [`apply_remote`](RoundView::apply_remote)
//! takes a server snapshot and always wins over local state.
//! [`apply_tap`](RoundView::apply_tap) folds a tap result in immediately so the
//! player sees it before the next poll. Remote snapshots are ordered by the
//! ticket taken when their fetch *started*, so a response to an older fetch
//! can never replace a newer one. A tap also raises that floor: a fetch that
//! was already in flight when the tap landed cannot revert it.

use std::time::Duration;

use tokio::time::Instant;

use crate::phase::RoundPhase;
use crate::protocol::{RoundDetail, RoundStats, TapResult, TopStats};

/// Default lifetime of the "points gained" indicator.
pub const DEFAULT_INDICATOR_DURATION: Duration = Duration::from_millis(300);

/// Ordering token for a detail fetch, taken before the request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Whether a remote snapshot replaced the local view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteApply {
    Applied,
    /// A newer fetch or a tap already landed; the snapshot was dropped.
    Stale,
}

/// Transient "+N" shown after a tap, cleared by time alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapIndicator {
    pub points: u64,
    pub expires_at: Instant,
}

impl TapIndicator {
    pub fn is_visible(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub fn label(&self) -> String {
        format!("+{}", self.points)
    }
}

/// What a successful tap changed locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapOutcome {
    /// The player's new cumulative stats, as reported by the server.
    pub stats: RoundStats,
    /// Points gained by this tap relative to the previous local score.
    pub points: u64,
    /// The round aggregate after the optimistic adjustment.
    pub total_score: u64,
}

/// Cached round detail plus the player's local stats.
#[derive(Debug, Clone)]
pub struct RoundView {
    detail: RoundDetail,
    my_stats: RoundStats,
    issued: u64,
    applied: Option<FetchTicket>,
    /// Last ticket issued before the most recent tap.
    tap_barrier: Option<FetchTicket>,
    shown_total: u64,
    indicator: Option<TapIndicator>,
    indicator_duration: Duration,
}

impl RoundView {
    /// Build a view from the first snapshot of a round.
    pub fn new(detail: RoundDetail, indicator_duration: Duration) -> Self {
        Self {
            my_stats: detail.my_stats,
            shown_total: detail.round.total_score,
            detail,
            issued: 0,
            applied: None,
            tap_barrier: None,
            indicator: None,
            indicator_duration,
        }
    }

    /// Take the ordering ticket for a fetch that is about to start.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Replace local state with a server snapshot, unless a newer fetch already
    /// landed or a tap succeeded after this fetch started.
    ///
    /// Optimistic tap adjustments are discarded: the server is the only source
    /// of truth for stats and the aggregate score.
    pub fn apply_remote(&mut self, ticket: FetchTicket, detail: RoundDetail) -> RemoteApply {
        if self.applied.is_some_and(|applied| ticket < applied) {
            tracing::debug!(?ticket, "dropping out-of-order round snapshot");
            return RemoteApply::Stale;
        }
        if self.tap_barrier.is_some_and(|barrier| ticket <= barrier) {
            tracing::debug!(?ticket, "dropping round snapshot fetched before the last tap");
            return RemoteApply::Stale;
        }
        self.applied = Some(ticket);
        self.my_stats = detail.my_stats;
        self.shown_total = self.shown_total.max(detail.round.total_score);
        self.detail = detail;
        RemoteApply::Applied
    }

    /// Fold a successful tap into the local view.
    ///
    /// Local stats are replaced by the returned totals; the round aggregate is
    /// raised by the score delta; the indicator shows that delta until
    /// `now + indicator_duration`.
    pub fn apply_tap(&mut self, result: TapResult, now: Instant) -> TapOutcome {
        let points = result.score.saturating_sub(self.my_stats.score);
        self.tap_barrier = Some(FetchTicket(self.issued));
        self.my_stats = RoundStats::from(result);
        self.detail.my_stats = self.my_stats;
        self.detail.round.total_score = self.detail.round.total_score.saturating_add(points);
        self.shown_total = self.shown_total.max(self.detail.round.total_score);
        self.indicator = Some(TapIndicator {
            points,
            expires_at: now + self.indicator_duration,
        });

        TapOutcome {
            stats: self.my_stats,
            points,
            total_score: self.detail.round.total_score,
        }
    }

    pub fn detail(&self) -> &RoundDetail {
        &self.detail
    }

    pub fn my_stats(&self) -> RoundStats {
        self.my_stats
    }

    pub fn top_stats(&self) -> &[TopStats] {
        &self.detail.top_stats
    }

    /// The aggregate score as it should be displayed: never lower than any value shown before.
    pub fn display_total_score(&self) -> u64 {
        self.shown_total.max(self.detail.round.total_score)
    }

    /// Phase of the cached round at the current wall-clock time.
    pub fn phase(&self) -> RoundPhase {
        self.detail.round.phase()
    }

    /// The indicator, if it is still visible at `now`.
    pub fn indicator(&self, now: Instant) -> Option<TapIndicator> {
        self.indicator.filter(|indicator| indicator.is_visible(now))
    }

    /// Average points per tap, if the player has tapped at all.
    pub fn average_score_per_tap(&self) -> Option<f64> {
        (self.my_stats.taps > 0).then(|| self.my_stats.score as f64 / self.my_stats.taps as f64)
    }
}
