//! Leaderboard ordering for completed rounds.

use crate::protocol::TopStats;

/// One ranked leaderboard line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    /// 1-based position.
    pub rank: usize,
    pub username: String,
    pub taps: u64,
    pub score: u64,
    /// `true` when this entry belongs to the viewing user.
    pub is_me: bool,
}

/// Order entries by score, highest first.
///
/// The sort is stable: entries with equal scores keep the order the server
/// sent them in, so the result is deterministic for a given input.
pub fn sort_by_score(top_stats: &[TopStats]) -> Vec<TopStats> {
    let mut sorted = top_stats.to_vec();
    sorted.sort_by(|a, b| b.score().cmp(&a.score()));
    sorted
}

/// Rank entries for display, flagging the viewer's own line.
pub fn rank(top_stats: &[TopStats], me: Option<&str>) -> Vec<RankedEntry> {
    sort_by_score(top_stats)
        .into_iter()
        .enumerate()
        .map(|(index, entry)| RankedEntry {
            rank: index + 1,
            is_me: me.is_some_and(|name| name == entry.username()),
            taps: entry.stats.taps,
            score: entry.stats.score,
            username: entry.user.username,
        })
        .collect()
}

/// The highest scoring entry, if anyone played.
pub fn winner(top_stats: &[TopStats]) -> Option<&TopStats> {
    // First maximum wins ties, matching the stable sort above.
    top_stats
        .iter()
        .fold(None, |best: Option<&TopStats>, entry| match best {
            Some(current) if current.score() >= entry.score() => Some(current),
            _ => Some(entry),
        })
}
