//! Display helpers shared by round cards and the round screen.

use chrono::Duration;

use crate::protocol::RoundId;

/// Countdown as `MM:SS`; zero or negative durations render as `00:00`.
///
/// Whole hours are dropped, matching a timer that only ever counts down a
/// round or its cooldown.
pub fn countdown(remaining: Duration) -> String {
    let millis = remaining.num_milliseconds();
    if millis <= 0 {
        return "00:00".to_string();
    }
    let total_seconds = millis / 1000;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Compact aggregate score: `999`, `1.5K`, `2.3M`.
pub fn compact_score(score: u64) -> String {
    if score >= 1_000_000 {
        format!("{:.1}M", score as f64 / 1_000_000.0)
    } else if score >= 1_000 {
        format!("{:.1}K", score as f64 / 1_000.0)
    } else {
        score.to_string()
    }
}

/// First eight characters of a round id, for cards and headers.
pub fn short_id(id: &RoundId) -> String {
    let mut text = id.to_string();
    text.truncate(8);
    text
}

/// Plural-aware tap count, e.g. `1 tap`, `12 taps`.
pub fn taps(count: u64) -> String {
    if count == 1 {
        "1 tap".to_string()
    } else {
        format!("{count} taps")
    }
}
