//! Wire types for the Tap the Goose HTTP API.
//!
//! Every type here matches the JSON the API produces: camelCase field names,
//! RFC 3339 timestamps and UUID round identifiers. Timestamps decode straight
//! into `chrono::DateTime<Utc>`, so a malformed value fails deserialization
//! instead of being coerced into some default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Type aliases ────────────────────────────────────────────────────

/// Unique identifier for rounds.
pub type RoundId = Uuid;

/// Opaque pagination cursor issued by the API.
pub type Cursor = String;

// ── Users ───────────────────────────────────────────────────────────

/// Role of a user. Only [`Role::Admin`] may create rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    #[default]
    Survivor,
    /// Any role this client does not know about; treated as non-privileged.
    #[serde(other)]
    Other,
}

impl Role {
    /// Returns `true` if this role may create new rounds.
    pub fn can_create_rounds(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// The authenticated user as returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: Role,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response of `POST /auth/login`. Only the token is consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Error body the API returns alongside non-success statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, alias = "detail")]
    pub message: Option<String>,
}

// ── Rounds ──────────────────────────────────────────────────────────

/// A time-boxed scoring round.
///
/// Everything except `total_score` is fixed at creation. `total_score` is the
/// aggregate over all players and is only ever raised by the server (or by
/// optimistic tap reconciliation on the client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: RoundId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_score: u64,
    pub created_at: DateTime<Utc>,
}

/// Per-user statistics within one round. Score is assigned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RoundStats {
    pub taps: u64,
    pub score: u64,
}

/// Display identity attached to leaderboard entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsUser {
    pub username: String,
}

/// A leaderboard entry: stats joined with the player's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopStats {
    #[serde(flatten)]
    pub stats: RoundStats,
    pub user: StatsUser,
}

impl TopStats {
    pub fn username(&self) -> &str {
        &self.user.username
    }

    pub fn score(&self) -> u64 {
        self.stats.score
    }
}

/// Response of `GET /rounds/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundDetail {
    pub round: Round,
    #[serde(default)]
    pub top_stats: Vec<TopStats>,
    #[serde(default)]
    pub my_stats: RoundStats,
}

/// Pagination block of `GET /rounds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub limit: u32,
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
}

/// Response of `GET /rounds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundsPage {
    pub data: Vec<Round>,
    pub pagination: PageInfo,
}

/// Response of `POST /rounds/{id}/tap`: the player's new cumulative totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapResult {
    pub taps: u64,
    pub score: u64,
}

impl From<TapResult> for RoundStats {
    fn from(result: TapResult) -> Self {
        RoundStats {
            taps: result.taps,
            score: result.score,
        }
    }
}
