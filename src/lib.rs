//! # Tap the Goose Client
//!
//! Transport-agnostic async Rust client for the Tap the Goose round game API.
//!
//! The server owns scoring, timing and persistence. This crate covers the
//! client side: logging in and keeping the session valid, paging through
//! rounds, deriving each round's phase from its timestamps, polling a round
//! while it can still change, and reflecting taps optimistically until the
//! next poll confirms them.
//!
//! ## Features
//!
//! - **Transport-agnostic**: implement the [`Transport`] trait for any HTTP stack
//! - **HTTP built-in**: the default `transport-http` feature provides `HttpTransport`
//! - **Event-driven**: [`RoundWatcher`] emits typed [`RoundEvent`]s on a channel
//! - **Pure phase logic**: [`derive_phase`] never caches, so it follows the clock
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env();
//! let api = ApiClient::connect(&config)?;
//! let session = SessionStore::new(api.clone(), MemoryStorage::new());
//! session.login("alice", "secret").await?;
//!
//! let mut pager = RoundPager::new(api.clone(), config.page_size);
//! let listing = pager.first().await?;
//! let round_id = listing.rounds[0].round.id;
//!
//! let (watcher, mut events) = RoundWatcher::start(api, round_id, &config);
//! watcher.tap().await?;
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod leaderboard;
pub mod pagination;
pub mod phase;
pub mod protocol;
pub mod reconcile;
pub mod rounds;
pub mod session;
pub mod storage;
pub mod transport;
pub mod transports;
pub mod watcher;

// Re-export primary types for ergonomic imports.
pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::{GooseError, Result};
pub use pagination::{CursorChain, RoundPager, RoundsListing};
pub use phase::{derive_phase, RoundPhase};
pub use protocol::{Round, RoundDetail, RoundId, RoundStats, TapResult, TopStats, User};
pub use reconcile::{RoundView, TapIndicator, TapOutcome};
pub use rounds::{annotate_rounds, annotate_rounds_now, PhasedRound};
pub use session::{SessionState, SessionStore};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use transport::{ApiRequest, ApiResponse, Method, Transport};
pub use watcher::{RoundEvent, RoundSnapshot, RoundWatcher, StopReason};

#[cfg(feature = "transport-http")]
pub use transports::HttpTransport;
