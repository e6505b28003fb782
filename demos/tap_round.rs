//! # Tap Round Demo
//!
//! A terminal walkthrough of the full player flow:
//!
//! 1. Restore a saved session, or log in with credentials
//! 2. List the first page of rounds
//! 3. Watch one round live: countdown, leaderboard and score
//! 4. Press Enter to tap the goose while the round is active
//! 5. Shut down gracefully on Ctrl+C or when the round ends
//!
//! ## Running
//!
//! ```sh
//! # Start the game server on localhost:3000, then:
//! GOOSE_USER=alice GOOSE_PASSWORD=secret cargo run --example tap_round --features file-storage
//!
//! # Watch a specific round and override the server URL:
//! GOOSE_API_URL=http://my-server/api cargo run --example tap_round --features file-storage -- <round-id>
//! ```

use std::sync::Arc;

use goose_tap_client::format::{compact_score, countdown, short_id, taps};
use goose_tap_client::{
    ApiClient, ClientConfig, FileStorage, GooseError, MemoryStorage, RoundEvent, RoundId,
    RoundPager, RoundPhase, RoundSnapshot, RoundWatcher, SessionState, SessionStorage,
    SessionStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};

fn open_storage() -> Arc<dyn SessionStorage> {
    match FileStorage::default_path().map(FileStorage::open) {
        Some(Ok(storage)) => {
            tracing::info!("Session file: {}", storage.path().display());
            Arc::new(storage)
        }
        Some(Err(e)) => {
            tracing::warn!("Session file unusable ({e}), keeping the session in memory");
            Arc::new(MemoryStorage::new())
        }
        None => Arc::new(MemoryStorage::new()),
    }
}

fn render(snapshot: &RoundSnapshot, me: Option<&str>) {
    println!(
        "round {} | {} | total {} | you: {} / {} pts",
        short_id(&snapshot.detail.round.id),
        snapshot.phase,
        compact_score(snapshot.total_score),
        taps(snapshot.my_stats.taps),
        snapshot.my_stats.score,
    );
    for entry in snapshot.leaderboard(me) {
        let marker = if entry.is_me { " (you)" } else { "" };
        println!("  #{} {}{} {} pts", entry.rank, entry.username, marker, entry.score);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let config = ClientConfig::from_env();
    tracing::info!("Using API at {}", config.base_url);
    let api = ApiClient::connect(&config)?;

    // ── Session ─────────────────────────────────────────────────────
    let session = SessionStore::with_shared_storage(api.clone(), open_storage());
    if let SessionState::Unauthenticated = session.restore().await {
        let username = std::env::var("GOOSE_USER")?;
        let password = std::env::var("GOOSE_PASSWORD")?;
        match session.login(&username, &password).await {
            Ok(user) => tracing::info!("Logged in as {}", user.username),
            Err(GooseError::Authentication { message }) => {
                eprintln!("Login failed: {message}");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }
    let me = session.current_user().map(|user| user.username);

    // ── Pick a round ────────────────────────────────────────────────
    let round_id: RoundId = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => {
            let mut pager = RoundPager::new(api.clone(), config.page_size);
            let listing = pager.first().await?;
            for phased in &listing.rounds {
                println!(
                    "{}  {:<9}  {}",
                    short_id(&phased.round.id),
                    phased.phase,
                    compact_score(phased.round.total_score)
                );
            }
            let preferred = listing
                .rounds
                .iter()
                .find(|phased| phased.phase == RoundPhase::Active)
                .or_else(|| listing.rounds.first());
            match preferred {
                Some(phased) => phased.round.id,
                None => {
                    println!("No rounds yet.");
                    return Ok(());
                }
            }
        }
    };

    // ── Watch ───────────────────────────────────────────────────────
    let (mut watcher, mut event_rx) = RoundWatcher::start(api, round_id, &config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Press Enter to tap the goose, Ctrl+C to quit.");

    loop {
        tokio::select! {
            // Branch 1: events from the watcher task.
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                match event {
                    RoundEvent::Loaded(snapshot) | RoundEvent::Updated(snapshot) => {
                        render(&snapshot, me.as_deref());
                    }
                    RoundEvent::Tick { phase, remaining } => {
                        if let Some(remaining) = remaining {
                            println!("{phase} {}", countdown(remaining));
                        }
                    }
                    RoundEvent::PhaseChanged { from, to } => {
                        println!("Round moved from {from} to {to}");
                    }
                    RoundEvent::TapApplied(outcome) => {
                        println!("+{} (total {})", outcome.points, compact_score(outcome.total_score));
                    }
                    // A rejected session is handled as a logout once the watcher stops.
                    RoundEvent::LoadFailed { session_invalid: true, .. } => {}
                    RoundEvent::LoadFailed { not_found: true, .. } => {
                        println!("Round not found.");
                    }
                    RoundEvent::LoadFailed { message, .. } => {
                        println!("Could not load round: {message}");
                    }
                    RoundEvent::PollFailed { message } => {
                        tracing::warn!("Refresh failed: {message}");
                    }
                    RoundEvent::Stopped { reason } => {
                        tracing::info!("Watcher stopped: {reason:?}");
                        if session.handle_stop(reason).await {
                            tracing::info!("Session expired, logged out");
                            break;
                        }
                        if let Some(snapshot) = watcher.snapshot().await {
                            if let Some(winner) = snapshot.winner() {
                                println!("Winner: {} with {} pts", winner.username(), winner.score());
                            }
                        }
                        break;
                    }
                }
            }

            // Branch 2: a line on stdin is a tap.
            line = lines.next_line() => {
                match line {
                    Ok(Some(_)) => match watcher.tap().await {
                        Ok(_) => {}
                        Err(GooseError::RoundNotActive) => tracing::debug!("Goose is not tappable right now"),
                        Err(GooseError::TapInFlight) => {}
                        Err(e) => {
                            if session.handle_error(&e).await {
                                tracing::info!("Session expired, logged out");
                                break;
                            }
                            tracing::warn!("Tap failed: {e}");
                        }
                    },
                    Ok(None) | Err(_) => break,
                }
            }

            // Branch 3: Ctrl+C.
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down");
                break;
            }
        }
    }

    watcher.shutdown().await;
    Ok(())
}
