//! Live view of one round: polling, countdown ticks and taps.
//!
//! [`RoundWatcher`] is a thin handle over a background task that owns two
//! timers. The poll timer re-fetches round detail while the round can still
//! change; the tick timer recomputes the phase and countdown for display.
//! Events are emitted on a bounded channel returned from
//! [`RoundWatcher::start`].
//!
//! The task stops on its own once the round is completed (after one settle
//! fetch for the final leaderboard), when the initial load fails, when the
//! session is rejected, on [`shutdown`](RoundWatcher::shutdown), or when the
//! handle is dropped. [`RoundEvent::Stopped`] is always the last event.
//!
//! # Example
//!
//! ```rust,ignore
//! let (watcher, mut events) = RoundWatcher::start(api.clone(), round_id, &config);
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         RoundEvent::Tick { phase, remaining } => { /* redraw countdown */ }
//!         RoundEvent::Stopped { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex, Notify};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::{GooseError, Result};
use crate::leaderboard::{self, RankedEntry};
use crate::phase::RoundPhase;
use crate::protocol::{RoundDetail, RoundId, RoundStats, TopStats};
use crate::reconcile::{RemoteApply, RoundView, TapIndicator, TapOutcome};

// ── Events ──────────────────────────────────────────────────────────

/// What the view layer should render right now.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSnapshot {
    pub detail: RoundDetail,
    pub phase: RoundPhase,
    pub my_stats: RoundStats,
    /// Aggregate score for display; never lower than a value shown before.
    pub total_score: u64,
}

impl RoundSnapshot {
    fn of(view: &RoundView) -> Self {
        Self {
            detail: view.detail().clone(),
            phase: view.phase(),
            my_stats: view.my_stats(),
            total_score: view.display_total_score(),
        }
    }

    /// Ranked leaderboard, flagging `me`.
    pub fn leaderboard(&self, me: Option<&str>) -> Vec<RankedEntry> {
        leaderboard::rank(&self.detail.top_stats, me)
    }

    pub fn winner(&self) -> Option<&TopStats> {
        leaderboard::winner(&self.detail.top_stats)
    }
}

/// Why the watcher task exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The round is over; nothing can change anymore.
    Completed,
    /// The initial fetch failed (round missing or unreachable).
    LoadFailed,
    /// The server rejected the session token.
    SessionInvalid,
    /// [`RoundWatcher::shutdown`] was called.
    Shutdown,
}

/// Events emitted by a [`RoundWatcher`].
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    /// The first snapshot of the round arrived.
    Loaded(Box<RoundSnapshot>),
    /// A poll replaced the local view with fresh server data.
    Updated(Box<RoundSnapshot>),
    /// Countdown redraw: phase and time left in it, both computed fresh.
    Tick {
        phase: RoundPhase,
        remaining: Option<chrono::Duration>,
    },
    /// The round crossed a phase boundary.
    PhaseChanged { from: RoundPhase, to: RoundPhase },
    /// A tap succeeded and was folded into the local view.
    TapApplied(TapOutcome),
    /// The initial fetch failed; show the error page with a way back to the list.
    ///
    /// When `session_invalid` is set the page should not be shown: the
    /// session is about to be logged out instead.
    LoadFailed {
        message: String,
        not_found: bool,
        session_invalid: bool,
    },
    /// A periodic poll failed; the previous snapshot stays on screen.
    PollFailed { message: String },
    /// The watcher task exited. Always the last event.
    Stopped { reason: StopReason },
}

// ── Shared state ────────────────────────────────────────────────────

/// State shared between the handle and the background task.
struct WatcherShared {
    view: Mutex<Option<RoundView>>,
    tap_in_flight: AtomicBool,
    running: AtomicBool,
    refresh: Notify,
}

/// Clears the tap guard however the tap future ends.
struct TapGuard<'a>(&'a AtomicBool);

impl Drop for TapGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ── Watcher handle ──────────────────────────────────────────────────

/// Handle to a running round watcher.
pub struct RoundWatcher {
    round_id: RoundId,
    api: ApiClient,
    shared: Arc<WatcherShared>,
    event_tx: mpsc::Sender<RoundEvent>,
    task: Option<tokio::task::JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_timeout: Duration,
}

impl RoundWatcher {
    /// Spawn the watcher task for `round_id`.
    ///
    /// The task fetches the round immediately and emits
    /// [`RoundEvent::Loaded`] or [`RoundEvent::LoadFailed`].
    #[must_use = "the event receiver must be used to receive events"]
    pub fn start(
        api: ApiClient,
        round_id: RoundId,
        config: &ClientConfig,
    ) -> (Self, mpsc::Receiver<RoundEvent>) {
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<RoundEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let shared = Arc::new(WatcherShared {
            view: Mutex::new(None),
            tap_in_flight: AtomicBool::new(false),
            running: AtomicBool::new(true),
            refresh: Notify::new(),
        });

        let ctx = LoopContext {
            api: api.clone(),
            round_id,
            shared: Arc::clone(&shared),
            event_tx: event_tx.clone(),
            poll_interval: config.poll_interval,
            tick_interval: config.tick_interval,
            indicator_duration: config.tap_indicator_duration,
        };
        let task = tokio::spawn(watch_loop(ctx, shutdown_rx));

        let watcher = Self {
            round_id,
            api,
            shared,
            event_tx,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        };
        (watcher, event_rx)
    }

    /// Tap the goose.
    ///
    /// Only one tap may be in flight; the phase is checked fresh before the
    /// request is sent. On success the result is reconciled into the local
    /// view, [`RoundEvent::TapApplied`] is emitted and an immediate refresh is
    /// scheduled so the next server snapshot confirms the tap.
    ///
    /// # Errors
    ///
    /// - [`GooseError::WatcherStopped`] if the watcher task has exited
    /// - [`GooseError::RoundNotActive`] if the round is not loaded or not active
    /// - [`GooseError::TapInFlight`] if a previous tap has not completed
    /// - any API error; local state is left untouched
    pub async fn tap(&self) -> Result<TapOutcome> {
        if !self.is_running() {
            return Err(GooseError::WatcherStopped);
        }
        let phase = self.shared.view.lock().await.as_ref().map(RoundView::phase);
        if phase != Some(RoundPhase::Active) {
            return Err(GooseError::RoundNotActive);
        }

        if self.shared.tap_in_flight.swap(true, Ordering::AcqRel) {
            debug!("tap ignored, previous tap still in flight");
            return Err(GooseError::TapInFlight);
        }
        let _guard = TapGuard(&self.shared.tap_in_flight);

        let result = match self.api.tap(self.round_id).await {
            Ok(result) => result,
            Err(e) => {
                warn!(round_id = %self.round_id, "tap failed: {e}");
                return Err(e);
            }
        };

        let outcome = {
            let mut view = self.shared.view.lock().await;
            let view = view.as_mut().ok_or(GooseError::WatcherStopped)?;
            view.apply_tap(result, Instant::now())
        };
        debug!(points = outcome.points, total = outcome.total_score, "tap applied");

        emit_event(&self.event_tx, RoundEvent::TapApplied(outcome));
        self.shared.refresh.notify_one();
        Ok(outcome)
    }

    /// Ask the task to re-fetch now instead of waiting for the next poll.
    ///
    /// # Errors
    ///
    /// Returns [`GooseError::WatcherStopped`] if the task has exited.
    pub fn refresh_now(&self) -> Result<()> {
        if !self.is_running() {
            return Err(GooseError::WatcherStopped);
        }
        self.shared.refresh.notify_one();
        Ok(())
    }

    /// Stop the watcher task and wait for it to exit.
    pub async fn shutdown(&mut self) {
        debug!(round_id = %self.round_id, "RoundWatcher: shutdown requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("watcher task terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("watcher task did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("watcher task aborted: {join_err}");
                    }
                }
            }
        }

        self.shared.running.store(false, Ordering::Release);
    }

    // ── State accessors ─────────────────────────────────────────────

    pub fn round_id(&self) -> RoundId {
        self.round_id
    }

    /// Returns `true` while the background task is polling or ticking.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Returns `true` while a tap request is awaiting its response.
    pub fn is_tapping(&self) -> bool {
        self.shared.tap_in_flight.load(Ordering::Acquire)
    }

    /// The current local view, if the round has loaded.
    pub async fn snapshot(&self) -> Option<RoundSnapshot> {
        self.shared.view.lock().await.as_ref().map(RoundSnapshot::of)
    }

    /// The "points gained" indicator, if it is still visible.
    pub async fn indicator(&self) -> Option<TapIndicator> {
        self.shared
            .view
            .lock()
            .await
            .as_ref()
            .and_then(|view| view.indicator(Instant::now()))
    }
}

impl std::fmt::Debug for RoundWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundWatcher")
            .field("round_id", &self.round_id)
            .field("running", &self.is_running())
            .field("tapping", &self.is_tapping())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for RoundWatcher {
    fn drop(&mut self) {
        // No executor is available here to await a graceful stop; aborting
        // drops the loop future together with its timers and requests.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Watch loop ──────────────────────────────────────────────────────

struct LoopContext {
    api: ApiClient,
    round_id: RoundId,
    shared: Arc<WatcherShared>,
    event_tx: mpsc::Sender<RoundEvent>,
    poll_interval: Duration,
    tick_interval: Duration,
    indicator_duration: Duration,
}

/// Result of a fetch raced against the shutdown signal.
enum Fetch {
    Done(Result<RoundDetail>),
    Shutdown,
}

async fn fetch(ctx: &LoopContext, shutdown_rx: &mut oneshot::Receiver<()>) -> Fetch {
    tokio::select! {
        biased;
        _ = shutdown_rx => Fetch::Shutdown,
        result = ctx.api.get_round(ctx.round_id) => Fetch::Done(result),
    }
}

/// Background task: initial load, then poll and tick until the round completes.
async fn watch_loop(ctx: LoopContext, mut shutdown_rx: oneshot::Receiver<()>) {
    debug!(round_id = %ctx.round_id, "watch loop started");
    let reason = run(&ctx, &mut shutdown_rx).await;
    emit_stopped(&ctx, reason).await;
    debug!(round_id = %ctx.round_id, ?reason, "watch loop exited");
}

async fn run(ctx: &LoopContext, shutdown_rx: &mut oneshot::Receiver<()>) -> StopReason {
    // Initial load.
    let detail = match fetch(ctx, shutdown_rx).await {
        Fetch::Shutdown => return StopReason::Shutdown,
        Fetch::Done(Ok(detail)) => detail,
        Fetch::Done(Err(e)) => {
            warn!(round_id = %ctx.round_id, "failed to load round: {e}");
            let session_invalid = e.is_session_invalid();
            emit_event(
                &ctx.event_tx,
                RoundEvent::LoadFailed {
                    not_found: matches!(e, GooseError::NotFound),
                    session_invalid,
                    message: e.to_string(),
                },
            );
            return if session_invalid {
                StopReason::SessionInvalid
            } else {
                StopReason::LoadFailed
            };
        }
    };

    let snapshot = {
        let mut view = ctx.shared.view.lock().await;
        let view = view.insert(RoundView::new(detail, ctx.indicator_duration));
        RoundSnapshot::of(view)
    };
    let mut last_phase = snapshot.phase;
    emit_event(&ctx.event_tx, RoundEvent::Loaded(Box::new(snapshot)));

    if last_phase.is_final() {
        info!(round_id = %ctx.round_id, "round already completed, not polling");
        return StopReason::Completed;
    }

    let start = Instant::now();
    let mut poll = interval_at(start + ctx.poll_interval, ctx.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick = interval_at(start + ctx.tick_interval, ctx.tick_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            // Branch 1: shutdown signal (or the handle went away).
            _ = &mut *shutdown_rx => {
                debug!("shutdown signal received");
                return StopReason::Shutdown;
            }

            // Branch 2: explicit refresh (after a tap, or on request).
            _ = ctx.shared.refresh.notified() => {
                poll.reset();
                if let Some(reason) = poll_once(ctx, shutdown_rx).await {
                    return reason;
                }
            }

            // Branch 3: periodic poll.
            _ = poll.tick() => {
                if let Some(reason) = poll_once(ctx, shutdown_rx).await {
                    return reason;
                }
            }

            // Branch 4: countdown tick.
            _ = tick.tick() => {
                let (phase, remaining) = {
                    let view = ctx.shared.view.lock().await;
                    match view.as_ref() {
                        Some(view) => {
                            let now = chrono::Utc::now();
                            let round = &view.detail().round;
                            (round.phase_at(now), round.time_remaining(now))
                        }
                        None => return StopReason::LoadFailed,
                    }
                };
                emit_event(&ctx.event_tx, RoundEvent::Tick { phase, remaining });
            }
        }

        let phase = match ctx.shared.view.lock().await.as_ref() {
            Some(view) => view.phase(),
            None => return StopReason::LoadFailed,
        };
        if phase != last_phase {
            info!(round_id = %ctx.round_id, from = %last_phase, to = %phase, "round phase changed");
            emit_event(
                &ctx.event_tx,
                RoundEvent::PhaseChanged {
                    from: last_phase,
                    to: phase,
                },
            );
            last_phase = phase;

            if phase.is_final() {
                // One settle fetch so the final leaderboard is on screen.
                if let Some(reason) = poll_once(ctx, shutdown_rx).await {
                    return reason;
                }
                return StopReason::Completed;
            }
        }
    }
}

/// Fetch once and apply the snapshot. Returns a reason when the loop must stop.
async fn poll_once(
    ctx: &LoopContext,
    shutdown_rx: &mut oneshot::Receiver<()>,
) -> Option<StopReason> {
    let ticket = match ctx.shared.view.lock().await.as_mut() {
        Some(view) => view.begin_fetch(),
        None => return Some(StopReason::LoadFailed),
    };

    match fetch(ctx, shutdown_rx).await {
        Fetch::Shutdown => Some(StopReason::Shutdown),
        Fetch::Done(Ok(detail)) => {
            let snapshot = {
                let mut view = ctx.shared.view.lock().await;
                match view.as_mut() {
                    Some(view) => match view.apply_remote(ticket, detail) {
                        RemoteApply::Applied => Some(RoundSnapshot::of(view)),
                        RemoteApply::Stale => None,
                    },
                    None => None,
                }
            };
            if let Some(snapshot) = snapshot {
                emit_event(&ctx.event_tx, RoundEvent::Updated(Box::new(snapshot)));
            }
            None
        }
        Fetch::Done(Err(e)) if e.is_session_invalid() => {
            warn!(round_id = %ctx.round_id, "session rejected while polling");
            Some(StopReason::SessionInvalid)
        }
        Fetch::Done(Err(e)) => {
            warn!(round_id = %ctx.round_id, "poll failed: {e}");
            emit_event(
                &ctx.event_tx,
                RoundEvent::PollFailed {
                    message: e.to_string(),
                },
            );
            None
        }
    }
}

/// Emit an event. If the channel is full, log a warning and drop the event
/// so the loop never blocks on a slow consumer.
fn emit_event(event_tx: &mpsc::Sender<RoundEvent>, event: RoundEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(
                "event channel full, dropping event: {:?}",
                std::mem::discriminant(&dropped)
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

/// Emit [`RoundEvent::Stopped`] and mark the watcher as no longer running.
///
/// Uses `send().await` because `Stopped` is always the last event and must
/// never be dropped.
async fn emit_stopped(ctx: &LoopContext, reason: StopReason) {
    ctx.shared.running.store(false, Ordering::Release);
    if ctx
        .event_tx
        .send(RoundEvent::Stopped { reason })
        .await
        .is_err()
    {
        debug!("event channel closed, receiver dropped");
    }
}
