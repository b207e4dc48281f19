//! Background session-expiry monitor.
//!
//! Drives [`ExpiryTracker`] from a tokio task: a 1-second poll reads the stored
//! token and classifies it, and while a countdown is showing a second 1-second
//! timer decrements it. Both timers live in one `select!` loop, so they never
//! run concurrently. Dropping or shutting down the handle stops the task and
//! dismisses any visible countdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};
use uuid::Uuid;

use casedesk_auth::{evaluate, ExpiryAction, ExpiryTracker, POLL_INTERVAL_MS};

use crate::nav::Route;
use crate::session::AuthSession;

/// Wall-clock source for expiry comparisons.
pub trait Clock: Send + Sync + 'static {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// User-visible side effects of the monitor.
///
/// Countdown calls carry the monitor's session id so the renderer can update
/// the one notification in place.
pub trait ExpiryEffects: Send + Sync + 'static {
    fn show_countdown(&self, session_id: Uuid, seconds_left: u64);
    fn update_countdown(&self, session_id: Uuid, seconds_left: u64);
    fn dismiss_countdown(&self, session_id: Uuid);
    fn navigate(&self, route: Route);
    /// Reload the application shell so no screen keeps stale session state.
    fn reload(&self);
}

pub struct SessionExpiryMonitor {
    session: Arc<AuthSession>,
    effects: Arc<dyn ExpiryEffects>,
    clock: Arc<dyn Clock>,
}

impl SessionExpiryMonitor {
    pub fn new(session: Arc<AuthSession>, effects: Arc<dyn ExpiryEffects>) -> Self {
        Self {
            session,
            effects,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Mount: spawn the monitor task. The first check runs immediately.
    pub fn start(self) -> MonitorHandle {
        let session_id = Uuid::now_v7();
        let shutdown = Arc::new(Notify::new());
        let task = tokio::spawn(run(self, session_id, shutdown.clone()));
        MonitorHandle {
            session_id,
            shutdown,
            task: Some(task),
        }
    }

    fn apply(&self, session_id: Uuid, action: ExpiryAction, countdown: &mut Option<Interval>) -> bool {
        match action {
            ExpiryAction::ShowCountdown { seconds_left } => {
                tracing::info!(%session_id, seconds_left, "session about to expire");
                let period = Duration::from_millis(POLL_INTERVAL_MS);
                let mut timer = interval_at(Instant::now() + period, period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
                *countdown = Some(timer);
                self.effects.show_countdown(session_id, seconds_left);
            }
            ExpiryAction::UpdateCountdown { seconds_left } => {
                self.effects.update_countdown(session_id, seconds_left);
            }
            ExpiryAction::DismissCountdown => {
                *countdown = None;
                self.effects.dismiss_countdown(session_id);
            }
            ExpiryAction::ForceLogout => {
                *countdown = None;
                return true;
            }
        }
        false
    }

    /// Returns false when the session could not be cleared; nothing is shown
    /// to the user in that case.
    async fn force_logout(&self, session_id: Uuid) -> bool {
        tracing::info!(%session_id, "session expired; logging out");
        if let Err(e) = self.session.expire().await {
            tracing::error!(%session_id, error = %e, "failed to clear expired session; retrying next check");
            return false;
        }
        self.effects.navigate(Route::Root);
        self.effects.reload();
        true
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn run(monitor: SessionExpiryMonitor, session_id: Uuid, shutdown: Arc<Notify>) {
    tracing::debug!(%session_id, "session expiry monitor started");

    let mut tracker = ExpiryTracker::new();
    let mut poll = interval(Duration::from_millis(POLL_INTERVAL_MS));
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut countdown: Option<Interval> = None;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.notified() => break,
            _ = poll.tick() => {
                let token = match monitor.session.stored_token().await {
                    Ok(token) => token,
                    Err(e) => {
                        tracing::warn!(%session_id, error = %e, "could not read stored token");
                        continue;
                    }
                };
                let phase = evaluate(token.as_deref(), monitor.clock.now_ms());
                tracing::trace!(%session_id, ?phase, "expiry check");

                for action in tracker.on_poll(phase) {
                    if monitor.apply(session_id, action, &mut countdown)
                        && !monitor.force_logout(session_id).await
                    {
                        tracker.logout_failed();
                    }
                }
            }
            _ = next_tick(&mut countdown) => {
                if let Some(action) = tracker.on_countdown_tick() {
                    monitor.apply(session_id, action, &mut countdown);
                }
            }
        }
    }

    if let Some(action) = tracker.on_unmount() {
        monitor.apply(session_id, action, &mut countdown);
    }
    tracing::debug!(%session_id, "session expiry monitor stopped");
}

/// Owner of a running monitor; dropping it unmounts the monitor.
pub struct MonitorHandle {
    session_id: Uuid,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Key of this monitor's countdown notification.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Unmount and wait until the task has dismissed its countdown and exited.
    pub async fn shutdown(mut self) {
        self.shutdown.notify_one();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(session_id = %self.session_id, error = %e, "monitor task ended abnormally");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.shutdown.notify_one();
        }
    }
}
