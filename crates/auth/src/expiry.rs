//! Session-expiry state machine (pure).
//!
//! Inputs are the stored token and a clock reading; outputs are the phase the
//! session is in and the notification/logout actions the caller must perform.
//! Timers and rendering live in the client crate; nothing here sleeps or does IO.
//!
//! Phase is recomputed from the token on every poll rather than accumulated,
//! so a fresh login re-arms the machine without an explicit reset.

use crate::claims::{token_expiry, TokenExpiry};

/// Period of the outer poll, and of the countdown decrement.
pub const POLL_INTERVAL_MS: u64 = 1_000;

/// Remaining time at or below which the countdown warning is shown.
pub const WARNING_THRESHOLD_MS: i64 = 10_000;

/// Where a session stands at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPhase {
    /// No token stored.
    Idle,
    /// Token stored but its expiry cannot be read; no action is taken.
    Undetermined,
    /// Token valid and further than the threshold from expiry.
    Armed { remaining_ms: i64 },
    /// Within the threshold; `seconds_left` is the rounded-up remaining time.
    Warning { seconds_left: u64 },
    /// Token is past its expiry.
    Expired,
}

/// Classify `token` at `now_ms`.
///
/// The expiry check runs before the warning check, so an already-expired token
/// is `Expired` even if no warning was ever shown.
pub fn evaluate(token: Option<&str>, now_ms: i64) -> ExpiryPhase {
    let Some(token) = token else {
        return ExpiryPhase::Idle;
    };

    let expires_at = match token_expiry(token) {
        TokenExpiry::At(ms) => ms,
        TokenExpiry::Unavailable => return ExpiryPhase::Undetermined,
    };

    let remaining_ms = expires_at.saturating_sub(now_ms);
    if remaining_ms <= 0 {
        ExpiryPhase::Expired
    } else if remaining_ms <= WARNING_THRESHOLD_MS {
        let seconds_left = (remaining_ms as u64).div_ceil(1_000);
        ExpiryPhase::Warning { seconds_left }
    } else {
        ExpiryPhase::Armed { remaining_ms }
    }
}

/// Effect the owner of a tracker must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryAction {
    /// Create the countdown notification.
    ShowCountdown { seconds_left: u64 },
    /// Update the existing countdown notification in place.
    UpdateCountdown { seconds_left: u64 },
    /// Remove the countdown notification.
    DismissCountdown,
    /// Clear the persisted session, go to the unauthenticated root, reload.
    ForceLogout,
}

/// Per-monitor state: the displayed countdown and whether logout already ran.
///
/// Invariant: at most one countdown exists at a time (`countdown` is the only
/// place one is recorded, and `ShowCountdown` is emitted only when it is `None`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpiryTracker {
    countdown: Option<u64>,
    logged_out: bool,
}

impl ExpiryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds currently displayed, if a countdown is showing.
    pub fn countdown(&self) -> Option<u64> {
        self.countdown
    }

    pub fn is_counting_down(&self) -> bool {
        self.countdown.is_some()
    }

    fn dismiss(&mut self, actions: &mut Vec<ExpiryAction>) {
        if self.countdown.take().is_some() {
            actions.push(ExpiryAction::DismissCountdown);
        }
    }

    /// Handle an outer poll tick.
    pub fn on_poll(&mut self, phase: ExpiryPhase) -> Vec<ExpiryAction> {
        let mut actions = Vec::new();
        match phase {
            ExpiryPhase::Undetermined => {}
            ExpiryPhase::Idle | ExpiryPhase::Armed { .. } => {
                self.logged_out = false;
                self.dismiss(&mut actions);
            }
            ExpiryPhase::Warning { seconds_left } => {
                self.logged_out = false;
                if self.countdown.is_none() {
                    self.countdown = Some(seconds_left);
                    actions.push(ExpiryAction::ShowCountdown { seconds_left });
                }
            }
            ExpiryPhase::Expired => {
                self.dismiss(&mut actions);
                if !self.logged_out {
                    self.logged_out = true;
                    actions.push(ExpiryAction::ForceLogout);
                }
            }
        }
        actions
    }

    /// The owner could not carry out the last `ForceLogout`; the next
    /// `Expired` poll emits it again.
    pub fn logout_failed(&mut self) {
        self.logged_out = false;
    }

    /// Handle the 1-second countdown tick: decrement the displayed value.
    pub fn on_countdown_tick(&mut self) -> Option<ExpiryAction> {
        let current = self.countdown.as_mut()?;
        if *current == 0 {
            return None;
        }
        *current -= 1;
        Some(ExpiryAction::UpdateCountdown {
            seconds_left: *current,
        })
    }

    /// Handle teardown of the owning monitor.
    pub fn on_unmount(&mut self) -> Option<ExpiryAction> {
        self.countdown
            .take()
            .map(|_| ExpiryAction::DismissCountdown)
    }
}
