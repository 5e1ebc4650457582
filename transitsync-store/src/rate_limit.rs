//! Rate-limit countdown.
//!
//! [`RateLimitMonitor`] turns rate-limit failures into a once-per-second
//! countdown published on a watch channel. At most one countdown runs at a
//! time; a new reset time replaces the running one.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use transitsync_core::{format_countdown, Clock, RateLimitState, SystemClock};
use transitsync_fetch::PageError;

/// Tick of the countdown.
const TICK: Duration = Duration::from_secs(1);

#[derive(Default)]
struct Countdown {
    reset_at: Option<i64>,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.reset_at = None;
    }
}

// ============================================================================
// Rate Limit Monitor
// ============================================================================

/// Publishes the rate-limit cooldown of one consumer.
///
/// Starting a countdown spawns a task, so [`Self::on_rate_limit`] and
/// [`Self::observe`] must be called from within a tokio runtime.
pub struct RateLimitMonitor {
    state: Arc<watch::Sender<Option<RateLimitState>>>,
    countdown: Mutex<Countdown>,
    clock: Arc<dyn Clock>,
}

impl Default for RateLimitMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RateLimitMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitMonitor")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl RateLimitMonitor {
    /// Creates a monitor using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a monitor with an explicit clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
            countdown: Mutex::new(Countdown::default()),
            clock,
        }
    }

    /// Subscribes to countdown states; `None` means not rate limited.
    pub fn subscribe(&self) -> watch::Receiver<Option<RateLimitState>> {
        self.state.subscribe()
    }

    /// Returns the latest state.
    pub fn current(&self) -> Option<RateLimitState> {
        self.state.borrow().clone()
    }

    /// Returns true while a countdown has time left.
    pub fn is_cooling_down(&self) -> bool {
        self.state
            .borrow()
            .as_ref()
            .is_some_and(|s| !s.retry_enabled())
    }

    /// Forwards rate-limit failures; other errors are ignored.
    pub fn observe(&self, err: &PageError) {
        if let PageError::RateLimited { reset_at, message } = err {
            self.on_rate_limit(*reset_at, message);
        }
    }

    /// Starts (or keeps) the countdown towards `reset_at`.
    ///
    /// A repeat of the reset time already being counted down is ignored.
    /// Without a reset time the countdown is cancelled and a single
    /// retry-ready state carrying `message` is published.
    pub fn on_rate_limit(&self, reset_at: Option<i64>, message: &str) {
        let mut countdown = self.countdown.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(reset_at) = reset_at else {
            countdown.cancel();
            self.state.send_replace(Some(RateLimitState::ready(message)));
            info!("Rate limited without reset time");
            return;
        };

        if countdown.reset_at == Some(reset_at) && countdown.is_active() {
            return;
        }

        countdown.cancel();
        countdown.reset_at = Some(reset_at);

        let remaining = remaining_seconds(reset_at, self.clock.now_epoch_secs());
        self.state
            .send_replace(Some(countdown_state(remaining, message)));
        info!(reset_at, remaining, "Rate limit countdown started");

        if remaining > 0 {
            countdown.task = Some(tokio::spawn(run_countdown(
                Arc::clone(&self.state),
                Arc::clone(&self.clock),
                reset_at,
                message.to_string(),
            )));
        }
    }

    /// Cancels any countdown and clears the published state.
    pub fn clear(&self) {
        self.countdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
        self.state.send_replace(None);
    }
}

impl Drop for RateLimitMonitor {
    fn drop(&mut self) {
        self.countdown
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

async fn run_countdown(
    state: Arc<watch::Sender<Option<RateLimitState>>>,
    clock: Arc<dyn Clock>,
    reset_at: i64,
    message: String,
) {
    loop {
        tokio::time::sleep(TICK).await;
        let remaining = remaining_seconds(reset_at, clock.now_epoch_secs());
        state.send_replace(Some(countdown_state(remaining, &message)));
        if remaining == 0 {
            debug!(reset_at, "Rate limit countdown finished");
            break;
        }
    }
}

/// Seconds left until `reset_at`, never negative.
#[allow(clippy::cast_sign_loss)]
pub fn remaining_seconds(reset_at: i64, now: i64) -> u64 {
    reset_at.saturating_sub(now).max(0) as u64
}

fn countdown_state(remaining: u64, final_message: &str) -> RateLimitState {
    if remaining > 0 {
        RateLimitState::new(
            format!("Rate limit exceeded. Retry in {}.", format_countdown(remaining)),
            remaining,
        )
    } else {
        RateLimitState::ready(final_message)
    }
}
