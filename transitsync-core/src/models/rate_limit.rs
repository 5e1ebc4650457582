//! Rate-limit countdown state surfaced to consumers.

use serde::{Deserialize, Serialize};

/// Largest countdown the `MM:SS` label can show.
pub const MAX_COUNTDOWN_SECS: u64 = 99 * 60 + 59;

/// Snapshot of an active (or just finished) rate-limit cooldown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    /// Message to show next to the retry action.
    pub message: String,
    /// Seconds until the upstream limit resets.
    pub remaining_seconds: u64,
    /// Zero-padded `MM:SS` countdown.
    pub countdown_label: String,
}

impl RateLimitState {
    /// Creates a state for the given remaining seconds.
    pub fn new(message: impl Into<String>, remaining_seconds: u64) -> Self {
        Self {
            message: message.into(),
            remaining_seconds,
            countdown_label: format_countdown(remaining_seconds),
        }
    }

    /// Creates a state that allows retrying immediately.
    pub fn ready(message: impl Into<String>) -> Self {
        Self::new(message, 0)
    }

    /// Returns true once the cooldown is over.
    pub fn retry_enabled(&self) -> bool {
        self.remaining_seconds == 0
    }
}

/// Formats seconds as `MM:SS`, saturating at `99:59`.
pub fn format_countdown(remaining_seconds: u64) -> String {
    let capped = remaining_seconds.min(MAX_COUNTDOWN_SECS);
    format!("{:02}:{:02}", capped / 60, capped % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(5), "00:05");
        assert_eq!(format_countdown(65), "01:05");
        assert_eq!(format_countdown(600), "10:00");
    }

    #[test]
    fn test_format_countdown_caps_at_99_minutes() {
        assert_eq!(format_countdown(MAX_COUNTDOWN_SECS), "99:59");
        assert_eq!(format_countdown(100 * 60), "99:59");
    }

    #[test]
    fn test_retry_enabled_only_at_zero() {
        assert!(!RateLimitState::new("wait", 1).retry_enabled());
        assert!(RateLimitState::ready("go").retry_enabled());
    }
}
