//! Trait definitions for transitsync.
//!
//! Time is read through [`Clock`] so countdowns, rate-limit messages and
//! cache expiry can be driven deterministically in tests.

use chrono::Utc;
use std::fmt;

/// Source of wall-clock time in Unix epoch seconds.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time in Unix epoch seconds.
    fn now_epoch_secs(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        Utc::now().timestamp()
    }
}
