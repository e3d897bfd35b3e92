use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff as _;

use super::config::ReconnectConfig;

/// Attempt and delay bookkeeping for redials.
///
/// Owned by the session and only touched under its lock. Each scheduled redial consumes one
/// attempt; a successful connect hands the budget back through [`ReconnectState::reset`].
#[derive(Debug)]
pub(crate) struct ReconnectState {
    attempts: u32,
    max_attempts: u32,
    max_delay: Duration,
    backoff: ExponentialBackoff,
}

impl ReconnectState {
    pub(crate) fn new(config: &ReconnectConfig) -> Self {
        Self {
            attempts: 0,
            max_attempts: config.max_attempts,
            max_delay: config.max_delay.max(config.effective_delay()),
            backoff: ExponentialBackoff::from(config),
        }
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    pub(crate) fn reset(&mut self) {
        self.attempts = 0;
        self.backoff.reset();
    }

    /// Claims the next attempt, returning its number and the delay to wait before dialing.
    ///
    /// Returns `None` once `max_attempts` (when nonzero) attempts have been claimed since the
    /// last reset.
    pub(crate) fn next(&mut self) -> Option<(u32, Duration)> {
        if self.max_attempts > 0 && self.attempts >= self.max_attempts {
            return None;
        }

        self.attempts = self.attempts.saturating_add(1);
        let delay = self.backoff.next_backoff().unwrap_or(self.max_delay);

        Some((self.attempts, delay))
    }
}
