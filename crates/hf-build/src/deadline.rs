// SPDX-License-Identifier: MIT

use std::time::{Duration, Instant};

/// A point in time an external call must finish by.
///
/// Handed to the enhancer and screenshot capabilities so each request can
/// size its own timeout from what is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    /// Time left, or `None` once the deadline has passed.
    #[must_use]
    pub fn remaining(self) -> Option<Duration> {
        self.0
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
    }

    #[must_use]
    pub fn expired(self) -> bool {
        self.remaining().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_deadline_has_time_left() {
        let deadline = Deadline::after(Duration::from_secs(60));
        assert!(!deadline.expired());
        assert!(deadline.remaining().unwrap() <= Duration::from_secs(60));
    }

    #[test]
    fn zero_timeout_is_expired() {
        assert!(Deadline::after(Duration::ZERO).expired());
    }
}
