//! Bounded retry for opening files on a flaky share
//!
//! A missing file is final and returns `None` at once. Anything else is
//! treated as transient and retried with a fixed delay until the attempt
//! budget runs out, after which the last error is returned.

use crate::fs::{FileSystem, PackageRead};
use backoff::backoff::Backoff;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Attempt budget and delay for [`open_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    fn backoff(&self) -> FixedBackoff {
        FixedBackoff::new(*self)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}

/// Constant delay that stops after `max_attempts - 1` waits.
#[derive(Debug)]
struct FixedBackoff {
    policy: RetryPolicy,
    waits_left: u32,
}

impl FixedBackoff {
    fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            waits_left: policy.max_attempts.saturating_sub(1),
        }
    }
}

impl Backoff for FixedBackoff {
    fn reset(&mut self) {
        self.waits_left = self.policy.max_attempts.saturating_sub(1);
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.waits_left == 0 {
            return None;
        }
        self.waits_left -= 1;
        Some(self.policy.delay)
    }
}

/// Run `open` until it succeeds, reports `NotFound`, or the budget is spent.
///
/// The calling thread sleeps between attempts; there is no cancellation.
pub fn open_with_retry<T>(
    path: &Path,
    policy: RetryPolicy,
    mut open: impl FnMut() -> io::Result<T>,
) -> io::Result<Option<T>> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    let result = backoff::retry(policy.backoff(), || {
        attempt += 1;
        match open() {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::error!(path = %path.display(), "File not found");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    attempt,
                    max_attempts,
                    error = %e,
                    "Unable to open file"
                );
                if attempt < max_attempts {
                    tracing::debug!(
                        delay_ms = policy.delay.as_millis() as u64,
                        "Failed to open file; will try again"
                    );
                }
                Err(backoff::Error::transient(e))
            }
        }
    });

    match result {
        Ok(value) => Ok(value),
        Err(backoff::Error::Permanent(e)) | Err(backoff::Error::Transient { err: e, .. }) => Err(e),
    }
}

/// [`open_with_retry`] bound to [`FileSystem::open_read`].
pub fn open_read_with_retry(
    fs: &dyn FileSystem,
    path: &Path,
    policy: RetryPolicy,
) -> io::Result<Option<Box<dyn PackageRead>>> {
    open_with_retry(path, policy, || fs.open_read(path))
}
