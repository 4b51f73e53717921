// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Bounded polling of long-running remote operations
//!
//! Every wait races its timer against the operation's [`Deadline`]: both the
//! caller's cancellation token and the deadline instant end the wait
//! immediately, without issuing another status check.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use cloudaccess_types::RequestId;

use crate::error::AccessKeyError;

/// Result of a single status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    /// Not terminal yet; check again after the poll interval
    Pending,
    /// Terminal success with the materialized result
    Done(T),
    /// Terminal failure of the given request
    Failed { request_id: RequestId },
}

/// Longest wait a [`Deadline`] honors; larger timeouts are clamped to it.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Time budget and cancellation signal of one orchestrator operation
#[derive(Debug, Clone)]
pub struct Deadline {
    started: Instant,
    at: Instant,
    cancel: CancellationToken,
}

impl Deadline {
    pub fn new(timeout: Duration, cancel: CancellationToken) -> Self {
        let started = Instant::now();
        Self {
            started,
            at: started + timeout.min(MAX_TIMEOUT),
            cancel,
        }
    }

    /// Fail if the operation was cancelled or ran out of time.
    pub fn check(&self, operation: &'static str) -> Result<(), AccessKeyError> {
        if self.cancel.is_cancelled() {
            return Err(AccessKeyError::Cancelled { operation });
        }
        if Instant::now() >= self.at {
            return Err(self.timed_out(operation));
        }
        Ok(())
    }

    /// Sleep for `delay` unless cancellation or the deadline comes first.
    pub async fn sleep(&self, delay: Duration, operation: &'static str) -> Result<(), AccessKeyError> {
        self.check(operation)?;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AccessKeyError::Cancelled { operation }),
            _ = tokio::time::sleep_until(self.at) => Err(self.timed_out(operation)),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    fn timed_out(&self, operation: &'static str) -> AccessKeyError {
        AccessKeyError::Timeout {
            operation,
            waited: self.started.elapsed(),
        }
    }
}

/// Fixed-interval poller for remote request status
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    interval: Duration,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait `initial_delay`, then call `check` every poll interval until it
    /// reports a terminal status.
    ///
    /// Errors returned by `check` end the wait immediately. Callers that want
    /// to ride out transient fetch failures map them to
    /// [`PollStatus::Pending`] themselves.
    pub async fn wait<T, F, Fut>(
        &self,
        operation: &'static str,
        initial_delay: Duration,
        deadline: &Deadline,
        mut check: F,
    ) -> Result<T, AccessKeyError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<PollStatus<T>, AccessKeyError>>,
    {
        deadline.sleep(initial_delay, operation).await?;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match check().await? {
                PollStatus::Done(value) => {
                    debug!(operation, attempt, "remote operation complete");
                    return Ok(value);
                }
                PollStatus::Failed { request_id } => {
                    return Err(AccessKeyError::ProcessingFailed {
                        operation,
                        request_id,
                    });
                }
                PollStatus::Pending => {
                    debug!(
                        operation,
                        attempt,
                        interval_secs = self.interval.as_secs(),
                        "remote operation still pending"
                    );
                    deadline.sleep(self.interval, operation).await?;
                }
            }
        }
    }
}
