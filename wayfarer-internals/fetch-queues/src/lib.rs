//! Wayfarer Fetch Queues
//! Copyright (c) 2026 The Wayfarer Developers
//! Licensed and distributed under either of
//!   * MIT license (license terms at the root of the package or at http://opensource.org/licenses/MIT).
//!   * Apache v2 license (license terms at the root of the package or at http://www.apache.org/licenses/LICENSE-2.0).
//! at your option. This file may not be copied, modified, or distributed except according to those terms.

//! wayfarer-internals/fetch-queues
//! Bounded-concurrency queue for outbound site requests, with exponential backoff and jitter on transient failures

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::time;

/// Terminal outcome of a queued fetch that did not succeed
#[derive(Debug, Error)]
pub enum FetchQueueError {
    #[error("gave up after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },
    #[error("aborted: {0}")]
    Aborted(#[source] anyhow::Error),
    #[error("queue is closed")]
    Closed,
}

impl FetchQueueError {
    /// The last underlying error, if any
    pub fn last_error(&self) -> Option<&anyhow::Error> {
        match self {
            FetchQueueError::Exhausted { source, .. } => Some(source),
            FetchQueueError::Aborted(e) => Some(e),
            FetchQueueError::Closed => None,
        }
    }
}

/// Error returned by a single attempt.
///
/// `Retry` is scheduled again after a backoff delay, `Abort` stops immediately.
/// `anyhow::Error` converts into `Retry` so `.context(..)?` inside an attempt
/// keeps network hiccups retryable.
#[derive(Debug)]
pub enum AttemptError {
    Retry(anyhow::Error),
    Abort(anyhow::Error),
}

impl AttemptError {
    pub fn abort(e: impl Into<anyhow::Error>) -> Self {
        AttemptError::Abort(e.into())
    }
}

impl From<anyhow::Error> for AttemptError {
    fn from(e: anyhow::Error) -> Self {
        AttemptError::Retry(e)
    }
}

/// Backoff schedule between attempts
#[derive(Clone, Debug)]
pub struct Backoff {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub jitter_factor: f64,
    pub max_retries: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            jitter_factor: 0.5,
            max_retries: 2,
        }
    }
}

impl Backoff {
    /// Delay before retry number `retry` (1-based), jitter not applied
    pub fn base_delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter_factor <= 0.0 {
            return delay;
        }
        let jitter_ms = (delay.as_millis() as f64 * self.jitter_factor) as u64;
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        delay + Duration::from_millis(extra)
    }
}

/// A queue that bounds how many fetches run at once and retries transient failures
///
/// # Examples
///
/// ```ignore
/// let queue = FetchQueue::new(8);
/// let body = queue.run(|| async { Ok(fetch(url).await.context("fetch")?) }).await?;
/// ```
#[derive(Clone, Debug)]
pub struct FetchQueue {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    backoff: Backoff,
}

impl Default for FetchQueue {
    fn default() -> Self {
        Self::new(8)
    }
}

impl FetchQueue {
    /// Create a queue allowing `max_concurrent` fetches in flight (at least 1)
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Number of fetches currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.max_concurrent - self.permits.available_permits()
    }

    /// Stop admitting new fetches. Running ones finish normally.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Run `attempt` inside a concurrency slot, retrying `AttemptError::Retry` with backoff
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Result<T, FetchQueueError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, AttemptError>> + Send,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FetchQueueError::Closed)?;

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Abort(e)) => return Err(FetchQueueError::Aborted(e)),
                Err(AttemptError::Retry(e)) => {
                    if attempts > self.backoff.max_retries {
                        return Err(FetchQueueError::Exhausted {
                            attempts,
                            source: e,
                        });
                    }
                    let delay = self.backoff.jittered(self.backoff.base_delay(attempts));
                    tracing::debug!(attempt = attempts, ?delay, error = %e, "[fetch_queue] retrying");
                    time::sleep(delay).await;
                }
            }
        }
    }
}
