//! Randomized pacing and retry of read-only queries

use crate::error::{MinterError, MinterResult};

use rand::Rng;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{error, info};

/// Inclusive `[min, max]` range sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "[u64; 2]")]
pub struct RandomRange {
    min: u64,
    max: u64,
}

impl RandomRange {
    pub fn new(min: u64, max: u64) -> MinterResult<Self> {
        if min > max {
            return Err(MinterError::Config(format!(
                "range [{}, {}] has min above max",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        rng.gen_range(self.min..=self.max)
    }
}

impl TryFrom<[u64; 2]> for RandomRange {
    type Error = MinterError;

    fn try_from([min, max]: [u64; 2]) -> Result<Self, Self::Error> {
        Self::new(min, max)
    }
}

impl fmt::Display for RandomRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Sleeps between tasks and after errors, and retries read-only queries
#[derive(Debug, Clone)]
pub struct Pacer {
    /// Pause after each mint, in seconds
    task: RandomRange,
    /// Backoff after an error, in seconds
    error: RandomRange,
    /// Give up on a failing read-only query after this long; `None` retries forever
    query_timeout: Option<Duration>,
}

impl Pacer {
    pub fn new(task: RandomRange, error: RandomRange, query_timeout: Option<Duration>) -> Self {
        Self {
            task,
            error,
            query_timeout,
        }
    }

    pub async fn task_pause<R: Rng + ?Sized>(&self, who: &str, rng: &mut R) {
        Self::pause(self.task, who, rng).await;
    }

    pub async fn error_pause<R: Rng + ?Sized>(&self, who: &str, rng: &mut R) {
        Self::pause(self.error, who, rng).await;
    }

    async fn pause<R: Rng + ?Sized>(range: RandomRange, who: &str, rng: &mut R) {
        let secs = range.sample(rng);
        info!("[{}] sleeping {} s", who, secs);
        sleep(Duration::from_secs(secs)).await;
    }

    /// Run `op` until it succeeds, backing off on every error.
    ///
    /// With a query timeout configured the loop ends with
    /// [`MinterError::Timeout`] once that much time has passed since the
    /// first call.
    pub async fn retry_query<T, F, Fut, R>(
        &self,
        who: &str,
        operation: &str,
        rng: &mut R,
        mut op: F,
    ) -> MinterResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = MinterResult<T>>,
        R: Rng + ?Sized,
    {
        let started = Instant::now();
        let timed_out = || {
            error!("[{}] {} timed out", who, operation);
            MinterError::Timeout {
                operation: operation.to_string(),
            }
        };

        loop {
            let result = match self.query_timeout {
                // a call that never returns is bounded by what is left of the limit
                Some(limit) => timeout(limit.saturating_sub(started.elapsed()), op())
                    .await
                    .map_err(|_| timed_out())?,
                None => op().await,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) => {
                    error!("[{}] {} failed: {}", who, operation, e);

                    if let Some(limit) = self.query_timeout {
                        if started.elapsed() >= limit {
                            return Err(timed_out());
                        }
                    }

                    self.error_pause(who, rng).await;
                }
            }
        }
    }
}
