//! Retry logic with exponential backoff
//!
//! Used by storage clients for idempotent requests. Only errors that
//! `StorageError::is_transient` accepts are retried.

use crate::error::StorageError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct RetryOptions {
    pub max_retries: usize,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryOptions {
    pub fn with_max_retries(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

pub async fn retry_with_backoff<T, F, Fut>(
    mut operation: F,
    options: &RetryOptions,
) -> Result<T, StorageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let mut interval = options.initial_interval;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) if error.is_transient() && attempt < options.max_retries => {
                attempt += 1;
                tracing::debug!(
                    "Transient storage error (attempt {}/{}): {}",
                    attempt,
                    options.max_retries,
                    error
                );
                sleep(interval).await;
                interval = std::cmp::min(
                    Duration::from_secs_f64(interval.as_secs_f64() * options.multiplier),
                    options.max_interval,
                );
            }
            Err(error) => return Err(error),
        }
    }
}
