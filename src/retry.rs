use anyhow::Result;
use backoff::ExponentialBackoff;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Backoff settings for API calls
pub fn get_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(100),
        max_interval: Duration::from_secs(5),
        max_elapsed_time: Some(Duration::from_secs(30)),
        multiplier: 2.0,
        randomization_factor: 0.1,
        ..Default::default()
    }
}

/// Retry an async operation with exponential backoff
pub async fn retry_async<F, Fut, T, E>(
    operation_name: &str,
    max_retries: u32,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = Duration::from_millis(100);

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= max_retries {
                    return Err(anyhow::anyhow!(
                        "{} failed after {} attempts: {}",
                        operation_name,
                        attempt,
                        e
                    ));
                }
                warn!(
                    "{} attempt {}/{} failed: {}. Retrying in {:?}",
                    operation_name, attempt, max_retries, e, delay
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(5));
            }
        }
    }
}

/// Circuit breaker for the continuous scan loop
///
/// Opens after `threshold` consecutive failures and closes again once
/// `reset_timeout` has passed, so a dead upstream doesn't get hammered
/// every cycle.
pub struct CircuitBreaker {
    failures: std::sync::atomic::AtomicU32,
    last_failure: parking_lot::Mutex<Option<std::time::Instant>>,
    threshold: u32,
    reset_timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failures: std::sync::atomic::AtomicU32::new(0),
            last_failure: parking_lot::Mutex::new(None),
            threshold,
            reset_timeout,
        }
    }

    pub fn is_open(&self) -> bool {
        let failures = self.failures.load(std::sync::atomic::Ordering::Relaxed);
        if failures < self.threshold {
            return false;
        }

        if let Some(last) = *self.last_failure.lock() {
            if last.elapsed() > self.reset_timeout {
                self.reset();
                return false;
            }
        }

        true
    }

    pub fn record_success(&self) {
        self.failures.store(0, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        *self.last_failure.lock() = Some(std::time::Instant::now());
    }

    pub fn reset(&self) {
        self.failures.store(0, std::sync::atomic::Ordering::Relaxed);
        *self.last_failure.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failure() {
        let mut attempts = 0;
        let result = retry_async("test op", 3, || {
            attempts += 1;
            let outcome: Result<u32, String> = if attempts < 2 {
                Err("transient".to_string())
            } else {
                Ok(42)
            };
            async move { outcome }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let result: Result<u32> = retry_async("test op", 2, || async {
            Err::<u32, _>("always down".to_string())
        })
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_circuit_breaker_opens_at_threshold() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        assert!(!breaker.is_open());

        breaker.record_failure();
        assert!(!breaker.is_open());

        breaker.record_failure();
        assert!(breaker.is_open());

        breaker.record_success();
        assert!(!breaker.is_open());
    }
}
