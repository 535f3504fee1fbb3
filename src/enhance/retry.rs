use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;
use tokio::time::sleep;

use crate::enhance::Enhancer;
use crate::error::MigrateError;

/// Wraps an enhancer with bounded retries.
///
/// The delay grows linearly with the attempt number, matching the pacing the
/// vendor rate limits respond to in practice.
pub struct RetryingEnhancer {
    inner: Box<dyn Enhancer>,
    attempts: u32,
    delay_ms: u64,
}

impl RetryingEnhancer {
    pub fn new(inner: Box<dyn Enhancer>, attempts: u32, delay_ms: u64) -> Self {
        RetryingEnhancer {
            inner,
            attempts: attempts.max(1),
            delay_ms,
        }
    }

    /// Log the failure and, unless this was the final attempt, wait out the
    /// backoff delay. Returns whether another attempt should run.
    async fn note_failure(&self, attempt: u32, error: &MigrateError) -> bool {
        warn!(
            "Enhancer {} failed (attempt {}/{}): {}",
            self.inner.provider_name(),
            attempt,
            self.attempts,
            error
        );
        if attempt < self.attempts {
            let delay = Duration::from_millis(self.delay_ms * attempt as u64);
            debug!("Waiting {:?} before retry", delay);
            sleep(delay).await;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl Enhancer for RetryingEnhancer {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, MigrateError> {
        let mut last_error = None;
        for attempt in 1..=self.attempts {
            match self.inner.complete(system_prompt, user_content).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    self.note_failure(attempt, &e).await;
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| MigrateError::Enhancement("no attempts were made".to_string())))
    }

    async fn complete_with_image(
        &self,
        system_prompt: &str,
        image_bytes: &[u8],
        mime: &str,
    ) -> Result<String, MigrateError> {
        let mut last_error = None;
        for attempt in 1..=self.attempts {
            match self
                .inner
                .complete_with_image(system_prompt, image_bytes, mime)
                .await
            {
                Ok(result) => return Ok(result),
                Err(e) => {
                    self.note_failure(attempt, &e).await;
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| MigrateError::Enhancement("no attempts were made".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FlakyEnhancer {
        calls: Arc<AtomicU32>,
        succeed_on: u32,
    }

    #[async_trait]
    impl Enhancer for FlakyEnhancer {
        fn provider_name(&self) -> &str {
            "flaky"
        }

        async fn complete(&self, _: &str, _: &str) -> Result<String, MigrateError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= self.succeed_on {
                Ok("ok".to_string())
            } else {
                Err(MigrateError::Enhancement("transient".to_string()))
            }
        }

        async fn complete_with_image(
            &self,
            _: &str,
            _: &[u8],
            _: &str,
        ) -> Result<String, MigrateError> {
            self.complete("", "").await
        }
    }

    fn flaky(calls: &Arc<AtomicU32>, succeed_on: u32) -> Box<FlakyEnhancer> {
        Box::new(FlakyEnhancer {
            calls: calls.clone(),
            succeed_on,
        })
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let retrying = RetryingEnhancer::new(flaky(&calls, 3), 3, 1);

        let result = retrying.complete("p", "c").await.unwrap();
        assert_eq!(result, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let retrying = RetryingEnhancer::new(flaky(&calls, 10), 2, 1);

        let result = retrying.complete("p", "c").await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_image_completion_retries_too() {
        let calls = Arc::new(AtomicU32::new(0));
        let retrying = RetryingEnhancer::new(flaky(&calls, 2), 3, 1);

        let result = retrying
            .complete_with_image("p", b"bytes", "image/png")
            .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_clamped_to_one() {
        let calls = Arc::new(AtomicU32::new(0));
        let retrying = RetryingEnhancer::new(flaky(&calls, 1), 0, 1);

        let result = retrying.complete("p", "c").await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
