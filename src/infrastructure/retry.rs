// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed-delay retry loops
//!
//! A loop runs an operation up to a fixed number of attempts with a constant delay in
//! between. Every error is retried unless the loop is given a narrower classifier; errors
//! that classifier rejects are returned immediately. A loop can also be bound to a
//! cancellation token and an overall deadline.
//!
//! ```ignore
//! let meta = RetryLoop::loud("Get Cluster configuration")
//!     .with_cancellation(token)
//!     .run(|| fetcher.fetch_once())
//!     .await?;
//! ```

use crate::infrastructure::constants::{LOOP_DELAY_SECS, LOUD_LOOP_ATTEMPTS, SILENT_LOOP_ATTEMPTS};
use crate::shared::error::{ConfigError, Result};
use backon::{ConstantBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Which failures a loop retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryPolicy {
    /// Retry every error, including deterministic validation failures
    #[default]
    Uniform,
    /// Retry only errors reported as retryable by [`ConfigError::is_retryable`]
    Classified,
}

impl RetryPolicy {
    pub fn classifier(self) -> fn(&ConfigError) -> bool {
        match self {
            RetryPolicy::Classified => ConfigError::is_retryable,
            RetryPolicy::Uniform => retry_everything,
        }
    }
}

fn retry_everything(_: &ConfigError) -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Runs inside a named span and reports each failed attempt
    Loud,
    /// Reports only at debug level
    Silent,
}

#[derive(Debug, Clone)]
pub struct RetryLoop {
    name: String,
    mode: LoopMode,
    attempts: u32,
    delay: Duration,
    classifier: fn(&ConfigError) -> bool,
    cancel: Option<CancellationToken>,
    deadline: Option<Duration>,
}

impl RetryLoop {
    pub fn loud(name: impl Into<String>) -> Self {
        Self::with_mode(name, LoopMode::Loud, LOUD_LOOP_ATTEMPTS)
    }

    pub fn silent(name: impl Into<String>) -> Self {
        Self::with_mode(name, LoopMode::Silent, SILENT_LOOP_ATTEMPTS)
    }

    fn with_mode(name: impl Into<String>, mode: LoopMode, attempts: u32) -> Self {
        Self {
            name: name.into(),
            mode,
            attempts,
            delay: Duration::from_secs(LOOP_DELAY_SECS),
            classifier: RetryPolicy::default().classifier(),
            cancel: None,
            deadline: None,
        }
    }

    /// Total attempts, including the first one. Zero is treated as one.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.classifier = policy.classifier();
        self
    }

    /// Replace the retryable/terminal decision with a custom hook.
    pub fn with_classifier(mut self, classifier: fn(&ConfigError) -> bool) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Upper bound on the whole loop, sleeps included.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> LoopMode {
        self.mode
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `operation` until it succeeds, returns a terminal error, or the loop gives up.
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.mode {
            LoopMode::Loud => {
                let span = info_span!("retry_loop", name = %self.name);
                async {
                    info!(attempts = self.attempts, "Starting: {}", self.name);
                    self.drive(operation).await
                }
                .instrument(span)
                .await
            }
            LoopMode::Silent => self.drive(operation).await,
        }
    }

    async fn drive<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempt = AtomicU32::new(0);
        let classifier = self.classifier;
        let backoff = ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times(self.attempts.saturating_sub(1) as usize);

        let retry = (|| {
            attempt.fetch_add(1, Ordering::SeqCst);
            operation()
        })
        .retry(backoff)
        .sleep(tokio::time::sleep)
        .when(|e: &ConfigError| classifier(e))
        .notify(|e: &ConfigError, delay: Duration| {
            self.report_failure(attempt.load(Ordering::SeqCst), e, delay)
        });

        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        let result = tokio::select! {
            biased;
            _ = cancelled => Err(ConfigError::Cancelled(self.name.clone())),
            _ = expired => Err(ConfigError::DeadlineExceeded {
                name: self.name.clone(),
                deadline: self.deadline.unwrap_or_default(),
            }),
            result = retry => result,
        };

        let attempts = attempt.load(Ordering::SeqCst);
        match result {
            Ok(value) => {
                if attempts > 1 {
                    self.report(format_args!(
                        "{}: succeeded after {} attempts",
                        self.name, attempts
                    ));
                }
                Ok(value)
            }
            Err(e @ (ConfigError::Cancelled(_) | ConfigError::DeadlineExceeded { .. })) => {
                warn!(operation = %self.name, attempts, "{}", e);
                Err(e)
            }
            Err(e) if !classifier(&e) => {
                debug!(
                    operation = %self.name,
                    attempts,
                    error = %e,
                    "Terminal error, not retrying"
                );
                Err(e)
            }
            Err(e) => {
                match self.mode {
                    LoopMode::Loud => error!(
                        operation = %self.name,
                        attempts,
                        error = %e,
                        "Operation failed after max retries"
                    ),
                    LoopMode::Silent => debug!(
                        operation = %self.name,
                        attempts,
                        error = %e,
                        "Operation failed after max retries"
                    ),
                }
                Err(ConfigError::RetryExhausted {
                    name: self.name.clone(),
                    attempts,
                    source: Box::new(e),
                })
            }
        }
    }

    fn report_failure(&self, attempt: u32, e: &ConfigError, delay: Duration) {
        match self.mode {
            LoopMode::Loud => warn!(
                operation = %self.name,
                attempt,
                max_attempts = self.attempts,
                error = %e,
                delay_secs = delay.as_secs_f64(),
                "Attempt failed, retrying"
            ),
            LoopMode::Silent => debug!(
                operation = %self.name,
                attempt,
                max_attempts = self.attempts,
                error = %e,
                "Attempt failed, retrying"
            ),
        }
    }

    fn report(&self, message: std::fmt::Arguments<'_>) {
        match self.mode {
            LoopMode::Loud => info!("{}", message),
            LoopMode::Silent => debug!("{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn transient() -> ConfigError {
        ConfigError::remote_fetch(
            "kube-system",
            "d8-cluster-configuration",
            "k",
            "connection refused",
        )
    }

    fn fast(retry: RetryLoop) -> RetryLoop {
        retry.with_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_defaults() {
        let loud = RetryLoop::loud("loud");
        assert_eq!(loud.attempts(), 10);
        assert_eq!(loud.delay(), Duration::from_secs(5));
        assert_eq!(loud.mode(), LoopMode::Loud);

        let silent = RetryLoop::silent("silent");
        assert_eq!(silent.attempts(), 5);
        assert_eq!(silent.delay(), Duration::from_secs(5));
        assert_eq!(silent.mode(), LoopMode::Silent);

        assert_eq!(RetryLoop::loud("x").with_attempts(0).attempts(), 1);
    }

    #[tokio::test]
    async fn test_succeeds_immediately() {
        let result = fast(RetryLoop::loud("op")).run(|| async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_succeeds_on_last_attempt() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let result = fast(RetryLoop::loud("op"))
            .run(|| {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 9 {
                        Err(transient())
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let result: Result<()> = fast(RetryLoop::silent("op"))
            .run(|| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(transient())
                }
            })
            .await;

        match result {
            Err(ConfigError::RetryExhausted { attempts, source, .. }) => {
                assert_eq!(attempts, 5);
                assert!(matches!(*source, ConfigError::RemoteFetch { .. }));
            }
            other => panic!("expected RetryExhausted, got {:?}", other),
        }
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_classified_policy_stops_on_terminal_error() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let result: Result<()> = fast(RetryLoop::loud("op"))
            .with_policy(RetryPolicy::Classified)
            .run(|| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(ConfigError::unknown_kind("Mystery"))
                }
            })
            .await;

        assert!(matches!(result, Err(ConfigError::UnknownKind(_))));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_policy_retries_terminal_errors() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let result: Result<()> = fast(RetryLoop::loud("op"))
            .with_attempts(3)
            .run(|| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(ConfigError::unknown_kind("Mystery"))
                }
            })
            .await;

        assert!(matches!(
            result,
            Err(ConfigError::RetryExhausted { attempts: 3, .. })
        ));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();

        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let result: Result<()> = RetryLoop::loud("op")
            .with_cancellation(token)
            .run(|| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(transient())
                }
            })
            .await;

        assert!(matches!(result, Err(ConfigError::Cancelled(_))));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_sleep() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            child.cancel();
        });

        let result: Result<()> = RetryLoop::loud("op")
            .with_cancellation(token)
            .run(|| async { Err(transient()) })
            .await;

        assert!(matches!(result, Err(ConfigError::Cancelled(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let result: Result<()> = RetryLoop::silent("op")
            .with_deadline(Duration::from_secs(7))
            .run(|| async { Err(transient()) })
            .await;

        assert!(matches!(
            result,
            Err(ConfigError::DeadlineExceeded { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_schedule_waits_between_attempts() {
        let start = tokio::time::Instant::now();
        let result: Result<()> = RetryLoop::silent("op")
            .run(|| async { Err(transient()) })
            .await;

        assert!(matches!(
            result,
            Err(ConfigError::RetryExhausted { attempts: 5, .. })
        ));
        // four sleeps of five seconds between five attempts
        assert!(start.elapsed() >= Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_custom_classifier() {
        fn never(_: &ConfigError) -> bool {
            false
        }

        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let result: Result<()> = fast(RetryLoop::loud("op"))
            .with_classifier(never)
            .run(|| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(transient())
                }
            })
            .await;

        assert!(matches!(result, Err(ConfigError::RemoteFetch { .. })));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_policy_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: RetryPolicy,
        }
        let w: Wrapper = toml::from_str("policy = \"classified\"").unwrap();
        assert_eq!(w.policy, RetryPolicy::Classified);
        assert_eq!(RetryPolicy::default(), RetryPolicy::Uniform);
    }
}
