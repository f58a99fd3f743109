//! Bounded retry with exponential back-off.
//!
//! Two shapes are needed by the scrapers:
//!
//! - [`retry_until`] repeats one operation until its result is acceptable
//!   (menu frame discovery).
//! - [`retry_batch`] runs a pass over a set of items, deferring failures to
//!   the next pass (order line entry).

use std::future::Future;
use std::time::Duration;

use crate::error::BrowserError;

const MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts (or passes), including the first. Never zero.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub backoff: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Delay before retry number `retry` (1-based), capped and jittered ±25 %.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base_ms = u64::try_from(self.backoff.as_millis()).unwrap_or(u64::MAX);
        let computed = base_ms.saturating_mul(1u64 << retry.saturating_sub(1).min(10));
        let capped = computed.min(u64::try_from(MAX_DELAY.as_millis()).unwrap_or(u64::MAX));
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        Duration::from_millis(jittered)
    }
}

/// Runs `operation` until `accept` approves its value or attempts run out.
///
/// Errors count as failed attempts. On exhaustion the last error is returned
/// if the final attempt errored, otherwise [`BrowserError::Exhausted`].
/// `between` runs before every retry (e.g. a page reload); its errors are
/// logged and the next attempt still runs.
///
/// # Errors
///
/// See above.
pub async fn retry_until<T, Op, OpFut, Between, BetweenFut, Accept>(
    policy: RetryPolicy,
    label: &str,
    mut operation: Op,
    mut between: Between,
    accept: Accept,
) -> Result<T, BrowserError>
where
    Op: FnMut() -> OpFut,
    OpFut: Future<Output = Result<T, BrowserError>>,
    Between: FnMut() -> BetweenFut,
    BetweenFut: Future<Output = Result<(), BrowserError>>,
    Accept: Fn(&T) -> bool,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let outcome = operation().await;
        let failure = match outcome {
            Ok(value) if accept(&value) => return Ok(value),
            Ok(_) => None,
            Err(err) => Some(err),
        };

        if attempt >= policy.max_attempts {
            return Err(failure.unwrap_or_else(|| BrowserError::Exhausted {
                label: label.to_owned(),
                attempts: attempt,
            }));
        }

        let delay = policy.delay_for(attempt);
        tracing::warn!(
            label,
            attempt,
            max_attempts = policy.max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = ?failure,
            "attempt did not succeed, retrying"
        );
        tokio::time::sleep(delay).await;

        if let Err(err) = between().await {
            tracing::warn!(label, attempt, error = %err, "retry preparation failed");
        }
    }
}

/// Result of [`retry_batch`]: both halves keep input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome<K> {
    pub succeeded: Vec<K>,
    pub failed: Vec<K>,
}

/// Runs `operation` over every pending item per pass, deferring items that
/// fail (or return `false`) to the next pass, for at most
/// `policy.max_attempts` passes.
///
/// Items are never retried after they succeed. The two output lists
/// partition `items` and each preserves input order.
pub async fn retry_batch<K, Op, Fut>(
    policy: RetryPolicy,
    label: &str,
    items: &[K],
    mut operation: Op,
) -> BatchOutcome<K>
where
    K: Clone,
    Op: FnMut(K) -> Fut,
    Fut: Future<Output = Result<bool, BrowserError>>,
{
    let mut done = vec![false; items.len()];
    let mut pending: Vec<usize> = (0..items.len()).collect();

    for pass in 1..=policy.max_attempts {
        if pending.is_empty() {
            break;
        }
        if pass > 1 {
            tokio::time::sleep(policy.delay_for(pass - 1)).await;
        }

        let mut deferred = Vec::new();
        for idx in pending {
            match operation(items[idx].clone()).await {
                Ok(true) => done[idx] = true,
                Ok(false) => {
                    tracing::warn!(label, pass, index = idx, "item not confirmed, deferring");
                    deferred.push(idx);
                }
                Err(err) => {
                    tracing::warn!(label, pass, index = idx, error = %err, "item failed, deferring");
                    deferred.push(idx);
                }
            }
        }
        pending = deferred;
    }

    let mut outcome = BatchOutcome {
        succeeded: Vec::new(),
        failed: Vec::new(),
    };
    for (item, ok) in items.iter().zip(done) {
        if ok {
            outcome.succeeded.push(item.clone());
        } else {
            outcome.failed.push(item.clone());
        }
    }
    outcome
}
