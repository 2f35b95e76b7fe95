//! Waiting primitives for page interaction
//!
//! Pages load asynchronously, so most stages wait for something. Waits come
//! in two kinds:
//! - soft-deadline polling ([`Poller`]): probe, sleep, and when the deadline
//!   passes hand control back to the caller for a recovery action (refresh)
//!   and start a new cycle;
//! - hard deadlines ([`with_deadline`]): the wrapped future is dropped when
//!   time runs out, which cancels whatever it was doing.
//!
//! Every wait also observes the run's [`CancellationToken`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::errors::{LeadError, LeadResult};
use crate::utils::constants::DEFAULT_POLL_INTERVAL_MS;

/// Delay schedule between probes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Delay before the first re-probe
    pub interval: Duration,
    /// Multiplier applied per attempt (1.0 = fixed interval)
    pub backoff: f64,
    /// Upper bound on any single delay
    pub max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS))
    }
}

impl PollPolicy {
    /// Constant delay between probes
    #[must_use]
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            backoff: 1.0,
            max_interval: interval,
        }
    }

    /// Delay before attempt number `attempt` (0-based)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let multiplier = self.backoff.max(1.0).powi(exponent);
        let delay_ms = (self.interval.as_millis() as f64 * multiplier).min(u64::MAX as f64) as u64;
        Duration::from_millis(delay_ms).min(self.max_interval.max(self.interval))
    }
}

/// What the caller should do after [`Poller::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Probe again
    Probe,
    /// The soft deadline passed; run the recovery action, then probe again
    DeadlineReached { cycle: u32 },
}

/// Drives one soft-deadline polling loop
///
/// ```ignore
/// let mut poller = Poller::new(&policy, &cancel).with_soft_deadline(deadline);
/// while !session.exists(&input).await? {
///     if let Tick::DeadlineReached { .. } = poller.tick().await? {
///         session.refresh().await?;
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Poller<'a> {
    policy: &'a PollPolicy,
    cancel: &'a CancellationToken,
    soft_deadline: Option<Duration>,
    cycle_started: Instant,
    attempt: u32,
    cycle: u32,
}

impl<'a> Poller<'a> {
    #[must_use]
    pub fn new(policy: &'a PollPolicy, cancel: &'a CancellationToken) -> Self {
        Self {
            policy,
            cancel,
            soft_deadline: None,
            cycle_started: Instant::now(),
            attempt: 0,
            cycle: 0,
        }
    }

    #[must_use]
    pub fn with_soft_deadline(mut self, deadline: Duration) -> Self {
        self.soft_deadline = Some(deadline);
        self
    }

    /// Completed deadline cycles so far
    #[must_use]
    pub fn cycles(&self) -> u32 {
        self.cycle
    }

    /// Sleep until the next probe is due
    ///
    /// Returns [`LeadError::Cancelled`] if the run is cancelled while waiting.
    pub async fn tick(&mut self) -> LeadResult<Tick> {
        if let Some(deadline) = self.soft_deadline
            && self.cycle_started.elapsed() >= deadline
        {
            self.cycle += 1;
            self.attempt = 0;
            self.cycle_started = Instant::now();
            return Ok(Tick::DeadlineReached { cycle: self.cycle });
        }

        let delay = self.policy.delay_for_attempt(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        settle(delay, self.cancel).await?;
        Ok(Tick::Probe)
    }
}

/// Run `operation` under a hard time limit
///
/// On expiry the operation future is dropped and
/// [`LeadError::Timeout`] is returned.
pub async fn with_deadline<F, T>(
    operation: F,
    limit: Duration,
    operation_name: &str,
    cancel: &CancellationToken,
) -> LeadResult<T>
where
    F: Future<Output = LeadResult<T>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(LeadError::Cancelled),
        result = tokio::time::timeout(limit, operation) => match result {
            Ok(result) => result,
            Err(_) => Err(LeadError::Timeout {
                operation: operation_name.to_string(),
                after: limit,
            }),
        },
    }
}

/// Pause for `duration` unless the run is cancelled first
pub async fn settle(duration: Duration, cancel: &CancellationToken) -> LeadResult<()> {
    if duration.is_zero() {
        return if cancel.is_cancelled() {
            Err(LeadError::Cancelled)
        } else {
            Ok(())
        };
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(LeadError::Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Uniformly random duration within `range`
#[must_use]
pub fn jittered(range: RangeInclusive<Duration>) -> Duration {
    let (low, high) = (*range.start(), *range.end());
    if high <= low {
        return low;
    }
    let millis = rand::rng().random_range(low.as_millis()..=high.as_millis());
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}
