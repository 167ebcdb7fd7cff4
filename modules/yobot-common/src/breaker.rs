//! Circuit breaker shared by every outbound integration call.

use std::fmt;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls flow; consecutive failures are counted.
    Closed,
    /// Calls are rejected until the recovery timeout elapses.
    Open,
    /// One probe call is allowed through to test recovery.
    HalfOpen,
}

#[derive(Debug)]
pub enum BreakerError<E> {
    /// Rejected without calling the operation.
    Open { name: String },
    /// The operation ran and failed.
    Inner(E),
}

impl<E: fmt::Display> fmt::Display for BreakerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakerError::Open { name } => write!(f, "circuit '{name}' is open"),
            BreakerError::Inner(e) => e.fmt(f),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for BreakerError<E> {}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// Set while a half-open probe runs. A probe older than the recovery
    /// timeout is treated as abandoned (its future was dropped).
    probe_started: Option<Instant>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            failure_threshold: failure_threshold.max(1),
            recovery_timeout,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_started: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A closed breaker with the same threshold and recovery timeout.
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self::new(name, self.failure_threshold, self.recovery_timeout)
    }

    /// Current state. An open breaker whose timeout has elapsed reports `HalfOpen`.
    pub fn state(&self) -> BreakerState {
        let inner = self.lock();
        match (inner.state, inner.opened_at) {
            (BreakerState::Open, Some(at)) if at.elapsed() >= self.recovery_timeout => {
                BreakerState::HalfOpen
            }
            (state, _) => state,
        }
    }

    /// Run `op` unless the breaker is open.
    pub async fn call<T, E, F>(&self, op: F) -> Result<T, BreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        if !self.try_acquire() {
            return Err(BreakerError::Open {
                name: self.name.clone(),
            });
        }

        match op.await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(BreakerError::Inner(e))
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another caller panicked mid-update; the
        // counters are still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn try_acquire(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                let elapsed = inner
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.recovery_timeout);
                if elapsed {
                    inner.state = BreakerState::HalfOpen;
                    inner.probe_started = Some(Instant::now());
                    info!(breaker = %self.name, "Circuit half-open, sending probe");
                    true
                } else {
                    false
                }
            }
            BreakerState::HalfOpen => {
                let busy = inner
                    .probe_started
                    .is_some_and(|at| at.elapsed() < self.recovery_timeout);
                if busy {
                    false
                } else {
                    inner.probe_started = Some(Instant::now());
                    true
                }
            }
        }
    }

    fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != BreakerState::Closed {
            info!(breaker = %self.name, "Circuit closed");
        }
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.probe_started = None;
    }

    fn record_failure(&self) {
        let mut inner = self.lock();
        inner.probe_started = None;
        inner.consecutive_failures += 1;

        let trip = inner.state == BreakerState::HalfOpen
            || inner.consecutive_failures >= self.failure_threshold;
        if trip {
            if inner.state != BreakerState::Open {
                warn!(
                    breaker = %self.name,
                    failures = inner.consecutive_failures,
                    recovery_secs = self.recovery_timeout.as_secs_f64(),
                    "Circuit opened"
                );
            }
            inner.state = BreakerState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }
}
