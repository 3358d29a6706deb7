//! Continuous-refill token bucket

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::clock::{Clock, SystemClock};
use crate::{SecurityError, SecurityResult};

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket admitting bursts of up to `capacity` and refilling at `rate` tokens per second.
///
/// Every operation refills from the elapsed time first, clamping to
/// `[0, capacity]`, so partial tokens accumulate between calls. All state
/// changes happen under one mutex; `allow` never blocks waiting for tokens.
#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    clock: Arc<dyn Clock>,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a full bucket; a non-finite or negative rate becomes 0 and capacity is at least 1
    pub fn new(rate: f64, capacity: f64) -> Self {
        let rate = if rate.is_finite() && rate >= 0.0 {
            rate
        } else {
            0.0
        };
        let capacity = if capacity.is_finite() && capacity >= 1.0 {
            capacity
        } else {
            1.0
        };
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let state = Mutex::new(BucketState {
            tokens: capacity,
            last_refill: clock.now(),
        });

        Self {
            rate,
            capacity,
            clock,
            state,
        }
    }

    /// Like [`TokenBucket::new`] but rejects parameters `new` would clamp
    pub fn try_new(rate: f64, capacity: f64) -> SecurityResult<Self> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(SecurityError::config(format!(
                "token bucket rate must be finite and non-negative (got {})",
                rate
            )));
        }
        if !capacity.is_finite() || capacity < 1.0 {
            return Err(SecurityError::config(format!(
                "token bucket capacity must be at least 1 (got {})",
                capacity
            )));
        }
        Ok(Self::new(rate, capacity))
    }

    /// Use another time source; the refill timestamp restarts at its current time
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        self.state_mut().last_refill = now;
        self.clock = clock;
        self
    }

    /// Start with `tokens` instead of a full bucket
    pub fn with_initial_tokens(mut self, tokens: f64) -> Self {
        let capacity = self.capacity;
        let tokens = if tokens.is_finite() { tokens } else { 0.0 };
        self.state_mut().tokens = tokens.clamp(0.0, capacity);
        self
    }

    /// Take one token if available
    pub fn allow(&self) -> bool {
        let mut state = self.lock();
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Current token count after refilling
    pub fn tokens(&self) -> f64 {
        let mut state = self.lock();
        self.refill(&mut state);
        state.tokens
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Time until one whole token is available; `None` when the bucket never refills
    /// or the wait does not fit in a `Duration`
    pub fn time_until_available(&self) -> Option<Duration> {
        let mut state = self.lock();
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            return Some(Duration::ZERO);
        }
        if self.rate <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64((1.0 - state.tokens) / self.rate).ok()
    }

    fn refill(&self, state: &mut BucketState) {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).clamp(0.0, self.capacity);
        state.last_refill = now;
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut BucketState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}
