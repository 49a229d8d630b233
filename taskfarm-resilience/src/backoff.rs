//! Backoff strategies for polling workers

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the delay between polls grows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same delay before every poll
    Fixed,

    /// delay = initial_delay * attempt
    Linear,

    /// delay = initial_delay * base^(attempt-1)
    Exponential {
        /// 2.0 doubles the delay at every attempt
        base: f64,
    },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential { base: 2.0 }
    }
}

/// Stateless delay calculator
#[derive(Debug, Clone)]
pub struct BackoffCalculator {
    strategy: BackoffStrategy,
    initial_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl BackoffCalculator {
    pub fn new(
        strategy: BackoffStrategy,
        initial_delay: Duration,
        max_delay: Duration,
        jitter: bool,
    ) -> Self {
        Self {
            strategy,
            initial_delay,
            max_delay,
            jitter,
        }
    }

    /// Delay before poll number `attempt` (1-indexed), capped at the
    /// maximum delay
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let capped = self.base_delay(attempt).min(self.max_delay);
        if self.jitter {
            with_jitter(capped).min(self.max_delay)
        } else {
            capped
        }
    }

    fn base_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        match &self.strategy {
            BackoffStrategy::Fixed => self.initial_delay,
            BackoffStrategy::Linear => self.initial_delay.saturating_mul(attempt),
            BackoffStrategy::Exponential { base } => {
                let factor = base.powi(attempt as i32 - 1);
                let nanos = self.initial_delay.as_nanos() as f64 * factor;
                if !nanos.is_finite() || nanos >= self.max_delay.as_nanos() as f64 {
                    self.max_delay
                } else {
                    Duration::from_nanos(nanos as u64)
                }
            }
        }
    }
}

// Spread polls of workers that went idle together
fn with_jitter(delay: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(0.8..1.2);
    Duration::from_nanos((delay.as_nanos() as f64 * factor) as u64)
}

/// Backoff state of one polling worker.
///
/// Every empty poll moves one step further; receiving work resets it.
#[derive(Debug, Clone)]
pub struct PollBackoff {
    calculator: BackoffCalculator,
    attempt: u32,
}

impl PollBackoff {
    pub fn new(calculator: BackoffCalculator) -> Self {
        Self {
            calculator,
            attempt: 0,
        }
    }

    /// Delay to wait after another empty poll
    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        self.calculator.calculate_delay(self.attempt)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Empty polls since the last reset
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
