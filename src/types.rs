//! Configuration and control types for key generation

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{PaillierError, Result};

/// Configuration for Paillier key generation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyGenConfig {
    /// Number of Miller-Rabin rounds for primality testing
    pub primality_test_rounds: usize,
    /// Candidates tried per prime before giving up
    pub max_prime_attempts: usize,
    /// Prime pairs tried before giving up. A pair is resampled when
    /// `p = q` or when `n` misses the requested bit length.
    pub max_prime_pair_attempts: usize,
    /// Candidates tried for the generator `g` before giving up
    pub max_generator_attempts: usize,
    /// Wall-clock bound on the whole generation
    pub deadline: Option<Duration>,
}

impl Default for KeyGenConfig {
    fn default() -> Self {
        KeyGenConfig {
            primality_test_rounds: 20,
            max_prime_attempts: 100_000,
            max_prime_pair_attempts: 64,
            max_generator_attempts: 1_000,
            deadline: None,
        }
    }
}

impl KeyGenConfig {
    /// Same as the default configuration, with a deadline
    pub fn with_deadline(deadline: Duration) -> Self {
        KeyGenConfig {
            deadline: Some(deadline),
            ..Default::default()
        }
    }
}

/// Shared flag used to abort a running key generation from another thread
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone of the token observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl fmt::Display for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CancellationToken(cancelled: {})", self.is_cancelled())
    }
}

/// Checked between sampling attempts during key generation
pub(crate) struct Interrupt<'a> {
    token: Option<&'a CancellationToken>,
    deadline: Option<Instant>,
}

impl<'a> Interrupt<'a> {
    pub(crate) fn new(config: &KeyGenConfig, token: Option<&'a CancellationToken>) -> Self {
        Interrupt {
            token,
            deadline: config.deadline.map(|d| Instant::now() + d),
        }
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.token.is_some_and(CancellationToken::is_cancelled) {
            return Err(PaillierError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(PaillierError::Cancelled);
        }
        Ok(())
    }
}
