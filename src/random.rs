//! Uniform sampling of residues for key generation and encryption
//!
//! Each draw takes as many random bytes as the big-endian encoding of the
//! bound `n` and is rejected when it lands at or past the largest multiple
//! of `n` that fits in that byte range. The accepted value is then reduced
//! modulo `n`, which keeps the result uniform over `[0, n)`.
//!
//! Running out of draws yields `SamplingFailed`. Key generation reports it
//! as `KeyGenerationFailed` instead.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::{thread_rng, CryptoRng, RngCore};

use crate::error::{PaillierError, Result};
use crate::utils::gcd;

/// Rejection budget for a single draw. Every attempt is accepted with
/// probability above 1/2, so this is never reached with a working RNG.
const MAX_SAMPLE_ATTEMPTS: usize = 256;

/// Budget for finding a value coprime to the modulus
const MAX_COPRIME_ATTEMPTS: usize = 1_000;

/// Draw a value uniformly from `[0, n)` using the thread-local CSPRNG
pub fn sample_below(n: &BigUint) -> Result<BigUint> {
    sample_below_with_rng(&mut thread_rng(), n)
}

/// Draw a value uniformly from `[0, n)` using the given CSPRNG
pub fn sample_below_with_rng<R: RngCore + CryptoRng>(rng: &mut R, n: &BigUint) -> Result<BigUint> {
    if n.is_zero() {
        return Err(PaillierError::InvalidParameter(
            "Sampling bound must be positive".to_string(),
        ));
    }

    let len = n.to_bytes_be().len();
    let space = BigUint::one() << (8 * len);
    let limit = &space - (&space % n);

    let mut buf = vec![0u8; len];
    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        rng.fill_bytes(&mut buf);
        let candidate = BigUint::from_bytes_be(&buf);
        if candidate < limit {
            return Ok(candidate % n);
        }
    }

    Err(PaillierError::SamplingFailed(format!(
        "Rejected {} draws in a row",
        MAX_SAMPLE_ATTEMPTS
    )))
}

/// Draw a value from `[1, n)` with `gcd(r, n) = 1` using the thread-local CSPRNG
pub fn sample_coprime(n: &BigUint) -> Result<BigUint> {
    sample_coprime_with_rng(&mut thread_rng(), n)
}

/// Draw a value from `[1, n)` with `gcd(r, n) = 1` using the given CSPRNG
pub fn sample_coprime_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    n: &BigUint,
) -> Result<BigUint> {
    if n <= &BigUint::one() {
        return Err(PaillierError::InvalidParameter(
            "Coprime sampling needs a modulus greater than 1".to_string(),
        ));
    }

    for _ in 0..MAX_COPRIME_ATTEMPTS {
        let r = sample_below_with_rng(rng, n)?;
        // gcd(0, n) = n, so zero is rejected here as well
        if gcd(&r, n).is_one() {
            return Ok(r);
        }
    }

    Err(PaillierError::SamplingFailed(format!(
        "No value coprime to the modulus found after {} draws",
        MAX_COPRIME_ATTEMPTS
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_below_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = BigUint::from(1_000_003u32);

        for _ in 0..500 {
            let v = sample_below_with_rng(&mut rng, &n).unwrap();
            assert!(v < n);
        }
    }

    #[test]
    fn test_sample_below_covers_small_range() {
        // 3 does not divide 256, so a plain modulo reduction would be biased
        let mut rng = StdRng::seed_from_u64(42);
        let n = BigUint::from(3u32);
        let mut counts = [0usize; 3];

        for _ in 0..3_000 {
            let v = sample_below_with_rng(&mut rng, &n).unwrap();
            let idx = v.to_u32_digits().first().copied().unwrap_or(0) as usize;
            counts[idx] += 1;
        }

        for count in counts {
            assert!(count > 850 && count < 1_150, "skewed counts: {:?}", counts);
        }
    }

    #[test]
    fn test_sample_below_rejects_zero_bound() {
        assert!(matches!(
            sample_below(&BigUint::zero()),
            Err(PaillierError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_sample_coprime() {
        let mut rng = StdRng::seed_from_u64(3);
        // 2 * 3 * 5 * 7 leaves only a handful of units
        let n = BigUint::from(210u32);

        for _ in 0..200 {
            let r = sample_coprime_with_rng(&mut rng, &n).unwrap();
            assert!(!r.is_zero() && r < n);
            assert!(gcd(&r, &n).is_one());
        }
    }

    /// Emits the same byte forever
    struct ConstantRng(u8);

    impl RngCore for ConstantRng {
        fn next_u32(&mut self) -> u32 {
            u32::from_ne_bytes([self.0; 4])
        }

        fn next_u64(&mut self) -> u64 {
            u64::from_ne_bytes([self.0; 8])
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(self.0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for ConstantRng {}

    #[test]
    fn test_sample_below_reports_exhausted_rejections() {
        // 0xff is always at or past 255, the largest multiple of 3 below 256
        let result = sample_below_with_rng(&mut ConstantRng(0xff), &BigUint::from(3u32));
        assert!(matches!(result, Err(PaillierError::SamplingFailed(_))));
    }

    #[test]
    fn test_sample_coprime_reports_exhausted_search() {
        // Every draw is zero, which is never a unit
        let result = sample_coprime_with_rng(&mut ConstantRng(0), &BigUint::from(15u32));
        assert!(matches!(result, Err(PaillierError::SamplingFailed(_))));
    }

    #[test]
    fn test_sample_coprime_rejects_trivial_modulus() {
        assert!(sample_coprime(&BigUint::one()).is_err());
    }
}
