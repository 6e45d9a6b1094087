//! Key generation and management

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::thread_rng;
use std::fmt;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{PaillierError, Result};
use crate::random::sample_below;
use crate::types::{CancellationToken, Interrupt, KeyGenConfig};
use crate::utils::{gcd, is_probable_prime, l_function, lcm, mod_exp, mod_inverse};

/// Below this, two distinct primes of half the size do not exist
const MIN_BIT_LENGTH: u64 = 6;

/// From this size on, primes get their top two bits set, which fixes the
/// bit length of their product. Smaller primes only get the top bit, since
/// there are too few candidates with both.
const TWO_TOP_BITS_MIN: u64 = 5;

/// Paillier public key
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PublicKey {
    pub(crate) n: BigUint, // p * q
    pub(crate) g: BigUint, // Generator in Z*_{n^2}
}

impl PublicKey {
    /// Create a public key from its components, checking them first
    pub fn from_components(n: BigUint, g: BigUint) -> Result<Self> {
        let public_key = PublicKey { n, g };
        public_key.validate()?;
        Ok(public_key)
    }

    /// Get the modulus n
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// Get the generator g
    pub fn generator(&self) -> &BigUint {
        &self.g
    }

    /// Get n^2, the modulus of the ciphertext space
    pub fn n_squared(&self) -> BigUint {
        &self.n * &self.n
    }

    /// Get the bit size of the modulus
    pub fn bit_size(&self) -> u64 {
        self.n.bits()
    }

    /// Size of the modulus in bytes
    pub fn size_bytes(&self) -> usize {
        ((self.bit_size() + 7) / 8) as usize
    }

    /// Validate the public key
    pub fn validate(&self) -> Result<()> {
        if self.n <= BigUint::one() {
            return Err(PaillierError::InvalidParameter(
                "Modulus n must be > 1".to_string(),
            ));
        }

        if !self.n.bit(0) {
            return Err(PaillierError::InvalidParameter(
                "Modulus n must be a product of odd primes".to_string(),
            ));
        }

        let n_squared = self.n_squared();
        if self.g.is_zero() || self.g >= n_squared {
            return Err(PaillierError::InvalidParameter(
                "Generator g must be in range (0, n^2)".to_string(),
            ));
        }

        if !gcd(&self.g, &n_squared).is_one() {
            return Err(PaillierError::InvalidParameter(
                "Generator g must be coprime to n^2".to_string(),
            ));
        }

        Ok(())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({} bits)", self.bit_size())
    }
}

/// Paillier private key
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrivateKey {
    pub(crate) public_key: PublicKey,
    pub(crate) lambda: BigUint, // lcm(p - 1, q - 1)
    pub(crate) mu: BigUint,     // L(g^lambda mod n^2)^-1 mod n
}

impl PrivateKey {
    /// Create a private key from its components, checking them first
    pub fn from_components(public_key: PublicKey, lambda: BigUint, mu: BigUint) -> Result<Self> {
        let private_key = PrivateKey {
            public_key,
            lambda,
            mu,
        };
        private_key.validate()?;
        Ok(private_key)
    }

    /// Get the modulus n shared with the public key
    pub fn modulus(&self) -> &BigUint {
        &self.public_key.n
    }

    /// Get the decryption exponent lambda
    pub fn lambda(&self) -> &BigUint {
        &self.lambda
    }

    /// Get the precomputed inverse mu
    pub fn mu(&self) -> &BigUint {
        &self.mu
    }

    /// Get the matching public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Validate the private key against its public key
    pub fn validate(&self) -> Result<()> {
        self.public_key.validate()?;

        let n = &self.public_key.n;
        if self.lambda.is_zero() {
            return Err(PaillierError::InvalidParameter(
                "Exponent lambda must be positive".to_string(),
            ));
        }

        if self.mu.is_zero() || &self.mu >= n {
            return Err(PaillierError::InvalidParameter(
                "Inverse mu must be in range (0, n)".to_string(),
            ));
        }

        let a = mod_exp(&self.public_key.g, &self.lambda, &self.public_key.n_squared());
        let t = l_function(&a, n).ok_or_else(|| {
            PaillierError::InvalidParameter("g^lambda mod n^2 is not 1 mod n".to_string())
        })?;

        if !((t * &self.mu) % n).is_one() {
            return Err(PaillierError::InvalidParameter(
                "mu is not the inverse of L(g^lambda mod n^2)".to_string(),
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(***)")
    }
}

/// Paillier key pair
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

impl KeyPair {
    /// Generate a new Paillier key pair with a modulus of `bit_length` bits
    ///
    /// # Example
    ///
    /// ```rust
    /// use phe::KeyPair;
    ///
    /// let keypair = KeyPair::generate(512).expect("Failed to generate keys");
    /// assert_eq!(keypair.bit_size(), 512);
    /// ```
    pub fn generate(bit_length: u64) -> Result<Self> {
        Self::generate_with_config(bit_length, &KeyGenConfig::default())
    }

    /// Generate a key pair with custom retry budgets and deadline
    pub fn generate_with_config(bit_length: u64, config: &KeyGenConfig) -> Result<Self> {
        Self::generate_inner(bit_length, config, None)
    }

    /// Generate a key pair that stops with `Cancelled` once `token` is cancelled
    pub fn generate_cancellable(
        bit_length: u64,
        config: &KeyGenConfig,
        token: &CancellationToken,
    ) -> Result<Self> {
        Self::generate_inner(bit_length, config, Some(token))
    }

    fn generate_inner(
        bit_length: u64,
        config: &KeyGenConfig,
        token: Option<&CancellationToken>,
    ) -> Result<Self> {
        if bit_length < MIN_BIT_LENGTH {
            return Err(PaillierError::InvalidParameter(format!(
                "Key size must be at least {} bits, got {}",
                MIN_BIT_LENGTH, bit_length
            )));
        }

        let interrupt = Interrupt::new(config, token);
        let (p, q) = generate_prime_pair(bit_length, config, &interrupt)?;

        let keypair = derive_keypair(&p, &q, config, &interrupt)?;
        debug!(bits = keypair.bit_size(), "generated Paillier key pair");
        Ok(keypair)
    }

    /// Build a key pair from two caller-supplied primes, choosing a fresh g
    pub fn from_primes(p: &BigUint, q: &BigUint) -> Result<Self> {
        let config = KeyGenConfig::default();
        let two = BigUint::from(2u32);

        if p == q {
            return Err(PaillierError::InvalidParameter(
                "Primes p and q must be distinct".to_string(),
            ));
        }

        for prime in [p, q] {
            if prime <= &two || !is_probable_prime(prime, config.primality_test_rounds) {
                return Err(PaillierError::InvalidParameter(
                    "Both p and q must be odd primes".to_string(),
                ));
            }
        }

        derive_keypair(p, q, &config, &Interrupt::new(&config, None))
    }

    /// Get the bit size of the keys
    pub fn bit_size(&self) -> u64 {
        self.public_key.bit_size()
    }

    /// Split into the public and private halves
    pub fn into_parts(self) -> (PublicKey, PrivateKey) {
        (self.public_key, self.private_key)
    }
}

impl fmt::Display for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair({} bits)", self.bit_size())
    }
}

/// Generate a public/private key pair with a modulus of `bit_length` bits
pub fn generate_key(bit_length: u64) -> Result<(PublicKey, PrivateKey)> {
    KeyPair::generate(bit_length).map(KeyPair::into_parts)
}

/// Sample distinct primes `p`, `q` whose product has exactly `bit_length` bits
///
/// `p` takes the larger half when `bit_length` is odd.
fn generate_prime_pair(
    bit_length: u64,
    config: &KeyGenConfig,
    interrupt: &Interrupt<'_>,
) -> Result<(BigUint, BigUint)> {
    let q_bits = bit_length / 2;
    let p_bits = bit_length - q_bits;

    for attempt in 1..=config.max_prime_pair_attempts {
        let p = generate_prime(p_bits, config, interrupt)?;
        let q = generate_prime(q_bits, config, interrupt)?;

        if p == q {
            debug!(attempt, bits = q_bits, "sampled identical primes, resampling");
            continue;
        }
        if (&p * &q).bits() != bit_length {
            debug!(attempt, bit_length, "modulus one bit short, resampling");
            continue;
        }

        return Ok((p, q));
    }

    warn!(
        attempts = config.max_prime_pair_attempts,
        "prime pair retry budget exhausted"
    );
    Err(PaillierError::KeyGenerationFailed(format!(
        "No distinct prime pair for a {}-bit modulus after {} attempts",
        bit_length, config.max_prime_pair_attempts
    )))
}

/// Compute n, lambda and search for a generator g with its inverse mu
fn derive_keypair(
    p: &BigUint,
    q: &BigUint,
    config: &KeyGenConfig,
    interrupt: &Interrupt<'_>,
) -> Result<KeyPair> {
    let n = p * q;
    let n_squared = &n * &n;
    let lambda = lcm(&(p - BigUint::one()), &(q - BigUint::one()));

    for attempt in 1..=config.max_generator_attempts {
        interrupt.check()?;

        let g = sample_below(&n_squared)
            .map_err(|e| PaillierError::KeyGenerationFailed(e.to_string()))?;
        if !gcd(&g, &n_squared).is_one() {
            debug!(attempt, "generator candidate not coprime to n^2");
            continue;
        }

        let a = mod_exp(&g, &lambda, &n_squared);
        let Some(t) = l_function(&a, &n) else {
            debug!(attempt, "L(g^lambda) undefined for candidate");
            continue;
        };

        if !gcd(&t, &n).is_one() {
            debug!(attempt, "L(g^lambda) not invertible mod n");
            continue;
        }

        let mu = mod_inverse(&t, &n).ok_or(PaillierError::ModularInverseError)?;

        debug!(attempts = attempt, "selected generator");
        let public_key = PublicKey { n, g };
        return Ok(KeyPair {
            private_key: PrivateKey {
                public_key: public_key.clone(),
                lambda,
                mu,
            },
            public_key,
        });
    }

    warn!(
        attempts = config.max_generator_attempts,
        "generator retry budget exhausted"
    );
    Err(PaillierError::KeyGenerationFailed(format!(
        "No valid generator found after {} attempts",
        config.max_generator_attempts
    )))
}

/// Generate a prime number with exactly `bit_size` bits
fn generate_prime(
    bit_size: u64,
    config: &KeyGenConfig,
    interrupt: &Interrupt<'_>,
) -> Result<BigUint> {
    let mut rng = thread_rng();

    for _ in 0..config.max_prime_attempts {
        interrupt.check()?;

        // Generate a random odd number with exactly bit_size bits
        let mut candidate = rng.gen_biguint(bit_size);
        candidate |= BigUint::one();
        candidate |= BigUint::one() << (bit_size - 1);
        if bit_size >= TWO_TOP_BITS_MIN {
            candidate |= BigUint::one() << (bit_size - 2);
        }

        if is_probable_prime(&candidate, config.primality_test_rounds) {
            return Ok(candidate);
        }
    }

    warn!(bits = bit_size, "prime search budget exhausted");
    Err(PaillierError::KeyGenerationFailed(format!(
        "Failed to generate {}-bit prime after {} iterations",
        bit_size, config.max_prime_attempts
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_key_generation() {
        let keypair = KeyPair::generate(512).unwrap();
        assert_eq!(keypair.bit_size(), 512);
        keypair.public_key.validate().unwrap();
        keypair.private_key.validate().unwrap();
        assert_eq!(keypair.private_key.public_key(), &keypair.public_key);
    }

    #[test]
    fn test_generated_key_invariants() {
        let (public_key, private_key) = generate_key(256).unwrap();
        let n = public_key.modulus();
        let n_squared = public_key.n_squared();

        assert!(gcd(public_key.generator(), &n_squared).is_one());

        let a = mod_exp(public_key.generator(), private_key.lambda(), &n_squared);
        let t = l_function(&a, n).unwrap();
        assert!(gcd(&t, n).is_one());
        assert!(((t * private_key.mu()) % n).is_one());
    }

    #[test]
    fn test_key_size_validation() {
        for bits in [0u64, 1, 4, 5] {
            assert!(
                matches!(KeyPair::generate(bits), Err(PaillierError::InvalidParameter(_))),
                "{} bits should be rejected",
                bits
            );
        }
    }

    #[test]
    fn test_small_and_odd_key_sizes() {
        for bits in [6u64, 7, 8, 9, 12, 64, 513] {
            let keypair = KeyPair::generate(bits).unwrap();
            assert_eq!(keypair.bit_size(), bits);
            keypair.private_key.validate().unwrap();
        }
    }

    #[test]
    fn test_generated_primes_have_top_two_bits() {
        let config = KeyGenConfig::default();
        let interrupt = Interrupt::new(&config, None);

        for _ in 0..10 {
            let p = generate_prime(64, &config, &interrupt).unwrap();
            assert_eq!(p.bits(), 64);
            assert!(p.bit(62));
        }
    }

    #[test]
    fn test_exhausted_generator_budget() {
        let config = KeyGenConfig {
            max_generator_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(
            KeyPair::generate_with_config(64, &config),
            Err(PaillierError::KeyGenerationFailed(_))
        ));
    }

    #[test]
    fn test_exhausted_prime_budget() {
        let config = KeyGenConfig {
            max_prime_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(
            KeyPair::generate_with_config(64, &config),
            Err(PaillierError::KeyGenerationFailed(_))
        ));
    }

    #[test]
    fn test_exhausted_prime_pair_budget() {
        let config = KeyGenConfig {
            max_prime_pair_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(
            KeyPair::generate_with_config(64, &config),
            Err(PaillierError::KeyGenerationFailed(_))
        ));
    }

    #[test]
    fn test_key_validation() {
        let keypair = KeyPair::generate(128).unwrap();
        assert!(keypair.public_key.validate().is_ok());

        let even_modulus = PublicKey {
            n: BigUint::from(10u32),
            g: BigUint::from(3u32),
        };
        assert!(even_modulus.validate().is_err());

        // g shares the factor 5 with n = 15
        let shared_factor = PublicKey {
            n: BigUint::from(15u32),
            g: BigUint::from(5u32),
        };
        assert!(shared_factor.validate().is_err());

        let mut tampered = keypair.private_key.clone();
        tampered.mu += BigUint::one();
        tampered.mu %= keypair.public_key.modulus();
        assert!(tampered.validate().is_err());
    }

    #[test]
    fn test_from_primes() {
        let p = BigUint::from(1_000_003u32);
        let q = BigUint::from(1_000_033u32);
        let keypair = KeyPair::from_primes(&p, &q).unwrap();

        assert_eq!(keypair.public_key.modulus(), &(&p * &q));
        assert_eq!(
            keypair.private_key.lambda(),
            &lcm(&(&p - 1u32), &(&q - 1u32))
        );
        keypair.private_key.validate().unwrap();

        assert!(KeyPair::from_primes(&p, &p).is_err());
        assert!(KeyPair::from_primes(&p, &BigUint::from(1_000_005u32)).is_err());
        assert!(KeyPair::from_primes(&BigUint::from(2u32), &q).is_err());
    }

    #[test]
    fn test_components_round_trip() {
        let keypair = KeyPair::generate(128).unwrap();
        let public_key = PublicKey::from_components(
            keypair.public_key.modulus().clone(),
            keypair.public_key.generator().clone(),
        )
        .unwrap();
        let private_key = PrivateKey::from_components(
            public_key.clone(),
            keypair.private_key.lambda().clone(),
            keypair.private_key.mu().clone(),
        )
        .unwrap();

        assert_eq!(public_key, keypair.public_key);
        assert_eq!(private_key, keypair.private_key);
    }

    #[test]
    fn test_distinct_keys_are_not_equal() {
        let a = KeyPair::generate(128).unwrap();
        let b = KeyPair::generate(128).unwrap();
        assert_ne!(a.public_key, b.public_key);
        assert_ne!(a.private_key, b.private_key);
    }

    #[test]
    fn test_cancelled_generation() {
        let token = CancellationToken::new();
        token.cancel();

        let result = KeyPair::generate_cancellable(512, &KeyGenConfig::default(), &token);
        assert_eq!(result, Err(PaillierError::Cancelled));
    }

    #[test]
    fn test_expired_deadline() {
        let config = KeyGenConfig::with_deadline(Duration::ZERO);
        assert_eq!(
            KeyPair::generate_with_config(512, &config),
            Err(PaillierError::Cancelled)
        );
    }

    #[test]
    fn test_private_key_display_is_redacted() {
        let keypair = KeyPair::generate(64).unwrap();
        let lambda = keypair.private_key.lambda().to_string();

        assert_eq!(keypair.private_key.to_string(), "PrivateKey(***)");
        assert!(!format!("{:?}", keypair.private_key).contains(&lambda));
    }
}
