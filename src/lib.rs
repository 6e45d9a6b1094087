//! # Paillier Homomorphic Encryption Library
//!
//! This library provides an implementation of the Paillier cryptosystem with:
//! - Key generation with bounded retries, deadlines and cancellation
//! - Randomized encryption and decryption over arbitrary-precision integers
//! - Additive homomorphic operations on raw ciphertexts
//!
//! Plaintexts must satisfy `0 < m < n` and ciphertexts `0 < c < n^2`.
//! Ciphertexts are plain `BigUint` values, so callers may also combine them
//! directly: `c1 * c2 mod n^2` decrypts to `m1 + m2 mod n`, and
//! `c^k mod n^2` decrypts to `k * m mod n`.
//!
//! ## Example
//!
//! ```rust
//! use phe::{KeyPair, HomomorphicOperations};
//!
//! // Generate keys
//! let keypair = KeyPair::generate(512).unwrap();
//!
//! // Encrypt values
//! let ct1 = keypair.public_key.encrypt(&10u32.into()).unwrap();
//! let ct2 = keypair.public_key.encrypt(&20u32.into()).unwrap();
//!
//! // Perform homomorphic addition
//! let sum = keypair.public_key.add(&ct1, &ct2).unwrap();
//!
//! // Decrypt result
//! let result = keypair.private_key.decrypt(&sum).unwrap();
//! assert_eq!(result, 30u32.into());
//! ```

pub mod encryption;
pub mod error;
pub mod homomorphic;
pub mod keys;
pub mod random;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use encryption::{decrypt, encrypt};
pub use error::{PaillierError, Result};
pub use homomorphic::HomomorphicOperations;
pub use keys::{generate_key, KeyPair, PrivateKey, PublicKey};
pub use types::{CancellationToken, KeyGenConfig};
pub use utils::{gcd, lcm};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_basic_workflow() {
        let keypair = generate_key(512);
        assert!(keypair.is_ok());

        let (public_key, private_key) = keypair.unwrap();

        let m = BigUint::from(1u32);
        let ct = encrypt(&m, &public_key).unwrap();
        let decrypted = decrypt(&ct, &private_key).unwrap();

        assert_eq!(m, decrypted);
    }
}
