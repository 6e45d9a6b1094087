//! Core Paillier encryption and decryption operations

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::error::{PaillierError, Result};
use crate::keys::{PrivateKey, PublicKey};
use crate::random::sample_coprime;
use crate::utils::{gcd, l_function, mod_exp};

impl PublicKey {
    /// Encrypt a plaintext `0 < m < n` with fresh randomness
    ///
    /// Zero is rejected even though it is a valid residue mod n.
    pub fn encrypt(&self, plaintext: &BigUint) -> Result<BigUint> {
        self.check_plaintext(plaintext)?;
        let r = sample_coprime(&self.n)?;
        Ok(self.encrypt_unchecked(plaintext, &r))
    }

    /// Encrypt with specific randomness `r`, which must be a unit mod n
    pub fn encrypt_with_randomness(&self, plaintext: &BigUint, r: &BigUint) -> Result<BigUint> {
        self.check_plaintext(plaintext)?;

        if r.is_zero() || r >= &self.n || !gcd(r, &self.n).is_one() {
            return Err(PaillierError::InvalidParameter(
                "Randomness r must be in (0, n) and coprime to n".to_string(),
            ));
        }

        Ok(self.encrypt_unchecked(plaintext, r))
    }

    /// c = g^m * r^n mod n^2
    fn encrypt_unchecked(&self, plaintext: &BigUint, r: &BigUint) -> BigUint {
        let n_squared = self.n_squared();
        let g_m = mod_exp(&self.g, plaintext, &n_squared);
        let r_n = mod_exp(r, &self.n, &n_squared);
        (g_m * r_n) % &n_squared
    }

    fn check_plaintext(&self, plaintext: &BigUint) -> Result<()> {
        if plaintext.is_zero() || plaintext >= &self.n {
            return Err(PaillierError::PlaintextOutOfRange);
        }
        Ok(())
    }

    /// Check that `0 < c < n^2`
    pub(crate) fn check_ciphertext(&self, ciphertext: &BigUint) -> Result<()> {
        if ciphertext.is_zero() || ciphertext >= &self.n_squared() {
            return Err(PaillierError::CiphertextOutOfRange);
        }
        Ok(())
    }
}

impl PrivateKey {
    /// Decrypt a ciphertext `0 < c < n^2`
    pub fn decrypt(&self, ciphertext: &BigUint) -> Result<BigUint> {
        self.public_key.check_ciphertext(ciphertext)?;

        let n = &self.public_key.n;
        let a = mod_exp(ciphertext, &self.lambda, &self.public_key.n_squared());
        let t = l_function(&a, n).ok_or(PaillierError::DecryptionFailed)?;

        Ok((t * &self.mu) % n)
    }
}

/// Encrypt `plaintext` under `public_key`
pub fn encrypt(plaintext: &BigUint, public_key: &PublicKey) -> Result<BigUint> {
    public_key.encrypt(plaintext)
}

/// Decrypt `ciphertext` with `private_key`
pub fn decrypt(ciphertext: &BigUint, private_key: &PrivateKey) -> Result<BigUint> {
    private_key.decrypt(ciphertext)
}
