//! Homomorphic operations on ciphertexts
//!
//! Paillier ciphertexts live in `Z*_{n^2}`. Multiplying two of them adds the
//! plaintexts, and raising one to a power `k` multiplies its plaintext by `k`,
//! both modulo `n`. Results past `n` wrap around, which is expected.

use num_bigint::BigUint;

use crate::error::{PaillierError, Result};
use crate::keys::PublicKey;
use crate::random::sample_coprime;
use crate::utils::{mod_exp, mod_inverse};

/// Trait for homomorphic operations
pub trait HomomorphicOperations {
    /// Enc(m1) * Enc(m2) = Enc(m1 + m2 mod n)
    fn add(&self, ct1: &BigUint, ct2: &BigUint) -> Result<BigUint>;

    /// Add a known plaintext to an encrypted value
    ///
    /// Any residue is accepted, including zero; it is reduced mod n first.
    fn add_plaintext(&self, ct: &BigUint, plaintext: &BigUint) -> Result<BigUint>;

    /// Enc(m)^k = Enc(k * m mod n)
    fn scalar_mul(&self, ct: &BigUint, scalar: &BigUint) -> Result<BigUint>;

    /// Enc(m)^-1 = Enc(n - m)
    fn negate(&self, ct: &BigUint) -> Result<BigUint>;

    /// Enc(m1 - m2 mod n)
    fn subtract(&self, ct_a: &BigUint, ct_b: &BigUint) -> Result<BigUint>;

    /// Sum of every ciphertext in the batch
    fn batch_add(&self, ciphertexts: &[BigUint]) -> Result<BigUint>;

    /// Encryption of `sum(k_i * m_i)`
    fn linear_combination(
        &self,
        ciphertexts: &[BigUint],
        coefficients: &[BigUint],
    ) -> Result<BigUint>;

    /// Produce a fresh ciphertext of the same plaintext
    fn rerandomize(&self, ct: &BigUint) -> Result<BigUint>;
}

impl HomomorphicOperations for PublicKey {
    fn add(&self, ct1: &BigUint, ct2: &BigUint) -> Result<BigUint> {
        self.check_ciphertext(ct1)?;
        self.check_ciphertext(ct2)?;

        Ok((ct1 * ct2) % self.n_squared())
    }

    fn add_plaintext(&self, ct: &BigUint, plaintext: &BigUint) -> Result<BigUint> {
        self.check_ciphertext(ct)?;

        // ct * g^m mod n^2, keeping the randomness already in ct
        let n_squared = self.n_squared();
        let g_m = mod_exp(&self.g, &(plaintext % &self.n), &n_squared);
        Ok((ct * g_m) % &n_squared)
    }

    fn scalar_mul(&self, ct: &BigUint, scalar: &BigUint) -> Result<BigUint> {
        self.check_ciphertext(ct)?;

        Ok(mod_exp(ct, scalar, &self.n_squared()))
    }

    fn negate(&self, ct: &BigUint) -> Result<BigUint> {
        self.check_ciphertext(ct)?;

        mod_inverse(ct, &self.n_squared()).ok_or(PaillierError::ModularInverseError)
    }

    fn subtract(&self, ct_a: &BigUint, ct_b: &BigUint) -> Result<BigUint> {
        // a - b = a + (-b)
        let ct_b_neg = self.negate(ct_b)?;
        self.add(ct_a, &ct_b_neg)
    }

    fn batch_add(&self, ciphertexts: &[BigUint]) -> Result<BigUint> {
        let (first, rest) = ciphertexts.split_first().ok_or(PaillierError::EmptyBatch)?;
        self.check_ciphertext(first)?;

        rest.iter()
            .try_fold(first.clone(), |acc, ct| self.add(&acc, ct))
    }

    fn linear_combination(
        &self,
        ciphertexts: &[BigUint],
        coefficients: &[BigUint],
    ) -> Result<BigUint> {
        if ciphertexts.len() != coefficients.len() {
            return Err(PaillierError::LengthMismatch(format!(
                "ciphertexts: {}, coefficients: {}",
                ciphertexts.len(),
                coefficients.len()
            )));
        }

        let terms = ciphertexts
            .iter()
            .zip(coefficients)
            .map(|(ct, coeff)| self.scalar_mul(ct, coeff))
            .collect::<Result<Vec<_>>>()?;

        self.batch_add(&terms)
    }

    fn rerandomize(&self, ct: &BigUint) -> Result<BigUint> {
        self.check_ciphertext(ct)?;

        // Multiply by a fresh encryption of zero, r^n mod n^2
        let n_squared = self.n_squared();
        let r = sample_coprime(&self.n)?;
        let r_n = mod_exp(&r, &self.n, &n_squared);

        Ok((ct * r_n) % &n_squared)
    }
}
