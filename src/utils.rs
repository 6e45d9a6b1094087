//! Modular arithmetic utilities

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::thread_rng;

/// Modular exponentiation: base^exp mod modulus
pub fn mod_exp(base: &BigUint, exp: &BigUint, modulus: &BigUint) -> BigUint {
    base.modpow(exp, modulus)
}

/// Greatest common divisor, with `gcd(0, 0) = 0`
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    let (g, _, _) = extended_gcd(&BigInt::from(a.clone()), &BigInt::from(b.clone()));
    g.magnitude().clone()
}

/// Least common multiple, `a * b / gcd(a, b)`.
///
/// Returns zero when either input is zero, which also covers the `lcm(0, 0)`
/// case where the quotient would be undefined.
pub fn lcm(a: &BigUint, b: &BigUint) -> BigUint {
    if a.is_zero() || b.is_zero() {
        return BigUint::zero();
    }
    (a * b) / gcd(a, b)
}

/// Compute modular inverse using extended Euclidean algorithm
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m.is_zero() {
        return None;
    }

    let m_int = BigInt::from(m.clone());
    let (g, x, _) = extended_gcd(&BigInt::from(a.clone()), &m_int);

    if !g.is_one() {
        return None;
    }

    // mod_floor keeps the result in [0, m) for negative coefficients
    x.mod_floor(&m_int).to_biguint()
}

/// Extended Euclidean algorithm returning `(g, x, y)` with `a*x + b*y = g`.
///
/// Iterative so the depth does not grow with operand size. Intermediate
/// coefficients are signed, hence `BigInt`.
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let q = &old_r / &r;

        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);

        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);

        let next_t = &old_t - &q * &t;
        old_t = std::mem::replace(&mut t, next_t);
    }

    (old_r, old_s, old_t)
}

/// The Paillier L-function, `L(u) = (u - 1) / n`.
///
/// Returns `None` unless `n` divides `u - 1` exactly.
pub fn l_function(u: &BigUint, n: &BigUint) -> Option<BigUint> {
    if u.is_zero() || n.is_zero() {
        return None;
    }

    let (quotient, remainder) = (u - BigUint::one()).div_rem(n);
    if remainder.is_zero() {
        Some(quotient)
    } else {
        None
    }
}

/// Miller-Rabin primality test
pub fn is_probable_prime(n: &BigUint, k: usize) -> bool {
    if n <= &BigUint::one() {
        return false;
    }

    let two = BigUint::from(2u32);
    let three = BigUint::from(3u32);

    if n == &two || n == &three {
        return true;
    }
    if n.is_even() {
        return false;
    }

    let mut rng = thread_rng();
    let n_minus_1 = n - BigUint::one();
    let (s, d) = factor_powers_of_two(&n_minus_1);

    'witness: for _ in 0..k {
        // n >= 5 here, so [2, n - 1) is never empty
        let a = rng.gen_biguint_range(&two, &n_minus_1);
        let mut x = mod_exp(&a, &d, n);

        if x.is_one() || x == n_minus_1 {
            continue;
        }

        for _ in 0..s - 1 {
            x = mod_exp(&x, &two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }

        return false;
    }

    true
}

/// Factor out powers of 2 from n
pub fn factor_powers_of_two(n: &BigUint) -> (u64, BigUint) {
    let mut s = 0;
    let mut d = n.clone();

    while d.is_even() && !d.is_zero() {
        d >>= 1;
        s += 1;
    }

    (s, d)
}
