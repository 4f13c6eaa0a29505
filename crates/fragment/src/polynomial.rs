//! Modular polynomial arithmetic over the fixed 261-bit field prime.
//!
//! Coefficients are stored low-order first (`coefficients[0]` is the
//! constant term), matching the layout the reconstruction side expects when
//! it reads 32-byte blocks off disk in order.

use num_bigint::BigInt;
use num_traits::Zero;

/// The field prime: `2^261 - 261`.
pub fn prime() -> BigInt {
    (BigInt::from(1) << 261) - BigInt::from(261)
}

/// A polynomial with `BigInt` coefficients, low-order first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial {
    coefficients: Vec<BigInt>,
}

impl Polynomial {
    /// Builds a polynomial from low-order-first coefficients, trimming
    /// trailing zero terms.
    pub fn new(coefficients: Vec<BigInt>) -> Self {
        let mut coefficients = coefficients;
        while coefficients.len() > 1 && coefficients.last() == Some(&BigInt::zero()) {
            coefficients.pop();
        }
        Polynomial { coefficients }
    }

    /// The zero polynomial.
    pub fn zero() -> Self {
        Polynomial::new(vec![BigInt::zero()])
    }

    /// A constant polynomial.
    pub fn constant(c: BigInt) -> Self {
        Polynomial::new(vec![c])
    }

    /// Coefficients, low-order first.
    pub fn coefficients(&self) -> &[BigInt] {
        &self.coefficients
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients.len() == 1 && self.coefficients[0].is_zero()
    }

    fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Polynomial + polynomial.
    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let len = self.coefficients.len().max(other.coefficients.len());
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            let a = self.coefficients.get(i).cloned().unwrap_or_else(BigInt::zero);
            let b = other.coefficients.get(i).cloned().unwrap_or_else(BigInt::zero);
            out.push(a + b);
        }
        Polynomial::new(out)
    }

    /// Polynomial + scalar (added to the constant term).
    pub fn add_scalar(&self, scalar: &BigInt) -> Polynomial {
        let mut out = self.coefficients.clone();
        out[0] += scalar;
        Polynomial::new(out)
    }

    /// Polynomial * polynomial, via convolution.
    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        if self.is_zero() || other.is_zero() {
            return Polynomial::zero();
        }
        let mut out = vec![BigInt::zero(); self.degree() + other.degree() + 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.coefficients.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Polynomial::new(out)
    }

    /// Polynomial * scalar.
    pub fn mul_scalar(&self, scalar: &BigInt) -> Polynomial {
        Polynomial::new(self.coefficients.iter().map(|c| c * scalar).collect())
    }

    /// Reduces every coefficient into `[0, modulus)`.
    pub fn modulo(&self, modulus: &BigInt) -> Polynomial {
        Polynomial::new(
            self.coefficients
                .iter()
                .map(|c| euclid_mod(c, modulus))
                .collect(),
        )
    }

    /// Evaluates the polynomial at `x`, reducing every step modulo `modulus`.
    pub fn eval(&self, x: &BigInt, modulus: &BigInt) -> BigInt {
        let mut acc = BigInt::zero();
        for c in self.coefficients.iter().rev() {
            acc = euclid_mod(&(acc * x + c), modulus);
        }
        acc
    }
}

/// Non-negative remainder of `a mod m`, for `m > 0`.
pub fn euclid_mod(a: &BigInt, m: &BigInt) -> BigInt {
    let r = a % m;
    if r.sign() == num_bigint::Sign::Minus {
        r + m
    } else {
        r
    }
}

/// Modular inverse of `a` mod prime `p`, via Fermat's little theorem
/// (`a^(p-2) mod p`). Callers must ensure `p` is prime and `a % p != 0`.
pub fn mod_inverse(a: &BigInt, p: &BigInt) -> BigInt {
    let a = euclid_mod(a, p);
    let exponent = p - BigInt::from(2);
    a.modpow(&exponent, p)
}
