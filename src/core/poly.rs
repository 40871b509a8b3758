//! Polynomial types carried by SICD metadata
//!
//! Coefficients are stored lowest order first, matching the SICD XML layout.

use crate::types::Vec3;
use ndarray::Array2;
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Horner evaluation of `sum(c[k] * x^k)`
fn horner<T: Float>(coefs: impl DoubleEndedIterator<Item = T>, x: T) -> T {
    coefs.rev().fold(T::zero(), |acc, c| acc * x + c)
}

/// Horner evaluation of `sum(k * c[k] * x^(k-1))` without building the derivative
fn horner_derivative<T: Float>(coefs: &[T], x: T) -> T {
    coefs
        .iter()
        .enumerate()
        .skip(1)
        .rev()
        .fold(T::zero(), |acc, (k, &c)| {
            acc * x + <T as num_traits::NumCast>::from(k).unwrap_or_else(T::nan) * c
        })
}

/// One dimensional polynomial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poly1d {
    pub coefs: Vec<f64>,
}

impl Poly1d {
    pub fn new(coefs: Vec<f64>) -> Self {
        Self { coefs }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    pub fn eval(&self, x: f64) -> f64 {
        horner(self.coefs.iter().copied(), x)
    }

    pub fn derivative(&self) -> Poly1d {
        let coefs = self
            .coefs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, c)| k as f64 * c)
            .collect::<Vec<_>>();
        if coefs.is_empty() {
            Poly1d::constant(0.0)
        } else {
            Poly1d::new(coefs)
        }
    }

    /// Value of the first derivative at `x`
    pub fn eval_derivative(&self, x: f64) -> f64 {
        horner_derivative(&self.coefs, x)
    }
}

/// Two dimensional polynomial, `coefs[[i, j]]` multiplies `x^i * y^j`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poly2d {
    pub coefs: Array2<f64>,
}

impl Poly2d {
    pub fn new(coefs: Array2<f64>) -> Self {
        Self { coefs }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(Array2::from_elem((1, 1), value))
    }

    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let row_values = self
            .coefs
            .outer_iter()
            .map(|row| horner(row.iter().copied(), y))
            .collect::<Vec<_>>();
        horner(row_values.into_iter(), x)
    }
}

/// Polynomial position as a function of time, one [`Poly1d`] per ECEF axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XyzPoly {
    pub x: Poly1d,
    pub y: Poly1d,
    pub z: Poly1d,
}

impl XyzPoly {
    pub fn new(x: Poly1d, y: Poly1d, z: Poly1d) -> Self {
        Self { x, y, z }
    }

    /// Build from rows of `[cx, cy, cz]` coefficients, one row per power of t
    pub fn from_rows(rows: &[Vec3]) -> Self {
        Self {
            x: Poly1d::new(rows.iter().map(|r| r[0]).collect()),
            y: Poly1d::new(rows.iter().map(|r| r[1]).collect()),
            z: Poly1d::new(rows.iter().map(|r| r[2]).collect()),
        }
    }

    pub fn eval(&self, t: f64) -> Vec3 {
        [self.x.eval(t), self.y.eval(t), self.z.eval(t)]
    }

    pub fn derivative(&self) -> XyzPoly {
        XyzPoly::new(self.x.derivative(), self.y.derivative(), self.z.derivative())
    }

    /// Velocity at `t`
    pub fn eval_velocity(&self, t: f64) -> Vec3 {
        [
            self.x.eval_derivative(t),
            self.y.eval_derivative(t),
            self.z.eval_derivative(t),
        ]
    }

    /// Position and velocity at `t`
    pub fn eval_pos_vel(&self, t: f64) -> (Vec3, Vec3) {
        (self.eval(t), self.eval_velocity(t))
    }
}
