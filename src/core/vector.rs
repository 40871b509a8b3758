//! Small 3-vector helpers used throughout the projection kernels

use crate::types::Vec3;

#[inline]
pub fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(a: &Vec3) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
pub fn add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn scale(a: &Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// `a + s * b`
#[inline]
pub fn add_scaled(a: &Vec3, s: f64, b: &Vec3) -> Vec3 {
    [a[0] + s * b[0], a[1] + s * b[1], a[2] + s * b[2]]
}

/// Unit vector along `a`. A zero vector yields NaN components.
#[inline]
pub fn unit(a: &Vec3) -> Vec3 {
    scale(a, 1.0 / norm(a))
}

/// Distance between two points
#[inline]
pub fn distance(a: &Vec3, b: &Vec3) -> f64 {
    norm(&sub(a, b))
}

pub fn is_finite(a: &Vec3) -> bool {
    a.iter().all(|v| v.is_finite())
}

pub fn nan3() -> Vec3 {
    [f64::NAN; 3]
}
