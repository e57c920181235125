//! Polynomial evaluation and Lagrange interpolation over GF(2^8).
//!
//! Mirrors `sbk/gf_poly.py`: coefficients are ordered `c0..c_{t-1}` with
//! `y(x) = sum(c_i * x^i)`, evaluated with Horner's rule, and interpolation
//! at an arbitrary point uses the classic Lagrange form.

use crate::error::{Result, SbkError};
use crate::gf;

/// A point `(x, y)` on a polynomial over GF(2^8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: u8,
    pub y: u8,
}

impl Point {
    pub fn new(x: u8, y: u8) -> Self {
        Point { x, y }
    }
}

/// Evaluate a polynomial with coefficients `c0..c_{t-1}` at `x` using
/// Horner's rule: `((c_{t-1} * x + c_{t-2}) * x + ...) * x + c0`.
pub fn eval(coeffs: &[u8], x: u8) -> u8 {
    let mut acc = 0u8;
    for &c in coeffs.iter().rev() {
        acc = gf::add(gf::mul(acc, x), c);
    }
    acc
}

/// Lagrange-interpolate the polynomial through `points` and evaluate it at
/// `at_x`. Rejects duplicate x-coordinates and fewer than two points.
pub fn interpolate(points: &[Point], at_x: u8) -> Result<u8> {
    if points.len() < 2 {
        return Err(SbkError::DegeneratePoints(
            "need at least two points to interpolate".into(),
        ));
    }
    let mut seen = [false; 256];
    for p in points {
        if seen[p.x as usize] {
            return Err(SbkError::DegeneratePoints(format!(
                "duplicate x-coordinate {}",
                p.x
            )));
        }
        seen[p.x as usize] = true;
    }

    let mut total = 0u8;
    for (i, pi) in points.iter().enumerate() {
        let mut numer = 1u8;
        let mut denom = 1u8;
        for (j, pj) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            numer = gf::mul(numer, gf::sub(at_x, pj.x));
            denom = gf::mul(denom, gf::sub(pi.x, pj.x));
        }
        let term = gf::mul(pi.y, gf::div(numer, denom));
        total = gf::add(total, term);
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_constant_polynomial() {
        assert_eq!(eval(&[42], 0), 42);
        assert_eq!(eval(&[42], 7), 42);
    }

    #[test]
    fn eval_matches_interpolation_round_trip() {
        let coeffs = [5u8, 200, 17];
        let points: Vec<Point> = (1..=5u8)
            .map(|x| Point::new(x, eval(&coeffs, x)))
            .collect();
        let y0 = interpolate(&points[..3], 0).unwrap();
        assert_eq!(y0, coeffs[0]);
    }

    #[test]
    fn interpolate_rejects_too_few_points() {
        let points = [Point::new(1, 2)];
        assert!(interpolate(&points, 0).is_err());
    }

    #[test]
    fn interpolate_rejects_duplicate_x() {
        let points = [Point::new(1, 2), Point::new(1, 3)];
        assert!(interpolate(&points, 0).is_err());
    }

    #[test]
    fn interpolate_any_subset_agrees() {
        let coeffs = [9u8, 3, 200, 44];
        let points: Vec<Point> = (1..=6u8)
            .map(|x| Point::new(x, eval(&coeffs, x)))
            .collect();
        let expected = eval(&coeffs, 0);
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                for k in (j + 1)..points.len() {
                    for l in (k + 1)..points.len() {
                        let subset = [points[i], points[j], points[k], points[l]];
                        assert_eq!(interpolate(&subset, 0).unwrap(), expected);
                    }
                }
            }
        }
    }
}
