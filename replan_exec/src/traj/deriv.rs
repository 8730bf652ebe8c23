//! # Polynomial derivatives
//!
//! Exact differentiation of polynomial coefficients using the power rule. All functions here are
//! pure and return new coefficient vectors.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::Poly;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the coefficients of the `n`th derivative of a polynomial.
///
/// The coefficients are highest power first. Differentiating an order K polynomial `n` times
/// gives an order `K - n` polynomial, so the result has `n` fewer coefficients than the input.
/// If `n` exceeds the order the result is the zero polynomial `[0.0]`. `n = 0` returns a copy.
pub fn poly_derivative(coeffs: &[f64], n: usize) -> Vec<f64> {
    if n == 0 {
        return coeffs.to_vec();
    }

    if n >= coeffs.len() {
        return vec![0.0];
    }

    let order = coeffs.len() - 1;

    coeffs[..coeffs.len() - n]
        .iter()
        .enumerate()
        .map(|(i, c)| c * falling_factorial(order - i, n))
        .collect()
}

/// Differentiate every polynomial of a piecewise polynomial `n` times.
pub fn derivative(polys: &[Poly], n: usize) -> Vec<Poly> {
    polys.iter().map(|p| p.derivative(n)).collect()
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// `power * (power - 1) * ... * (power - n + 1)`, the factor the power rule applies to the
/// coefficient of `t^power` after `n` derivatives.
fn falling_factorial(power: usize, n: usize) -> f64 {
    ((power + 1 - n)..=power).fold(1.0, |acc, k| acc * k as f64)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_power_rule() {
        // t^3 - 3t + 2
        let c = [1.0, 0.0, -3.0, 2.0];

        assert_eq!(poly_derivative(&c, 0), vec![1.0, 0.0, -3.0, 2.0]);
        assert_eq!(poly_derivative(&c, 1), vec![3.0, 0.0, -3.0]);
        assert_eq!(poly_derivative(&c, 2), vec![6.0, 0.0]);
        assert_eq!(poly_derivative(&c, 3), vec![6.0]);
        assert_eq!(poly_derivative(&c, 4), vec![0.0]);
        assert_eq!(poly_derivative(&c, 10), vec![0.0]);
    }

    #[test]
    fn test_repeated_equals_direct() {
        let c = [0.5, -1.0, 2.0, 0.25, -3.0, 7.0];

        let mut repeated = c.to_vec();
        for n in 1..=5 {
            repeated = poly_derivative(&repeated, 1);
            assert_eq!(repeated, poly_derivative(&c, n));
        }
    }

    #[test]
    fn test_piecewise_derivative() {
        let polys = vec![
            Poly::new(vec![1.0, 0.0, -3.0, 2.0]),
            Poly::new(vec![2.0, 1.0])
        ];

        let d = derivative(&polys, 1);
        assert_eq!(d[0].coeffs, vec![3.0, 0.0, -3.0]);
        assert_eq!(d[1].coeffs, vec![2.0]);

        let d2 = derivative(&polys, 2);
        assert_eq!(d2[1], Poly::zero());
    }

    #[test]
    fn test_empty_poly() {
        assert!(poly_derivative(&[], 0).is_empty());
        assert_eq!(poly_derivative(&[], 1), vec![0.0]);
    }
}
