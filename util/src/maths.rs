//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Return the euclidian norm (distance between) of two points.
///
/// If the points do not have the same number of dimentions then `None` is 
/// returned.
pub fn norm<T>(point_0: &[T], point_1: &[T]) -> Option<T> 
where
    T: Float
{
    // Check that the dimentions match
    if point_0.len() != point_1.len() {
        return None;
    }

    let sum = point_0
        .iter()
        .zip(point_1.iter())
        .fold(T::zero(), |acc, (a, b)| acc + (*a - *b).powi(2));

    Some(sum.sqrt())
}

/// Apply polynomial coefficients to a value.
///
/// Coefficients are ordered highest power first, i.e if there are 3 
/// coefficients it's a 2nd order polynomial with c[0]*x^2 + c[1]*x + c[2]. An
/// empty coefficient slice is the zero polynomial.
pub fn poly_val<T>(value: T, coeffs: &[T]) -> T
where
    T: Float
{
    // Horner's scheme
    coeffs
        .iter()
        .fold(T::zero(), |acc, c| acc * value + *c)
}

/// Produce `num` evenly spaced values over the closed interval `[start, end]`.
///
/// The first value is exactly `start` and the last exactly `end`. If `num` is
/// 1 the only value is `start`.
pub fn linspace<T>(start: T, end: T, num: usize) -> Vec<T>
where
    T: Float
{
    match num {
        0 => vec![],
        1 => vec![start],
        _ => {
            let span = end - start;
            let last = T::from(num - 1).unwrap_or_else(T::one);
            (0..num)
                .map(|i| {
                    if i == num - 1 {
                        end
                    }
                    else {
                        // Multiply before dividing so that grid points which 
                        // land on integers are exact
                        start + span * T::from(i).unwrap_or_else(T::zero) / last
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_poly_val() {
        // x^3 - 3x + 2
        let c = [1f64, 0.0, -3.0, 2.0];
        assert_eq!(poly_val(0f64, &c), 2.0);
        assert_eq!(poly_val(1f64, &c), 0.0);
        assert_eq!(poly_val(2f64, &c), 4.0);
        assert_eq!(poly_val(-2f64, &c), 0.0);
        assert_eq!(poly_val(3f64, &[]), 0.0);
    }

    #[test]
    fn test_linspace() {
        let v = linspace(0f64, 3f64, 31);
        assert_eq!(v.len(), 31);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[10], 1.0);
        assert_eq!(v[20], 2.0);
        assert_eq!(v[30], 3.0);

        assert!(linspace(0f64, 1f64, 0).is_empty());
        assert_eq!(linspace(2f64, 5f64, 1), vec![2.0]);
    }

    #[test]
    fn test_norm() {
        assert_eq!(norm(&[0f64, 0.0], &[3.0, 4.0]), Some(5.0));
        assert_eq!(norm(&[0f64], &[3.0, 4.0]), None);
    }
}
