//! ULP-based float comparison for tests.
//!
//! Comparing angles and plane coordinates with absolute epsilons hides
//! scale: a 1e-12 slack is tight near zero and loose near 2π. Units in
//! the last place measure relative error uniformly.

/// Maps a finite f64 onto an ordered unsigned scale so that the
/// difference of two mapped values counts the representable doubles
/// between them.
pub fn f64_to_ordered(value: f64) -> u64 {
    let bits = value.to_bits();
    if bits & 0x8000_0000_0000_0000 != 0 {
        !bits
    } else {
        bits | 0x8000_0000_0000_0000
    }
}

/// Number of representable doubles between `a` and `b`.
///
/// Returns `u64::MAX` when either value is NaN.
pub fn ulp_diff(a: f64, b: f64) -> u64 {
    if a.is_nan() || b.is_nan() {
        return u64::MAX;
    }
    let oa = f64_to_ordered(a);
    let ob = f64_to_ordered(b);
    oa.abs_diff(ob)
}

/// Asserts `actual` is within `max_ulp` representable doubles of
/// `expected`.
#[macro_export]
macro_rules! assert_ulp_lt {
    ($actual:expr, $expected:expr, $max_ulp:expr) => {{
        let actual = $actual;
        let expected = $expected;
        let diff = $crate::test_helpers::ulp_diff(actual, expected);
        assert!(
            diff <= $max_ulp,
            "{} = {:e} differs from {:e} by {} ulp (limit {})",
            stringify!($actual),
            actual,
            expected,
            diff,
            $max_ulp
        );
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_values_are_zero_ulp() {
        assert_eq!(ulp_diff(1.5, 1.5), 0);
        assert_eq!(ulp_diff(-0.0, 0.0), 0);
    }

    #[test]
    fn adjacent_doubles_are_one_ulp() {
        let a: f64 = 1.0;
        let b = f64::from_bits(a.to_bits() + 1);
        assert_eq!(ulp_diff(a, b), 1);
    }

    #[test]
    fn sign_straddle_counts_through_zero() {
        let a = f64::from_bits(1); // smallest positive subnormal
        assert_eq!(ulp_diff(a, -a), 2);
    }

    #[test]
    fn nan_is_maximally_distant() {
        assert_eq!(ulp_diff(f64::NAN, 0.0), u64::MAX);
    }

    #[test]
    fn macro_accepts_near_values() {
        assert_ulp_lt!(0.1 + 0.2, 0.3, 2);
    }
}
