use std::f64::consts::PI;

/// Default area scale factor for proportional symbols
pub const DEFAULT_SCALE_FACTOR: f64 = 0.0625;

/// Radius of a proportional symbol whose *area* is `value * scale_factor`.
///
/// Negative, NaN and infinite values are treated as 0 so the result is
/// always a finite, non-negative radius.
#[inline]
pub fn prop_radius(value: f64, scale_factor: f64) -> f64 {
    let value = if value.is_finite() && value > 0.0 { value } else { 0.0 };
    let area = value * scale_factor;
    (area / PI).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_value() {
        assert_eq!(prop_radius(0.0, DEFAULT_SCALE_FACTOR), 0.0);
    }

    #[test]
    fn test_closed_form() {
        let v = 12_000.0;
        let expected = (v * 0.0625 / PI).sqrt();
        assert!((prop_radius(v, DEFAULT_SCALE_FACTOR) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_values_coerced() {
        assert_eq!(prop_radius(-50.0, DEFAULT_SCALE_FACTOR), 0.0);
        assert_eq!(prop_radius(f64::NAN, DEFAULT_SCALE_FACTOR), 0.0);
        assert_eq!(prop_radius(f64::INFINITY, DEFAULT_SCALE_FACTOR), 0.0);
    }

    #[test]
    fn test_area_is_linear() {
        // Quadrupling the value doubles the radius
        let r1 = prop_radius(400.0, DEFAULT_SCALE_FACTOR);
        let r4 = prop_radius(1600.0, DEFAULT_SCALE_FACTOR);
        assert!((r4 - 2.0 * r1).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn radius_is_monotonic(a in 0.0f64..1e9, b in 0.0f64..1e9) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(prop_radius(lo, DEFAULT_SCALE_FACTOR) <= prop_radius(hi, DEFAULT_SCALE_FACTOR));
        }
    }
}
