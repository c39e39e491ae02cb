use crate::symbols::dataset::Feature;

/// Range of a layer's values for one year, used to calibrate the legend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleSummary {
    pub min: f64,
    pub max: f64,
    /// Midpoint of the range: `(max + min) / 2`, not the average of all values
    pub mean: f64,
}

/// Sum of every feature's count for `year`; missing values contribute 0
pub fn year_total(features: &[Feature], year: i32) -> i64 {
    features
        .iter()
        .fold(0i64, |acc, f| acc.saturating_add(f.count(year)))
}

/// Min, max and midpoint of the numeric values for `year`.
///
/// Null, blank and `false` values count as 0; features with no value for
/// the year or a non-numeric one are skipped. Returns `None` when nothing
/// is left, which the legend renders as its empty state.
pub fn circle_summary(features: &[Feature], year: i32) -> Option<CircleSummary> {
    let mut range: Option<(f64, f64)> = None;

    for value in features.iter().filter_map(|f| f.range_value(year)) {
        if !value.is_finite() {
            continue;
        }
        range = Some(match range {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }

    range.map(|(min, max)| CircleSummary {
        min,
        max,
        mean: (max + min) / 2.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::dataset::fixtures::feature;
    use geojson::JsonValue;

    fn v(n: i64) -> Option<JsonValue> {
        Some(JsonValue::from(n))
    }

    #[test]
    fn test_total_skips_missing() {
        let features = vec![
            feature("A", &[(2011, v(100))]),
            feature("B", &[(2011, v(0))]),
            feature("C", &[(2012, v(999))]),
            feature("D", &[(2011, v(300))]),
        ];
        assert_eq!(year_total(&features, 2011), 400);
        assert_eq!(year_total(&features, 2012), 999);
        assert_eq!(year_total(&features, 2013), 0);
    }

    #[test]
    fn test_total_parses_numeric_strings() {
        let features = vec![
            feature("A", &[(2011, Some(JsonValue::from("1500")))]),
            feature("B", &[(2011, Some(JsonValue::from("25")))]),
        ];
        assert_eq!(year_total(&features, 2011), 1525);
    }

    #[test]
    fn test_summary_uses_midpoint() {
        let features = vec![
            feature("A", &[(2011, v(10))]),
            feature("B", &[(2011, v(50))]),
            feature("C", &[(2011, v(30))]),
        ];
        let summary = circle_summary(&features, 2011).unwrap();
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 50.0);
        assert_eq!(summary.mean, 30.0);

        // Average of all three would be 30 too; skew the data to tell them apart
        let skewed = vec![
            feature("A", &[(2011, v(10))]),
            feature("B", &[(2011, v(12))]),
            feature("C", &[(2011, v(50))]),
        ];
        assert_eq!(circle_summary(&skewed, 2011).unwrap().mean, 30.0);
    }

    #[test]
    fn test_summary_skips_missing() {
        let features = vec![
            feature("A", &[(2011, v(10))]),
            feature("B", &[(2012, v(1))]),
            feature("C", &[(2011, Some(JsonValue::from("oops")))]),
        ];
        let summary = circle_summary(&features, 2011).unwrap();
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 10.0);
    }

    #[test]
    fn test_total_keeps_negatives() {
        let features = vec![feature("A", &[(2011, v(100))]), feature("B", &[(2011, v(-30))])];
        assert_eq!(year_total(&features, 2011), 70);
    }

    #[test]
    fn test_summary_blank_values_are_zero() {
        let features = vec![
            feature("A", &[(2011, v(10))]),
            feature("B", &[(2011, Some(JsonValue::Null))]),
            feature("C", &[(2011, Some(JsonValue::from("")))]),
            feature("D", &[(2011, v(50))]),
        ];
        let summary = circle_summary(&features, 2011).unwrap();
        assert_eq!(summary.min, 0.0);
        assert_eq!(summary.max, 50.0);
        assert_eq!(summary.mean, 25.0);
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(circle_summary(&[], 2011), None);
        let features = vec![feature("A", &[(2012, v(1))])];
        assert_eq!(circle_summary(&features, 2011), None);
    }
}
