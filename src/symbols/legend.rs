use crate::symbols::aggregate::CircleSummary;
use crate::symbols::format::format_value;
use crate::symbols::scale::prop_radius;

/// Which end of the range a legend circle represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    Max,
    Mean,
    Min,
}

impl GlyphKind {
    pub fn name(self) -> &'static str {
        match self {
            GlyphKind::Max => "max",
            GlyphKind::Mean => "mean",
            GlyphKind::Min => "min",
        }
    }
}

/// One labeled legend circle
#[derive(Debug, Clone, PartialEq)]
pub struct LegendGlyph {
    pub kind: GlyphKind,
    pub value: f64,
    pub radius: f64,
    pub label: String,
}

impl LegendGlyph {
    fn new(kind: GlyphKind, value: f64, scale_factor: f64) -> Self {
        Self {
            kind,
            value,
            radius: prop_radius(value, scale_factor),
            label: format_value(value),
        }
    }

    /// Vertical center that rests the circle on `baseline`, so all three
    /// glyphs nest on a shared bottom edge
    pub fn center_y(&self, baseline: f64) -> f64 {
        baseline - self.radius
    }
}

/// Legend for one layer at the selected year
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Legend {
    /// No numeric values for the year: glyphs hidden
    #[default]
    Empty,
    /// Glyphs ordered max, mean, min (largest drawn first)
    Glyphs([LegendGlyph; 3]),
}

impl Legend {
    pub fn from_summary(summary: Option<CircleSummary>, scale_factor: f64) -> Self {
        match summary {
            Some(s) => Legend::Glyphs([
                LegendGlyph::new(GlyphKind::Max, s.max, scale_factor),
                LegendGlyph::new(GlyphKind::Mean, s.mean, scale_factor),
                LegendGlyph::new(GlyphKind::Min, s.min, scale_factor),
            ]),
            None => Legend::Empty,
        }
    }

    pub fn glyphs(&self) -> &[LegendGlyph] {
        match self {
            Legend::Empty => &[],
            Legend::Glyphs(glyphs) => glyphs,
        }
    }

    /// Largest glyph radius, used to size the legend canvas
    pub fn max_radius(&self) -> f64 {
        self.glyphs().iter().map(|g| g.radius).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::scale::DEFAULT_SCALE_FACTOR;

    #[test]
    fn test_glyphs_from_summary() {
        let summary = CircleSummary { min: 10.0, max: 50_000.0, mean: 25_005.0 };
        let legend = Legend::from_summary(Some(summary), DEFAULT_SCALE_FACTOR);
        let glyphs = legend.glyphs();

        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[0].kind, GlyphKind::Max);
        assert_eq!(glyphs[0].label, "50,000");
        assert_eq!(glyphs[1].label, "25,005");
        assert_eq!(glyphs[2].label, "10");
        assert!(glyphs[0].radius > glyphs[1].radius);
        assert!(glyphs[1].radius > glyphs[2].radius);
        assert_eq!(legend.max_radius(), glyphs[0].radius);
    }

    #[test]
    fn test_glyphs_share_baseline() {
        let summary = CircleSummary { min: 100.0, max: 900.0, mean: 500.0 };
        let legend = Legend::from_summary(Some(summary), DEFAULT_SCALE_FACTOR);
        for glyph in legend.glyphs() {
            let bottom = glyph.center_y(64.0) + glyph.radius;
            assert!((bottom - 64.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_fractional_midpoint_label() {
        let summary = CircleSummary { min: 1.0, max: 1234.0, mean: 617.5 };
        let legend = Legend::from_summary(Some(summary), DEFAULT_SCALE_FACTOR);
        assert_eq!(legend.glyphs()[1].label, "617.5");
    }

    #[test]
    fn test_empty_state() {
        let legend = Legend::from_summary(None, DEFAULT_SCALE_FACTOR);
        assert_eq!(legend, Legend::Empty);
        assert!(legend.glyphs().is_empty());
        assert_eq!(legend.max_radius(), 0.0);
    }
}
