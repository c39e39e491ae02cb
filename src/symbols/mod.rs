//! Proportional-symbol model: layers of year-keyed state counts, the
//! selected year, and everything derived from them (totals, radii, legends).

mod aggregate;
mod atlas;
mod dataset;
mod format;
mod legend;
mod scale;
mod years;

pub use aggregate::{circle_summary, year_total, CircleSummary};
pub use atlas::{Atlas, Popup};
pub use dataset::{numeric, Dataset, Feature, LayerMeta};
pub use format::{format_num_commas, format_value};
pub use legend::{GlyphKind, Legend, LegendGlyph};
pub use scale::{prop_radius, DEFAULT_SCALE_FACTOR};
pub use years::{discover_years, YearSpec, PLAUSIBLE_YEARS};
