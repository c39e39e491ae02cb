use geojson::{JsonObject, JsonValue};
use ratatui::style::Color;

use crate::symbols::legend::Legend;

/// Display metadata for one data layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerMeta {
    /// Registry key, e.g. "evSales"
    pub id: String,
    /// Layer name shown in the sidebar, e.g. "EV Sales"
    pub label: String,
    /// Short name used in popups, e.g. "BEV"
    pub abbr: String,
    pub fill_color: Color,
}

/// One state marker: position, name and its year-keyed counts
#[derive(Debug, Clone)]
pub struct Feature {
    pub state: String,
    pub lon: f64,
    pub lat: f64,
    pub properties: JsonObject,
}

impl Feature {
    pub fn new(state: impl Into<String>, lon: f64, lat: f64, properties: JsonObject) -> Self {
        Self {
            state: state.into(),
            lon,
            lat,
            properties,
        }
    }

    /// Raw property for a year, if present
    pub fn raw(&self, year: i32) -> Option<&JsonValue> {
        self.properties.get(&year.to_string())
    }

    /// Numeric value for a year; `None` when missing or not a number
    pub fn value(&self, year: i32) -> Option<f64> {
        self.raw(year).and_then(numeric)
    }

    /// Value for a year as the legend range sees it: blank, null and
    /// `false` read as 0 and `true` as 1. `None` for a missing key or a
    /// non-numeric string.
    pub fn range_value(&self, year: i32) -> Option<f64> {
        match self.raw(year)? {
            JsonValue::Null => Some(0.0),
            JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            JsonValue::String(s) if s.trim().is_empty() => Some(0.0),
            other => numeric(other),
        }
    }

    /// Integer count for a year, truncated toward zero. Missing or falsy
    /// values count as 0; negative values are kept.
    pub fn count(&self, year: i32) -> i64 {
        match self.value(year) {
            Some(v) if v.is_finite() => v.trunc() as i64,
            _ => 0,
        }
    }
}

/// Interpret a GeoJSON property as a number. Numeric strings are accepted.
pub fn numeric(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// A data layer: metadata, its features and values cached for the selected year
#[derive(Debug, Clone)]
pub struct Dataset {
    pub meta: LayerMeta,
    pub features: Vec<Feature>,
    /// Total for the selected year (cache, rebuilt on every year change)
    pub total: i64,
    /// Legend for the selected year (cache, rebuilt on every year change)
    pub legend: Legend,
}

impl Dataset {
    pub fn new(meta: LayerMeta, features: Vec<Feature>) -> Self {
        Self {
            meta,
            features,
            total: 0,
            legend: Legend::Empty,
        }
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    /// Properties of the representative (first) feature
    pub fn sample_properties(&self) -> Option<&JsonObject> {
        self.features.first().map(|f| &f.properties)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn meta(id: &str) -> LayerMeta {
        LayerMeta {
            id: id.to_string(),
            label: format!("{id} label"),
            abbr: id.to_uppercase(),
            fill_color: Color::Rgb(0x2c, 0x7f, 0xb8),
        }
    }

    /// Build a feature from `(year, value)` pairs; `None` leaves the year out
    pub fn feature(state: &str, values: &[(i32, Option<JsonValue>)]) -> Feature {
        let mut props = JsonObject::new();
        props.insert("state".into(), JsonValue::from(state));
        for (year, value) in values {
            if let Some(v) = value {
                props.insert(year.to_string(), v.clone());
            }
        }
        Feature::new(state, -100.0, 40.0, props)
    }

    pub fn dataset(id: &str, features: Vec<Feature>) -> Dataset {
        Dataset::new(meta(id), features)
    }
}
