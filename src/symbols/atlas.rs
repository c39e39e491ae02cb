use tracing::{debug, info};

use crate::symbols::aggregate::{circle_summary, year_total};
use crate::symbols::dataset::{Dataset, Feature};
use crate::symbols::format::format_num_commas;
use crate::symbols::legend::Legend;
use crate::symbols::scale::prop_radius;

/// Popup content for a single marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    /// State name
    pub title: String,
    /// e.g. "2011 BEV Sales"
    pub desc: String,
    /// Formatted count
    pub value: String,
}

/// Owns the layer registry and the selected year.
///
/// Every derived value (totals, legends, radii) is recomputed from the raw
/// features whenever the year changes; nothing is patched incrementally.
#[derive(Debug, Clone)]
pub struct Atlas {
    year: i32,
    scale_factor: f64,
    datasets: Vec<Dataset>,
}

impl Atlas {
    pub fn new(year: i32, scale_factor: f64) -> Self {
        Self {
            year,
            scale_factor,
            datasets: Vec::new(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn get(&self, id: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.id() == id)
    }

    pub fn legend(&self, id: &str) -> Option<&Legend> {
        self.get(id).map(|d| &d.legend)
    }

    /// Register a loaded layer and compute its values for the current year.
    /// A layer with an already-registered id replaces the old one in place.
    pub fn insert(&mut self, mut dataset: Dataset) {
        refresh(&mut dataset, self.year, self.scale_factor);
        info!(
            id = dataset.id(),
            features = dataset.features.len(),
            total = dataset.total,
            "layer registered"
        );

        match self.datasets.iter_mut().find(|d| d.id() == dataset.id()) {
            Some(slot) => *slot = dataset,
            None => self.datasets.push(dataset),
        }
    }

    /// Select a new year and rebuild every layer's total and legend
    pub fn set_year(&mut self, year: i32) {
        self.year = year;
        for dataset in &mut self.datasets {
            refresh(dataset, year, self.scale_factor);
        }
        debug!(year, layers = self.datasets.len(), "recomputed layers");
    }

    /// Marker radius for a feature at the selected year
    pub fn marker_radius(&self, feature: &Feature) -> f64 {
        prop_radius(feature.value(self.year).unwrap_or(0.0), self.scale_factor)
    }

    /// Popup for a feature of the layer at `dataset_idx`
    pub fn popup(&self, dataset_idx: usize, feature_idx: usize) -> Option<Popup> {
        let dataset = self.datasets.get(dataset_idx)?;
        let feature = dataset.features.get(feature_idx)?;

        Some(Popup {
            title: feature.state.clone(),
            desc: format!("{} {} Sales", self.year, dataset.meta.abbr),
            value: format_num_commas(feature.count(self.year)),
        })
    }
}

fn refresh(dataset: &mut Dataset, year: i32, scale_factor: f64) {
    dataset.total = year_total(&dataset.features, year);
    dataset.legend = Legend::from_summary(circle_summary(&dataset.features, year), scale_factor);
}
