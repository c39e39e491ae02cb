use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ratatui::style::Color;
use serde::Deserialize;

use crate::data::source::DatasetSource;
use crate::error::ConfigError;
use crate::symbols::{LayerMeta, YearSpec, DEFAULT_SCALE_FACTOR};

/// One data layer as configured
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetSpec {
    pub id: String,
    pub label: String,
    pub abbr: String,
    /// `#rrggbb`
    pub fill_color: String,
    /// Local path (relative to `data_dir`) or `http(s)://` URL
    pub source: String,
}

impl DatasetSpec {
    /// Display metadata; the color must already have passed validation
    pub fn meta(&self) -> Result<LayerMeta, ConfigError> {
        let fill_color = Color::from_str(&self.fill_color).map_err(|_| ConfigError::InvalidColor {
            id: self.id.clone(),
            value: self.fill_color.clone(),
        })?;

        Ok(LayerMeta {
            id: self.id.clone(),
            label: self.label.clone(),
            abbr: self.abbr.clone(),
            fill_color,
        })
    }

    pub fn source_in(&self, data_dir: &Path) -> DatasetSource {
        DatasetSource::resolve(&self.source, data_dir)
    }
}

/// Application configuration, read from TOML. Missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Year selected at startup
    pub default_year: i32,
    /// Area scale factor for marker radii
    pub scale_factor: f64,
    /// Directory that relative dataset sources resolve against
    pub data_dir: PathBuf,
    /// Directory holding optional Natural Earth basemap files
    pub basemap_dir: PathBuf,
    /// Initial map center as `[lon, lat]`
    pub center: [f64; 2],
    pub zoom: f64,
    /// Explicit slider domain; inferred from the data when absent
    pub years: Option<YearSpec>,
    pub datasets: Vec<DatasetSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_year: 2011,
            scale_factor: DEFAULT_SCALE_FACTOR,
            data_dir: PathBuf::from("data"),
            basemap_dir: PathBuf::from("data"),
            center: [-96.0, 37.8],
            zoom: 4.0,
            years: None,
            datasets: vec![
                DatasetSpec {
                    id: "evSales".to_string(),
                    label: "EV Sales".to_string(),
                    abbr: "BEV".to_string(),
                    fill_color: "#2c7fb8".to_string(),
                    source: "ev-registrations-by-state-year-geocoded.geojson".to_string(),
                },
                DatasetSpec {
                    id: "phevSales".to_string(),
                    label: "PHEV Sales".to_string(),
                    abbr: "PHEV".to_string(),
                    fill_color: "#7fcdbb".to_string(),
                    source: "phev-registrations-by-state-year-geocoded.geojson".to_string(),
                },
            ],
        }
    }
}

impl Config {
    /// Read and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.datasets.is_empty() {
            return Err(ConfigError::NoDatasets);
        }

        let mut seen = HashSet::new();
        for spec in &self.datasets {
            if !seen.insert(spec.id.as_str()) {
                return Err(ConfigError::DuplicateId(spec.id.clone()));
            }
            spec.meta()?;
        }

        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(ConfigError::InvalidScale(self.scale_factor));
        }

        if let Some(years) = &self.years {
            years.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_year, 2011);
        assert_eq!(config.datasets[0].meta().unwrap().fill_color, Color::Rgb(0x2c, 0x7f, 0xb8));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml("default_year = 2014\nyears = { first = 2011, last = 2016 }\n").unwrap();
        assert_eq!(config.default_year, 2014);
        assert_eq!(config.scale_factor, DEFAULT_SCALE_FACTOR);
        assert_eq!(config.datasets.len(), 2);
        assert_eq!(config.years, Some(YearSpec::Range { first: 2011, last: 2016 }));
    }

    #[test]
    fn test_year_list() {
        let config = Config::from_toml("years = [2013, 2011]\n").unwrap();
        assert_eq!(config.years.unwrap().years(), vec![2011, 2013]);
    }

    #[test]
    fn test_rejects_bad_color() {
        let toml = r##"
[[datasets]]
id = "evSales"
label = "EV Sales"
abbr = "BEV"
fill_color = "#zzzzzz"
source = "ev.geojson"
"##;
        assert!(matches!(Config::from_toml(toml), Err(ConfigError::InvalidColor { .. })));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut config = Config::default();
        config.datasets[1].id = "evSales".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateId(_))));
    }

    #[test]
    fn test_rejects_bad_scale_and_years() {
        let config = Config { scale_factor: 0.0, ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidScale(_))));

        let result = Config::from_toml("years = { first = 2016, last = 2011 }\n");
        assert!(matches!(result, Err(ConfigError::InvalidYears(_))));
    }

    #[test]
    fn test_rejects_unbounded_year_range() {
        let result = Config::from_toml("years = { first = -2147483648, last = 2147483647 }\n");
        assert!(matches!(result, Err(ConfigError::InvalidYears(_))));
        let result = Config::from_toml("years = [2011, 99999]\n");
        assert!(matches!(result, Err(ConfigError::InvalidYears(_))));
    }

    #[test]
    fn test_rejects_empty_datasets() {
        let config = Config { datasets: Vec::new(), ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::NoDatasets)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "zoom = 5.5").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.zoom, 5.5);

        let missing = Config::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
