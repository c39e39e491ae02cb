use std::path::PathBuf;

use thiserror::Error;

/// Failure to load one layer's GeoJSON document
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid GeoJSON in {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("{0} is not a GeoJSON FeatureCollection")]
    NotFeatureCollection(String),
}

/// Invalid or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no datasets configured")]
    NoDatasets,

    #[error("dataset id {0:?} is used more than once")]
    DuplicateId(String),

    #[error("dataset {id:?} has an invalid fill color {value:?}")]
    InvalidColor { id: String, value: String },

    #[error("invalid years: {0}")]
    InvalidYears(String),

    #[error("scale factor must be a positive number, got {0}")]
    InvalidScale(f64),
}
