use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;

use geojson::{GeoJson, Value};
use tracing::{debug, error, info, warn};

use crate::error::LoadError;
use crate::symbols::{Dataset, Feature, LayerMeta};

/// HTTP request timeout for remote layers
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a layer's GeoJSON document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    File(PathBuf),
    Url(String),
}

impl DatasetSource {
    /// URLs are used as-is; relative paths resolve against `data_dir`
    pub fn resolve(source: &str, data_dir: &Path) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            return DatasetSource::Url(source.to_string());
        }
        let path = Path::new(source);
        if path.is_absolute() {
            DatasetSource::File(path.to_path_buf())
        } else {
            DatasetSource::File(data_dir.join(path))
        }
    }

    /// Read the raw document bytes
    pub fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        match self {
            DatasetSource::File(path) => fs::read(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            }),
            DatasetSource::Url(url) => fetch_url(url),
        }
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::File(path) => write!(f, "{}", path.display()),
            DatasetSource::Url(url) => f.write_str(url),
        }
    }
}

fn fetch_url(url: &str) -> Result<Vec<u8>, LoadError> {
    let http_err = |source| LoadError::Http {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(http_err)?;

    let response = client.get(url).send().map_err(http_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().map_err(http_err)?;
    Ok(body.to_vec())
}

/// Parse a FeatureCollection into a layer.
///
/// Only Point features become markers; anything else is dropped so that
/// totals and legend ranges iterate the same set of features.
pub fn parse_dataset(meta: LayerMeta, mut bytes: Vec<u8>, origin: &str) -> Result<Dataset, LoadError> {
    let geojson: GeoJson = simd_json::serde::from_slice(&mut bytes).map_err(|e| LoadError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(LoadError::NotFeatureCollection(origin.to_string()));
    };

    let mut features = Vec::with_capacity(collection.features.len());
    let mut dropped = 0usize;

    for feature in collection.features {
        let position = feature.geometry.as_ref().and_then(|g| match &g.value {
            Value::Point(coords) if coords.len() >= 2 => Some((coords[0], coords[1])),
            _ => None,
        });

        let Some((lon, lat)) = position else {
            dropped += 1;
            continue;
        };

        let properties = feature.properties.unwrap_or_default();
        let state = properties
            .get("state")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string();

        features.push(Feature::new(state, lon, lat, properties));
    }

    if dropped > 0 {
        warn!(id = %meta.id, dropped, "skipped features without a point geometry");
    }
    debug!(id = %meta.id, kept = features.len(), "parsed layer");

    Ok(Dataset::new(meta, features))
}

/// Fetch and parse one layer
pub fn load_dataset(meta: LayerMeta, source: &DatasetSource) -> Result<Dataset, LoadError> {
    let origin = source.to_string();
    info!(id = %meta.id, source = %origin, "loading layer");
    let bytes = source.fetch()?;
    parse_dataset(meta, bytes, &origin)
}

/// Result of a background layer load
#[derive(Debug)]
pub struct LoadOutcome {
    pub id: String,
    pub result: Result<Dataset, LoadError>,
}

/// Load a layer on the rayon pool and report back over `tx`.
/// Loads are independent: each one completes (or fails) on its own.
pub fn spawn_load(meta: LayerMeta, source: DatasetSource, tx: Sender<LoadOutcome>) {
    // Blocks a pool thread on I/O. Fine for a handful of layers; the pool
    // has no other work while layers load.
    rayon::spawn(move || {
        let id = meta.id.clone();
        let result = load_dataset(meta, &source);
        if let Err(e) = &result {
            error!(id = %id, error = %e, "layer load failed");
        }
        // Receiver gone means the app already quit
        let _ = tx.send(LoadOutcome { id, result });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn meta() -> LayerMeta {
        LayerMeta {
            id: "evSales".to_string(),
            label: "EV Sales".to_string(),
            abbr: "BEV".to_string(),
            fill_color: Color::Blue,
        }
    }

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-119.4, 36.8]},
             "properties": {"state": "California", "2011": 5302, "2012": "14887"}},
            {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]},
             "properties": {"state": "Nowhere", "2011": 1}},
            {"type": "Feature", "geometry": null, "properties": {"state": "Ghost"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-120.5, 44.0]},
             "properties": {"2011": 612}}
        ]
    }"#;

    #[test]
    fn test_parse_keeps_points_only() {
        let dataset = parse_dataset(meta(), COLLECTION.as_bytes().to_vec(), "test").unwrap();
        assert_eq!(dataset.features.len(), 2);
        assert_eq!(dataset.features[0].state, "California");
        assert_eq!(dataset.features[0].lon, -119.4);
        assert_eq!(dataset.features[0].count(2012), 14_887);
        assert_eq!(dataset.features[1].state, "Unknown");
    }

    #[test]
    fn test_parse_rejects_non_collection() {
        let doc = r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#;
        let err = parse_dataset(meta(), doc.as_bytes().to_vec(), "point").unwrap_err();
        assert!(matches!(err, LoadError::NotFeatureCollection(_)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_dataset(meta(), b"{not json".to_vec(), "junk").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_resolve_source() {
        let dir = Path::new("data");
        assert_eq!(
            DatasetSource::resolve("https://example.com/ev.geojson", dir),
            DatasetSource::Url("https://example.com/ev.geojson".to_string())
        );
        assert_eq!(
            DatasetSource::resolve("ev.geojson", dir),
            DatasetSource::File(PathBuf::from("data/ev.geojson"))
        );
    }

    #[test]
    fn test_missing_file() {
        let source = DatasetSource::File(PathBuf::from("/no/such/layer.geojson"));
        assert!(matches!(load_dataset(meta(), &source), Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_spawn_load_reports_back() {
        let (tx, rx) = std::sync::mpsc::channel();
        spawn_load(meta(), DatasetSource::File(PathBuf::from("/no/such/layer.geojson")), tx);
        let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.id, "evSales");
        assert!(outcome.result.is_err());
    }
}
