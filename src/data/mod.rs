pub mod source;

use crate::map::{Lod, MapRenderer};
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Load whatever Natural Earth basemap GeoJSON is present in `data_dir`.
/// Missing files are skipped; unreadable ones are logged and skipped.
pub fn load_basemap(renderer: &mut MapRenderer, data_dir: &Path) {
    let coastline_files = [
        ("ne_110m_coastline.json", Lod::Low),
        ("ne_50m_coastline.json", Lod::Medium),
        ("ne_10m_coastline.json", Lod::High),
    ];

    for (filename, lod) in coastline_files {
        let path = data_dir.join(filename);
        if path.exists() {
            if let Err(e) = load_lines(&path, |line| renderer.add_coastline(line, lod)) {
                warn!("Failed to load {}: {:#}", filename, e);
            }
        }
    }

    let border_files = [
        ("ne_50m_borders.json", Lod::Medium),
        ("ne_10m_borders.json", Lod::High),
    ];

    for (filename, lod) in border_files {
        let path = data_dir.join(filename);
        if path.exists() {
            if let Err(e) = load_lines(&path, |line| renderer.add_border(line, lod)) {
                warn!("Failed to load {}: {:#}", filename, e);
            }
        }
    }

    // State outlines give the symbols their geographic context
    let states_path = data_dir.join("ne_10m_states.json");
    if states_path.exists() {
        if let Err(e) = load_lines(&states_path, |line| renderer.add_state(line)) {
            warn!("Failed to load states: {:#}", e);
        }
    }

    debug!(has_data = renderer.has_data(), "basemap loaded");
}

/// Read a GeoJSON file and feed every line/ring in it to `add_line`
fn load_lines<F>(path: &Path, add_line: F) -> Result<()>
where
    F: FnMut(Vec<(f64, f64)>),
{
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content.parse().context("parsing GeoJSON")?;
    process_geojson_lines(&geojson, add_line);
    Ok(())
}

/// Process GeoJSON and extract line features
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_lines(geometry, &mut add_line);
        }
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    let to_line = |coords: &[Vec<f64>]| -> Vec<(f64, f64)> { coords.iter().map(|c| (c[0], c[1])).collect() };

    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(to_line(coords));
            }
        }
        // Exterior rings only
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_line(to_line(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Rough outline of the contiguous United States, used when no basemap
/// files are available
pub fn generate_simple_basemap(renderer: &mut MapRenderer) {
    renderer.add_coastline(
        vec![
            // Pacific coast, north to south
            (-124.7, 48.4), (-124.1, 46.9), (-124.0, 44.6), (-124.4, 42.0),
            (-123.8, 39.8), (-122.5, 37.8), (-121.9, 36.6), (-120.6, 34.6),
            (-118.5, 34.0), (-117.1, 32.5),
            // Mexican border
            (-114.7, 32.7), (-111.1, 31.3), (-108.2, 31.3), (-106.5, 31.8),
            (-104.5, 29.6), (-103.1, 29.0), (-101.4, 29.8), (-99.5, 27.5),
            (-97.2, 25.9),
            // Gulf coast
            (-97.4, 27.8), (-95.0, 29.3), (-93.8, 29.7), (-91.0, 29.2),
            (-89.4, 29.0), (-89.6, 30.2), (-88.0, 30.7), (-85.4, 29.7),
            (-84.0, 30.1), (-82.7, 28.0), (-81.8, 26.1), (-80.9, 25.1),
            // Atlantic coast
            (-80.1, 26.8), (-80.6, 28.4), (-81.4, 30.7), (-80.9, 32.1),
            (-79.0, 33.6), (-77.0, 34.6), (-75.5, 35.2), (-76.0, 37.0),
            (-75.2, 38.5), (-74.0, 40.5), (-72.0, 41.1), (-70.0, 41.8),
            (-70.6, 43.0), (-69.0, 44.1), (-67.0, 44.8),
            // Canadian border
            (-67.8, 47.1), (-69.2, 47.4), (-70.9, 45.3), (-74.7, 45.0),
            (-76.8, 43.6), (-79.1, 43.3), (-79.0, 42.7), (-82.5, 41.7),
            (-83.1, 42.3), (-82.4, 43.0), (-82.4, 45.3), (-84.1, 46.5),
            (-88.4, 48.3), (-89.6, 48.0), (-95.2, 49.0), (-123.0, 49.0),
            (-124.7, 48.4),
        ],
        Lod::Low,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_polygon_exterior_only() {
        let doc = r#"{"type": "Polygon", "coordinates": [
            [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]],
            [[0.2, 0.2], [0.4, 0.2], [0.4, 0.4], [0.2, 0.2]]
        ]}"#;
        let geojson: GeoJson = doc.parse().unwrap();
        let mut lines = Vec::new();
        process_geojson_lines(&geojson, |line| lines.push(line));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 4);
    }

    #[test]
    fn test_load_basemap_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("ne_10m_states.json")).unwrap();
        write!(
            file,
            r#"{{"type": "FeatureCollection", "features": [
                {{"type": "Feature", "properties": {{}},
                  "geometry": {{"type": "LineString", "coordinates": [[-100.0, 40.0], [-90.0, 40.0]]}}}}
            ]}}"#
        )
        .unwrap();

        let mut renderer = MapRenderer::new();
        load_basemap(&mut renderer, dir.path());
        assert_eq!(renderer.states.len(), 1);
        assert!(!renderer.has_data());
    }

    #[test]
    fn test_fallback_outline() {
        let mut renderer = MapRenderer::new();
        generate_simple_basemap(&mut renderer);
        assert!(renderer.has_data());
    }
}
