use std::fs;

use ev_map::config::Config;
use ev_map::data::source::{load_dataset, DatasetSource};
use ev_map::error::LoadError;
use ev_map::symbols::{Atlas, Legend};

const LAYER: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    { "type": "Feature",
      "geometry": { "type": "Point", "coordinates": [-119.4, 36.8] },
      "properties": { "state": "California", "2011": 5302, "2012": 14887, "2013": "n/a" } },
    { "type": "Feature",
      "geometry": { "type": "Point", "coordinates": [-120.5, 47.4] },
      "properties": { "state": "Washington", "2011": 688, "2012": 1697 } },
    { "type": "Feature",
      "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] },
      "properties": { "state": "Nowhere", "2011": 1000000 } }
  ]
}"#;

#[test]
fn load_file_and_switch_years() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("ev.geojson"), LAYER).unwrap();

    let config = Config::default();
    let meta = config.datasets[0].meta().unwrap();
    let source = DatasetSource::resolve("ev.geojson", dir.path());
    let dataset = load_dataset(meta, &source).unwrap();
    assert_eq!(dataset.features.len(), 2);

    let mut atlas = Atlas::new(2011, config.scale_factor);
    atlas.insert(dataset);
    let ev = atlas.get("evSales").unwrap();
    assert_eq!(ev.total, 5302 + 688);
    let legend_2011 = ev.legend.clone();
    assert_eq!(legend_2011.glyphs()[0].label, "5,302");

    atlas.set_year(2013);
    let ev = atlas.get("evSales").unwrap();
    assert_eq!(ev.total, 0);
    assert_eq!(ev.legend, Legend::Empty);

    atlas.set_year(2012);
    assert_eq!(atlas.get("evSales").unwrap().total, 14887 + 1697);

    // Coming back gives the same derived state as the first visit
    atlas.set_year(2011);
    let ev = atlas.get("evSales").unwrap();
    assert_eq!(ev.total, 5302 + 688);
    assert_eq!(ev.legend, legend_2011);
}

#[test]
fn missing_file_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let meta = Config::default().datasets[1].meta().unwrap();
    let source = DatasetSource::resolve("absent.geojson", dir.path());
    assert!(matches!(load_dataset(meta, &source), Err(LoadError::Io { .. })));
}
