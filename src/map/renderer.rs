use std::collections::HashSet;

use ratatui::style::Color;

use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_line, draw_ring};
use crate::map::projection::Viewport;
use crate::symbols::Atlas;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Minimum hit radius in pixels, so tiny markers can still be hovered
const MIN_HIT_RADIUS: f64 = 2.0;

/// Level of detail for basemap data
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    /// Select LOD based on zoom level
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// Which map layers are drawn
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_borders: bool,
    pub show_states: bool,
    /// Ids of symbol layers switched off in the overlay control
    pub hidden_layers: HashSet<String>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_borders: true,
            show_states: true,
            hidden_layers: HashSet::new(),
        }
    }
}

impl DisplaySettings {
    pub fn layer_visible(&self, id: &str) -> bool {
        !self.hidden_layers.contains(id)
    }
}

/// Proportional symbols of one data layer, drawn in the layer's color
pub struct SymbolLayer {
    pub color: Color,
    pub canvas: BrailleCanvas,
}

/// Rasterized map, one canvas per color
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    pub states: BrailleCanvas,
    pub symbols: Vec<SymbolLayer>,
}

/// A marker under the cursor: indices into the atlas
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerHit {
    pub dataset: usize,
    pub feature: usize,
}

/// Basemap line data plus symbol rasterization
pub struct MapRenderer {
    pub coastlines_low: Vec<LineString>,
    pub coastlines_medium: Vec<LineString>,
    pub coastlines_high: Vec<LineString>,
    pub borders_medium: Vec<LineString>,
    pub borders_high: Vec<LineString>,
    pub states: Vec<LineString>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
            borders_medium: Vec::new(),
            borders_high: Vec::new(),
            states: Vec::new(),
            settings: DisplaySettings::default(),
        }
    }

    /// Coastlines for the given LOD, falling back to coarser data
    fn get_coastlines(&self, lod: Lod) -> &[LineString] {
        let order = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_low],
            Lod::Low => [&self.coastlines_low, &self.coastlines_medium, &self.coastlines_medium],
        };
        order
            .into_iter()
            .find(|lines| !lines.is_empty())
            .map(|lines| lines.as_slice())
            .unwrap_or(&[])
    }

    /// Borders for the given LOD
    fn get_borders(&self, lod: Lod) -> &[LineString] {
        match lod {
            Lod::High if !self.borders_high.is_empty() => &self.borders_high,
            _ => &self.borders_medium,
        }
    }

    /// Render basemap and symbols for a `width` x `height` character area
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport, atlas: &Atlas) -> MapLayers {
        let lod = Lod::from_zoom(viewport.zoom);

        let mut coastlines = BrailleCanvas::new(width, height);
        for line in self.get_coastlines(lod) {
            draw_linestring(&mut coastlines, line, viewport);
        }

        let mut borders = BrailleCanvas::new(width, height);
        if self.settings.show_borders {
            for line in self.get_borders(lod) {
                draw_linestring(&mut borders, line, viewport);
            }
        }

        let mut states = BrailleCanvas::new(width, height);
        if self.settings.show_states {
            for line in &self.states {
                draw_linestring(&mut states, line, viewport);
            }
        }

        let symbols = atlas
            .datasets()
            .iter()
            .filter(|d| self.settings.layer_visible(d.id()))
            .map(|dataset| {
                let mut canvas = BrailleCanvas::new(width, height);
                for feature in &dataset.features {
                    let (px, py) = viewport.project(feature.lon, feature.lat);
                    let radius = atlas.marker_radius(feature).round() as i32;
                    if viewport.circle_visible(px, py, radius) {
                        draw_ring(&mut canvas, px, py, radius);
                    }
                }
                SymbolLayer {
                    color: dataset.meta.fill_color,
                    canvas,
                }
            })
            .collect();

        MapLayers {
            coastlines,
            borders,
            states,
            symbols,
        }
    }

    /// Marker under the braille pixel (px, py). When several overlap, the
    /// smallest wins since it is the one drawn inside the others.
    pub fn hit_test(&self, atlas: &Atlas, viewport: &Viewport, px: i32, py: i32) -> Option<MarkerHit> {
        let mut best: Option<(f64, MarkerHit)> = None;

        for (dataset_idx, dataset) in atlas.datasets().iter().enumerate() {
            if !self.settings.layer_visible(dataset.id()) {
                continue;
            }
            for (feature_idx, feature) in dataset.features.iter().enumerate() {
                let (fx, fy) = viewport.project(feature.lon, feature.lat);
                let radius = atlas.marker_radius(feature).max(MIN_HIT_RADIUS);
                let dx = (px - fx) as f64;
                let dy = (py - fy) as f64;
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                if best.map_or(true, |(r, _)| radius < r) {
                    best = Some((
                        radius,
                        MarkerHit {
                            dataset: dataset_idx,
                            feature: feature_idx,
                        },
                    ));
                }
            }
        }

        best.map(|(_, hit)| hit)
    }

    /// Add coastline data at a specific LOD
    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    /// Add border data at a specific LOD
    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    /// Add state/province border
    pub fn add_state(&mut self, line: LineString) {
        self.states.push(line);
    }

    /// Check if any coastline data is loaded
    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_states(&mut self) {
        self.settings.show_states = !self.settings.show_states;
    }

    /// Show or hide a symbol layer; returns whether it is now visible
    pub fn toggle_layer(&mut self, id: &str) -> bool {
        if self.settings.hidden_layers.remove(id) {
            true
        } else {
            self.settings.hidden_layers.insert(id.to_string());
            false
        }
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            // Skip segments that wrap around the antimeridian
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}
