use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};

use ratatui::layout::Rect;
use tracing::{info, warn};

use crate::config::Config;
use crate::data::source::{spawn_load, DatasetSource, LoadOutcome};
use crate::error::ConfigError;
use crate::map::{MapRenderer, MarkerHit, Viewport};
use crate::symbols::{discover_years, Atlas, LayerMeta, Popup, YearSpec};
use crate::ui::{self, Theme};

/// Message shown when a layer fails to load
pub const LOAD_FAILURE_MESSAGE: &str = "Unable to load GEOJSON data.";

/// Year slider over a sorted list of years. Stepping past either end wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSlider {
    years: Vec<i32>,
    index: usize,
}

impl YearSlider {
    /// `None` when there are no years to choose from
    pub fn new(mut years: Vec<i32>, initial: i32) -> Option<Self> {
        years.sort_unstable();
        years.dedup();
        if years.is_empty() {
            return None;
        }
        let mut slider = Self { years, index: 0 };
        slider.set(initial);
        Some(slider)
    }

    pub fn value(&self) -> i32 {
        self.years[self.index]
    }

    pub fn min(&self) -> i32 {
        self.years[0]
    }

    pub fn max(&self) -> i32 {
        self.years[self.years.len() - 1]
    }

    /// Advance one step; at the last year, go back to the first
    pub fn next(&mut self) -> i32 {
        self.index = if self.index + 1 >= self.years.len() { 0 } else { self.index + 1 };
        self.value()
    }

    /// Step back one; at the first year, jump to the last
    pub fn prev(&mut self) -> i32 {
        self.index = if self.index == 0 { self.years.len() - 1 } else { self.index - 1 };
        self.value()
    }

    /// Move to `year`, or the closest available year
    pub fn set(&mut self, year: i32) -> i32 {
        self.index = match self.years.binary_search(&year) {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) if i >= self.years.len() => self.years.len() - 1,
            Err(i) => {
                if year - self.years[i - 1] <= self.years[i] - year {
                    i - 1
                } else {
                    i
                }
            }
        };
        self.value()
    }

    /// Move to the year at `fraction` (0.0 = first, 1.0 = last) of the track
    pub fn set_fraction(&mut self, fraction: f64) -> i32 {
        let last = (self.years.len() - 1) as f64;
        self.index = (fraction.clamp(0.0, 1.0) * last).round() as usize;
        self.value()
    }

    /// Position of the current year along the track, 0.0..=1.0
    pub fn fraction(&self) -> f64 {
        if self.years.len() < 2 {
            0.0
        } else {
            self.index as f64 / (self.years.len() - 1) as f64
        }
    }
}

/// Load progress of a configured layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

/// A configured layer and how its load went
#[derive(Debug, Clone)]
pub struct LayerStatus {
    pub meta: LayerMeta,
    pub source: DatasetSource,
    pub state: LoadState,
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    /// Initial view, restored on reset
    home: (f64, f64, f64),
    pub map_renderer: MapRenderer,
    pub atlas: Atlas,
    pub slider: Option<YearSlider>,
    year_spec: Option<YearSpec>,
    pub layers: Vec<LayerStatus>,
    /// Marker whose popup is open
    pub popup: Option<MarkerHit>,
    /// Blocking error message; input is ignored until dismissed
    pub alert: Option<String>,
    pub theme: Theme,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    screen: Rect,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
}

impl App {
    pub fn new(config: &Config, data_dir: &Path, width: u16, height: u16) -> Result<Self, ConfigError> {
        let layers = config
            .datasets
            .iter()
            .map(|spec| {
                Ok(LayerStatus {
                    meta: spec.meta()?,
                    source: spec.source_in(data_dir),
                    state: LoadState::Loading,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let screen = Rect::new(0, 0, width, height);
        let (pixel_width, pixel_height) = map_pixels(screen);
        let [lon, lat] = config.center;
        let (tx, rx) = mpsc::channel();

        Ok(Self {
            viewport: Viewport::new(lon, lat, config.zoom, pixel_width, pixel_height),
            home: (lon, lat, config.zoom),
            map_renderer: MapRenderer::new(),
            atlas: Atlas::new(config.default_year, config.scale_factor),
            slider: None,
            year_spec: config.years.clone(),
            layers,
            popup: None,
            alert: None,
            theme: Theme::default(),
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            screen,
            tx,
            rx,
        })
    }

    /// Start loading every configured layer in the background
    pub fn spawn_loads(&self) {
        for layer in &self.layers {
            spawn_load(layer.meta.clone(), layer.source.clone(), self.tx.clone());
        }
    }

    /// Apply any finished loads. Returns true if something arrived.
    pub fn poll_loads(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.rx.try_recv() {
            self.apply_load(outcome);
            changed = true;
        }
        changed
    }

    /// Register a loaded layer, or raise an alert for a failed one
    pub fn apply_load(&mut self, outcome: LoadOutcome) {
        let LoadOutcome { id, result } = outcome;
        let Some(status) = self.layers.iter_mut().find(|l| l.meta.id == id) else {
            warn!(id = %id, "load finished for an unknown layer");
            return;
        };

        match result {
            Ok(dataset) => {
                status.state = LoadState::Ready;
                let discovered = dataset.sample_properties().map(discover_years).unwrap_or_default();
                self.atlas.insert(dataset);
                if self.slider.is_none() {
                    self.seed_slider(discovered);
                }
            }
            Err(e) => {
                let cause = e.to_string();
                status.state = LoadState::Failed(cause.clone());
                let message = match self.alert.take() {
                    Some(existing) => format!("{existing}\n{cause}"),
                    None => format!("{LOAD_FAILURE_MESSAGE}\n{cause}"),
                };
                self.alert = Some(message);
            }
        }
    }

    /// Seed the slider domain from configuration, falling back to the
    /// years found in the first layer that arrived
    fn seed_slider(&mut self, discovered: Vec<i32>) {
        let years = match &self.year_spec {
            Some(spec) => spec.years(),
            None => discovered,
        };

        match YearSlider::new(years, self.atlas.year()) {
            Some(slider) => {
                info!(min = slider.min(), max = slider.max(), "year slider ready");
                let year = slider.value();
                self.slider = Some(slider);
                if year != self.atlas.year() {
                    self.change_year(year);
                }
            }
            None => warn!("no year properties found; slider disabled"),
        }
    }

    /// The single entry point for year changes: closes popups and
    /// recomputes every layer
    fn change_year(&mut self, year: i32) {
        self.popup = None;
        self.atlas.set_year(year);
        info!(year, "year changed");
    }

    pub fn next_year(&mut self) {
        if let Some(year) = self.slider.as_mut().map(YearSlider::next) {
            self.change_year(year);
        }
    }

    pub fn prev_year(&mut self) {
        if let Some(year) = self.slider.as_mut().map(YearSlider::prev) {
            self.change_year(year);
        }
    }

    pub fn first_year(&mut self) {
        if let Some(year) = self.slider.as_mut().map(|s| s.set_fraction(0.0)) {
            self.change_year(year);
        }
    }

    pub fn last_year(&mut self) {
        if let Some(year) = self.slider.as_mut().map(|s| s.set_fraction(1.0)) {
            self.change_year(year);
        }
    }

    /// Click on the slider track; returns true if the click landed on it
    pub fn click_slider(&mut self, col: u16, row: u16) -> bool {
        let track = ui::slider_track(self.screen);
        if row != track.y || col < track.x || col >= track.x + track.width {
            return false;
        }
        let span = track.width.saturating_sub(1).max(1) as f64;
        let fraction = (col - track.x) as f64 / span;
        if let Some(year) = self.slider.as_mut().map(|s| s.set_fraction(fraction)) {
            if year != self.atlas.year() {
                self.change_year(year);
            }
        }
        true
    }

    /// Show or hide the n-th configured layer (0-based)
    pub fn toggle_layer(&mut self, index: usize) {
        if let Some(layer) = self.layers.get(index) {
            let visible = self.map_renderer.toggle_layer(&layer.meta.id);
            info!(id = %layer.meta.id, visible, "layer toggled");
            self.popup = None;
        }
    }

    pub fn layer_visible(&self, id: &str) -> bool {
        self.map_renderer.settings.layer_visible(id)
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.screen = Rect::new(0, 0, width, height);
        let (pixel_width, pixel_height) = map_pixels(self.screen);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
    }

    /// Return to the initial center and zoom
    pub fn reset_view(&mut self) {
        let (lon, lat, zoom) = self.home;
        self.viewport = Viewport::new(lon, lat, zoom, self.viewport.width, self.viewport.height);
        self.popup = None;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
        self.popup = None;
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.popup = None;
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.popup = None;
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
            self.popup = None;
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
            self.popup = None;
        }
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Layers still loading
    pub fn pending_loads(&self) -> usize {
        self.layers.iter().filter(|l| l.state == LoadState::Loading).count()
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Less sensitive when zoomed out
            let scale = if self.viewport.zoom < 4.0 {
                2
            } else if self.viewport.zoom < 8.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Track the cursor and open the popup of the marker under it
    pub fn hover(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        self.popup = self
            .map_pixel(col, row)
            .and_then(|(px, py)| self.map_renderer.hit_test(&self.atlas, &self.viewport, px, py));
    }

    /// Content of the open popup
    pub fn popup_content(&self) -> Option<Popup> {
        self.popup.and_then(|hit| self.atlas.popup(hit.dataset, hit.feature))
    }

    /// Convert a terminal cell inside the map pane to braille pixel coordinates
    pub fn map_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let inner = ui::map_inner(self.screen);
        if col < inner.x || row < inner.y || col >= inner.x + inner.width || row >= inner.y + inner.height {
            return None;
        }
        let px = (col - inner.x) as i32 * 2;
        let py = (row - inner.y) as i32 * 4;
        Some((px, py))
    }

    /// Get mouse position in braille pixel coordinates (for the cursor marker)
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        self.mouse_pos.and_then(|(col, row)| self.map_pixel(col, row))
    }
}

/// Braille pixel size of the map pane for a screen area
fn map_pixels(screen: Rect) -> (usize, usize) {
    let inner = ui::map_inner(screen);
    // Braille gives 2x4 resolution per character
    (inner.width as usize * 2, inner.height as usize * 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::symbols::{Dataset, Feature};
    use geojson::{JsonObject, JsonValue};

    fn dataset(meta: &LayerMeta, values: &[(i32, i64)]) -> Dataset {
        let mut props = JsonObject::new();
        props.insert("state".into(), JsonValue::from("California"));
        for (year, v) in values {
            props.insert(year.to_string(), JsonValue::from(*v));
        }
        Dataset::new(meta.clone(), vec![Feature::new("California", -119.4, 36.8, props)])
    }

    fn app(config: &Config) -> App {
        App::new(config, Path::new("data"), 120, 40).unwrap()
    }

    fn loaded(app: &mut App, index: usize, values: &[(i32, i64)]) {
        let meta = app.layers[index].meta.clone();
        app.apply_load(LoadOutcome {
            id: meta.id.clone(),
            result: Ok(dataset(&meta, values)),
        });
    }

    #[test]
    fn test_slider_wraps() {
        let mut slider = YearSlider::new(vec![2011, 2012, 2013], 2013).unwrap();
        assert_eq!(slider.next(), 2011);
        assert_eq!(slider.prev(), 2013);
        assert_eq!(slider.prev(), 2012);
        assert_eq!(slider.next(), 2013);
    }

    #[test]
    fn test_slider_set_snaps() {
        let mut slider = YearSlider::new(vec![2015, 2011, 2013], 2011).unwrap();
        assert_eq!((slider.min(), slider.max()), (2011, 2015));
        assert_eq!(slider.set(2014), 2013);
        assert_eq!(slider.set(1990), 2011);
        assert_eq!(slider.set(2050), 2015);
        assert_eq!(slider.set_fraction(0.5), 2013);
        assert_eq!(slider.fraction(), 0.5);
        assert!(YearSlider::new(vec![], 2011).is_none());
    }

    #[test]
    fn test_first_load_seeds_slider() {
        let config = Config::default();
        let mut app = app(&config);
        assert_eq!(app.pending_loads(), 2);

        loaded(&mut app, 0, &[(2011, 100), (2012, 200), (2013, 300)]);
        let slider = app.slider.as_ref().unwrap();
        assert_eq!((slider.min(), slider.max(), slider.value()), (2011, 2013, 2011));
        assert_eq!(app.atlas.get("evSales").unwrap().total, 100);
        assert_eq!(app.pending_loads(), 1);

        app.next_year();
        assert_eq!(app.atlas.year(), 2012);
        assert_eq!(app.atlas.get("evSales").unwrap().total, 200);

        // Later layers are computed for the year already selected
        loaded(&mut app, 1, &[(2011, 5), (2012, 7)]);
        assert_eq!(app.atlas.get("phevSales").unwrap().total, 7);
    }

    #[test]
    fn test_year_outside_domain_snaps() {
        let config = Config { default_year: 2005, ..Config::default() };
        let mut app = app(&config);
        loaded(&mut app, 0, &[(2011, 100), (2012, 200)]);
        assert_eq!(app.atlas.year(), 2011);
        assert_eq!(app.atlas.get("evSales").unwrap().total, 100);
    }

    #[test]
    fn test_configured_years_override_discovery() {
        let config = Config {
            years: Some(YearSpec::Range { first: 2012, last: 2014 }),
            ..Config::default()
        };
        let mut app = app(&config);
        loaded(&mut app, 0, &[(2011, 1), (2012, 2)]);
        let slider = app.slider.as_ref().unwrap();
        assert_eq!((slider.min(), slider.max()), (2012, 2014));
        assert_eq!(app.atlas.year(), 2012);
    }

    #[test]
    fn test_prev_wraps_to_last_year() {
        let mut app = app(&Config::default());
        loaded(&mut app, 0, &[(2011, 1), (2012, 2), (2013, 3)]);
        app.prev_year();
        assert_eq!(app.atlas.year(), 2013);
        app.first_year();
        assert_eq!(app.atlas.year(), 2011);
        app.last_year();
        assert_eq!(app.atlas.year(), 2013);
    }

    #[test]
    fn test_failed_load_raises_alert() {
        let mut app = app(&Config::default());
        app.apply_load(LoadOutcome {
            id: "phevSales".to_string(),
            result: Err(LoadError::NotFeatureCollection("phev.geojson".to_string())),
        });
        let alert = app.alert.clone().unwrap();
        assert!(alert.starts_with(LOAD_FAILURE_MESSAGE));
        assert!(matches!(app.layers[1].state, LoadState::Failed(_)));
        assert!(app.atlas.get("phevSales").is_none());
        assert!(app.slider.is_none());

        app.dismiss_alert();
        assert!(app.alert.is_none());
    }

    #[test]
    fn test_year_change_closes_popup() {
        let mut app = app(&Config::default());
        loaded(&mut app, 0, &[(2011, 100), (2012, 200)]);
        app.popup = Some(MarkerHit { dataset: 0, feature: 0 });
        assert_eq!(app.popup_content().unwrap().desc, "2011 BEV Sales");
        app.next_year();
        assert!(app.popup.is_none());
    }

    #[test]
    fn test_hover_opens_popup() {
        let mut app = app(&Config::default());
        loaded(&mut app, 0, &[(2011, 200_000)]);

        let (px, py) = app.viewport.project(-119.4, 36.8);
        let inner = ui::map_inner(Rect::new(0, 0, 120, 40));
        let col = inner.x + (px / 2) as u16;
        let row = inner.y + (py / 4) as u16;

        app.hover(col, row);
        let popup = app.popup_content().unwrap();
        assert_eq!(popup.title, "California");
        assert_eq!(popup.value, "200,000");

        app.toggle_layer(0);
        assert!(!app.layer_visible("evSales"));
        app.hover(col, row);
        assert!(app.popup.is_none());
    }

    #[test]
    fn test_map_pixel_outside_map() {
        let app = app(&Config::default());
        assert_eq!(app.map_pixel(0, 0), None);
        let inner = ui::map_inner(Rect::new(0, 0, 120, 40));
        assert_eq!(app.map_pixel(inner.x + 3, inner.y + 2), Some((6, 8)));
    }
}
