use crate::app::{App, LoadState};
use crate::braille::BrailleCanvas;
use crate::map::{draw_circle, draw_ring, Lod, MapLayers, SymbolLayer};
use crate::symbols::{format_num_commas, Legend};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

/// Width of the totals/legend sidebar in columns
const SIDEBAR_WIDTH: u16 = 36;
/// Rows of braille reserved for each legend
const LEGEND_ROWS: u16 = 6;
/// Columns taken by the year labels at each end of the slider track
const SLIDER_LABEL_WIDTH: u16 = 7;

/// Base map palette (light/dark base layers)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Colors for one theme
pub struct Palette {
    pub background: Color,
    pub coastline: Color,
    pub border: Color,
    pub state: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: Color::Rgb(242, 241, 236),
                coastline: Color::Rgb(110, 110, 110),
                border: Color::Rgb(150, 150, 150),
                state: Color::Rgb(185, 185, 185),
                text: Color::Rgb(40, 40, 40),
                muted: Color::Rgb(120, 120, 120),
                accent: Color::Rgb(44, 127, 184),
            },
            Theme::Dark => Palette {
                background: Color::Rgb(24, 26, 30),
                coastline: Color::Rgb(140, 150, 160),
                border: Color::Rgb(90, 95, 100),
                state: Color::Rgb(70, 74, 80),
                text: Color::Rgb(230, 230, 230),
                muted: Color::Rgb(130, 130, 130),
                accent: Color::Rgb(127, 205, 187),
            },
        }
    }
}

/// Screen regions
pub struct AppLayout {
    pub map: Rect,
    pub sidebar: Rect,
    pub slider: Rect,
    pub status: Rect,
}

pub fn layout(area: Rect) -> AppLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map + sidebar
            Constraint::Length(3), // Slider
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(SIDEBAR_WIDTH)])
        .split(rows[0]);

    AppLayout {
        map: columns[0],
        sidebar: columns[1],
        slider: rows[1],
        status: rows[2],
    }
}

/// Map pane inside its border
pub fn map_inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(layout(area).map)
}

/// Clickable part of the slider, between the two year labels
pub fn slider_track(area: Rect) -> Rect {
    let inner = Block::default().borders(Borders::ALL).inner(layout(area).slider);
    Rect {
        x: inner.x + SLIDER_LABEL_WIDTH.min(inner.width),
        y: inner.y,
        width: inner.width.saturating_sub(2 * SLIDER_LABEL_WIDTH),
        height: inner.height.min(1),
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let regions = layout(area);
    let palette = app.theme.palette();

    frame.render_widget(Block::default().style(Style::default().bg(palette.background)), area);

    render_map(frame, app, regions.map, &palette);
    render_sidebar(frame, app, regions.sidebar, &palette);
    render_slider(frame, app, regions.slider, &palette);
    render_status_bar(frame, app, regions.status, &palette);

    if let Some(message) = &app.alert {
        render_alert(frame, message, area, &palette);
    }
}

fn render_map(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.muted))
        .title(Span::styled(
            " EV Registrations by State ",
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let mut layers = app
        .map_renderer
        .render(inner.width as usize, inner.height as usize, &viewport, &app.atlas);

    // Mark the center of the marker whose popup is open
    if let Some(hit) = app.popup {
        let feature = &app.atlas.datasets()[hit.dataset].features[hit.feature];
        let (px, py) = viewport.project(feature.lon, feature.lat);
        let mut canvas = BrailleCanvas::new(inner.width as usize, inner.height as usize);
        draw_circle(&mut canvas, px, py, 1);
        layers.symbols.push(SymbolLayer { color: palette.text, canvas });
    }

    let cursor_pos = app.mouse_pixel_pos().map(|(px, py)| ((px / 2) as u16, (py / 4) as u16));

    frame.render_widget(
        MapWidget {
            layers,
            cursor_pos,
            coastline: palette.coastline,
            border: palette.border,
            state: palette.state,
        },
        inner,
    );

    // Popup sits above its marker, offset by the marker radius
    if let (Some(hit), Some(popup)) = (app.popup, app.popup_content()) {
        let feature = &app.atlas.datasets()[hit.dataset].features[hit.feature];
        let (px, py) = viewport.project(feature.lon, feature.lat);
        let radius = app.atlas.marker_radius(feature);
        let anchor_col = inner.x as i32 + px / 2;
        let anchor_row = inner.y as i32 + ((py as f64 - radius) / 4.0) as i32;

        let lines = vec![
            Line::from(Span::styled(popup.title, Style::default().fg(palette.text).add_modifier(Modifier::BOLD))),
            Line::from(Span::styled(popup.desc, Style::default().fg(palette.muted))),
            Line::from(Span::styled(popup.value, Style::default().fg(palette.accent).add_modifier(Modifier::BOLD))),
        ];
        let width = lines.iter().map(Line::width).max().unwrap_or(0) as u16 + 4;
        let rect = popup_rect(inner, anchor_col, anchor_row, width, lines.len() as u16 + 2);

        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.muted))
                    .style(Style::default().bg(palette.background)),
            ),
            rect,
        );
    }
}

/// Place a `width` x `height` box centered above (col, row), kept inside `bounds`
fn popup_rect(bounds: Rect, col: i32, row: i32, width: u16, height: u16) -> Rect {
    let width = width.min(bounds.width);
    let height = height.min(bounds.height);
    let max_x = (bounds.x + bounds.width - width) as i32;
    let max_y = (bounds.y + bounds.height - height) as i32;
    let x = (col - width as i32 / 2).clamp(bounds.x as i32, max_x);
    let y = (row - height as i32).clamp(bounds.y as i32, max_y);
    Rect::new(x as u16, y as u16, width, height)
}

/// Braille map with basemap and symbol layers composited by color
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
    coastline: Color,
    border: Color,
    state: Color,
}

/// Copy a braille canvas into the buffer, skipping empty cells
fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
    for (row_idx, row_str) in canvas.rows().enumerate() {
        if row_idx >= area.height as usize {
            break;
        }
        let y = area.y + row_idx as u16;

        for (col_idx, ch) in row_str.chars().enumerate() {
            if col_idx >= area.width as usize {
                break;
            }
            if ch == '\u{2800}' {
                continue;
            }
            let x = area.x + col_idx as u16;
            buf[(x, y)].set_char(ch).set_fg(color);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: states, borders, coastlines, then symbols in layer order
        render_layer(&self.layers.states, self.state, area, buf);
        render_layer(&self.layers.borders, self.border, area, buf);
        render_layer(&self.layers.coastlines, self.coastline, area, buf);
        for symbols in &self.layers.symbols {
            render_layer(&symbols.canvas, symbols.color, area, buf);
        }

        if let Some((cx, cy)) = self.cursor_pos {
            let x = area.x + cx;
            let y = area.y + cy;
            if x < area.x + area.width && y < area.y + area.height {
                buf[(x, y)].set_char('╋').set_fg(Color::Red);
            }
        }
    }
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.muted))
        .title(Span::styled(" Sales ", Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut constraints = vec![Constraint::Length(2)];
    constraints.extend(app.layers.iter().map(|_| Constraint::Length(LEGEND_ROWS + 3)));
    constraints.push(Constraint::Min(0));
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    // Temporal legend
    let year = Paragraph::new(Line::from(vec![
        Span::styled("Year ", Style::default().fg(palette.muted)),
        Span::styled(
            app.atlas.year().to_string(),
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
        ),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(year, sections[0]);

    for (idx, layer) in app.layers.iter().enumerate() {
        let section = sections[idx + 1];
        let visible = app.layer_visible(&layer.meta.id);
        let name_style = if visible {
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };

        let header = Line::from(vec![
            Span::styled(format!("[{}] ", idx + 1), Style::default().fg(palette.muted)),
            Span::styled("● ", Style::default().fg(layer.meta.fill_color)),
            Span::styled(layer.meta.label.clone(), name_style),
            Span::styled(if visible { "" } else { " (hidden)" }, Style::default().fg(palette.muted)),
        ]);

        let dataset = app.atlas.get(&layer.meta.id);
        let detail = match (&layer.state, dataset) {
            (LoadState::Ready, Some(d)) => Line::from(vec![
                Span::styled("    Total ", Style::default().fg(palette.muted)),
                Span::styled(format_num_commas(d.total), Style::default().fg(palette.text)),
            ]),
            (LoadState::Failed(_), _) => {
                Line::from(Span::styled("    unavailable", Style::default().fg(Color::Red)))
            }
            _ => Line::from(Span::styled("    loading…", Style::default().fg(palette.muted))),
        };

        let text_area = Rect { height: 2.min(section.height), ..section };
        frame.render_widget(Paragraph::new(vec![header, detail]), text_area);

        let legend_area = Rect {
            y: section.y + text_area.height,
            height: section.height.saturating_sub(text_area.height + 1),
            ..section
        };
        if let Some(d) = dataset {
            render_legend(frame, &d.legend, layer.meta.fill_color, legend_area, palette);
        }
    }
}

/// Nested min/mean/max circles resting on a shared baseline, labels to the right
fn render_legend(frame: &mut Frame, legend: &Legend, color: Color, area: Rect, palette: &Palette) {
    if area.height == 0 || area.width < 4 {
        return;
    }

    let glyphs = legend.glyphs();
    if glyphs.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("    —  no data for this year", Style::default().fg(palette.muted))),
            area,
        );
        return;
    }

    let label_width = 16u16;
    let max_cols = area.width.saturating_sub(label_width + 4).max(1);
    let max_radius = legend.max_radius();
    let cols = ((max_radius * 2.0 + 2.0) / 2.0).ceil().clamp(1.0, max_cols as f64) as u16;

    let canvas_area = Rect { x: area.x + 4, width: cols, ..area };
    let mut canvas = BrailleCanvas::new(cols as usize, area.height as usize);
    let baseline = (area.height as f64) * 4.0 - 1.0;
    let cx = max_radius.round() as i32;
    for glyph in glyphs {
        let cy = glyph.center_y(baseline).round() as i32;
        draw_ring(&mut canvas, cx, cy, glyph.radius.round() as i32);
    }
    frame.render_widget(LegendWidget { canvas, color }, canvas_area);

    // Labels on fixed rows: max at the top, mean in the middle, min at the bottom
    let label_x = canvas_area.x + cols + 2;
    let label_rows = [area.y, area.y + area.height / 2, area.y + area.height - 1];
    for (glyph, row) in glyphs.iter().zip(label_rows) {
        let rect = Rect::new(label_x, row, (area.x + area.width).saturating_sub(label_x), 1);
        let text = Line::from(vec![
            Span::styled(format!("{:<5}", glyph.kind.name()), Style::default().fg(palette.muted)),
            Span::styled(glyph.label.clone(), Style::default().fg(palette.text)),
        ]);
        frame.render_widget(Paragraph::new(text), rect);
    }
}

struct LegendWidget {
    canvas: BrailleCanvas,
    color: Color,
}

impl Widget for LegendWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        render_layer(&self.canvas, self.color, area, buf);
    }
}

fn render_slider(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.muted))
        .title(Span::styled(" Year ", Style::default().fg(palette.accent)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(slider) = &app.slider else {
        let text = if app.pending_loads() > 0 { "waiting for data…" } else { "no years available" };
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(palette.muted))).alignment(Alignment::Center),
            inner,
        );
        return;
    };

    let track_width = inner.width.saturating_sub(2 * SLIDER_LABEL_WIDTH) as usize;
    let knob = (slider.fraction() * track_width.saturating_sub(1) as f64).round() as usize;

    let mut spans = vec![Span::styled(
        format!("◀ {:<4} ", slider.min()),
        Style::default().fg(palette.muted),
    )];
    if track_width > 0 {
        spans.push(Span::styled("━".repeat(knob), Style::default().fg(palette.accent)));
        spans.push(Span::styled("●", Style::default().fg(palette.text).add_modifier(Modifier::BOLD)));
        spans.push(Span::styled(
            "─".repeat(track_width.saturating_sub(knob + 1)),
            Style::default().fg(palette.muted),
        ));
    }
    spans.push(Span::styled(format!(" {:>4} ▶", slider.max()), Style::default().fg(palette.muted)));

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let settings = &app.map_renderer.settings;
    let toggle = |on: bool, on_text: &'static str, off_text: &'static str| {
        Span::styled(
            if on { on_text } else { off_text },
            Style::default().fg(if on { Color::Green } else { palette.muted }),
        )
    };

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(palette.muted)),
        Span::styled(app.zoom_level(), Style::default().fg(palette.text)),
        Span::styled(" (", Style::default().fg(palette.muted)),
        Span::styled(Lod::from_zoom(app.viewport.zoom).name(), Style::default().fg(Color::Magenta)),
        Span::styled(") ", Style::default().fg(palette.muted)),
        toggle(settings.show_borders, "[B]order ", "[b]order "),
        toggle(settings.show_states, "[S]tate ", "[s]tate "),
        Span::styled(format!("[t]{} ", app.theme.name()), Style::default().fg(palette.muted)),
    ];

    let pending = app.pending_loads();
    if pending > 0 {
        spans.push(Span::styled(format!("loading {pending} "), Style::default().fg(Color::Yellow)));
    }

    spans.extend([
        Span::styled("| ", Style::default().fg(palette.muted)),
        Span::styled(app.center_coords(), Style::default().fg(palette.accent)),
        Span::styled(
            " | [/]:year 1-9:layers hjkl:pan +/-:zoom r:reset q:quit",
            Style::default().fg(palette.muted),
        ),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Blocking error dialog, centered over everything
fn render_alert(frame: &mut Frame, message: &str, area: Rect, palette: &Palette) {
    let width = (area.width * 3 / 5).max(30).min(area.width);
    let lines: Vec<Line> = message
        .lines()
        .map(|l| Line::from(l.to_string()))
        .chain([Line::from(""), Line::from(Span::styled("Enter: dismiss", Style::default().fg(palette.muted)))])
        .collect();
    let height = (lines.len() as u16 + 4).min(area.height);
    let rect = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(Span::styled(" Error ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)))
                .style(Style::default().bg(palette.background).fg(palette.text)),
        ),
        rect,
    );
}
