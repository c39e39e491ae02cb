//! Terminal map of electric vehicle registrations by US state.
//!
//! Each configured layer is a GeoJSON point collection whose features carry
//! one numeric property per year. Markers are braille rings sized so their
//! area is proportional to the value for the selected year.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod map;
pub mod symbols;
pub mod ui;
