// File: crates/plot-core/src/config.rs
// Summary: Plot construction options (sizes, borders, backend choice, LOD and throttle timings).

use std::time::Duration;

use crate::theme::Theme;
use crate::types::{Insets, HEIGHT, WIDTH};

/// Which surface the primary canvas draws into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputBackend {
    Raster,
    /// Retained PDF document; exportable as a vector artifact.
    Vector,
    /// Raster primary plus a GPU layer for glyphs that opt in.
    Gpu,
}

#[derive(Clone, Debug)]
pub struct PlotOptions {
    pub width: i32,
    pub height: i32,
    pub min_border: Insets,
    pub hidpi: bool,
    pub device_pixel_ratio: f32,
    pub output_backend: OutputBackend,
    /// Decimation stride used while interacting with large renderers.
    pub lod_factor: usize,
    /// Minimum row count before a renderer is decimated; `None` disables LOD.
    pub lod_threshold: Option<usize>,
    /// Gap between interaction events that still counts as one interaction.
    pub lod_interval: Duration,
    /// Idle time after the last interaction before full detail returns.
    pub lod_timeout: Duration,
    /// Minimum spacing between coalesced paints.
    pub throttle: Duration,
    pub match_aspect: bool,
    pub aspect_scale: f64,
    pub outline: bool,
    pub theme: Theme,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            min_border: Insets::default(),
            hidpi: true,
            device_pixel_ratio: 1.0,
            output_backend: OutputBackend::Raster,
            lod_factor: 10,
            lod_threshold: Some(2000),
            lod_interval: Duration::from_millis(300),
            lod_timeout: Duration::from_millis(500),
            throttle: Duration::from_millis(15),
            match_aspect: false,
            aspect_scale: 1.0,
            outline: true,
            theme: Theme::default(),
        }
    }
}

impl PlotOptions {
    /// Effective pixel ratio after applying the `hidpi` switch.
    pub fn pixel_ratio(&self) -> f32 {
        if self.hidpi && self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }
}
