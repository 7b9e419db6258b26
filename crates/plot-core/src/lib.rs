// File: crates/plot-core/src/lib.rs
// Summary: Core library entry point; exports the public API for building, painting and querying plots.

pub mod canvas;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod glyph;
pub mod gpu;
pub mod graph;
pub mod guide;
pub mod hittest;
pub mod layout;
pub mod plot;
pub mod range;
pub mod renderer;
pub mod scale;
pub mod scheduler;
pub mod selection;
pub mod selection_manager;
pub mod solver;
pub mod source;
pub mod theme;
pub mod tile;
pub mod types;
pub mod view;

pub use canvas::{Artifact, Canvas};
pub use config::{OutputBackend, PlotOptions};
pub use error::{PlotError, Result};
pub use frame::{CartesianFrame, DEFAULT};
pub use geometry::{BBox, LayoutBox};
pub use glyph::{Glyph, Scatter, Segment};
pub use gpu::{GpuBackend, GpuContext, SoftwareBackend};
pub use graph::{GraphPolicy, GraphRendererView};
pub use guide::{AxisView, ColorBarView, TitleView};
pub use hittest::Geometry;
pub use layout::{PlotLayout, Side};
pub use plot::{PlotView, SelectionSnapshot};
pub use range::{Bounds, DataRange1d, DataRangeConfig, FactorRange, Follow, PaddingUnits, Range, Range1d, RangeRef};
pub use renderer::{GlyphRendererView, RendererView};
pub use scale::{Interval, Scale, ScaleKind};
pub use scheduler::{RenderScheduler, SchedulerState};
pub use selection::{Selection, SelectionMode};
pub use source::{CdsView, ColumnData, ColumnDataSource, SourceRef};
pub use theme::Theme;
pub use tile::{TileKey, TileRendererView, TileSource};
pub use types::{Dimension, Insets, RenderLevel};
pub use view::RangeState;
