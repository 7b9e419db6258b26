// File: crates/plot-core/src/types.rs
// Summary: Shared types and constants (sizes, borders, dimensions, render levels, ids).

use std::sync::atomic::{AtomicU64, Ordering};

/// Default logical canvas width in pixels.
pub const WIDTH: i32 = 600;
/// Default logical canvas height in pixels.
pub const HEIGHT: i32 = 600;

/// Minimum borders around the outermost side panels, in pixels.
/// Contract: all fields are non-negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Insets {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Insets {
    /// Create new insets (non-negative by type).
    pub const fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self { left, right, top, bottom }
    }
    pub const fn uniform(v: u32) -> Self {
        Self::new(v, v, v, v)
    }
    /// Total horizontal inset (left + right).
    pub const fn hsum(&self) -> u32 { self.left + self.right }
    /// Total vertical inset (top + bottom).
    pub const fn vsum(&self) -> u32 { self.top + self.bottom }
}

impl Default for Insets {
    fn default() -> Self {
        Self::uniform(5)
    }
}

/// Axis a range or bound refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    X,
    Y,
}

/// Compositing bucket; painting walks the levels in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLevel {
    Image,
    Underlay,
    Glyph,
    Annotation,
    Overlay,
}

impl RenderLevel {
    pub const ALL: [RenderLevel; 5] = [
        RenderLevel::Image,
        RenderLevel::Underlay,
        RenderLevel::Glyph,
        RenderLevel::Annotation,
        RenderLevel::Overlay,
    ];

    /// Levels painted inside the frame clip, before the GPU layer is blitted.
    pub const FRAME: [RenderLevel; 3] = [RenderLevel::Image, RenderLevel::Underlay, RenderLevel::Glyph];
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

macro_rules! id_type {
    ($(#[$m:meta])* $name:ident) => {
        $(#[$m])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            pub fn fresh() -> Self {
                Self(next_id())
            }
        }
    };
}

id_type!(
    /// Identity of a plot; keys its contribution to shared auto-ranges.
    PlotId
);
id_type!(
    /// Identity of a renderer view within (and across) plots.
    RendererId
);
id_type!(
    /// Identity of a column data source; keys selection snapshots.
    SourceId
);
