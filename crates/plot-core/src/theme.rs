// File: crates/plot-core/src/theme.rs
// Summary: Light/Dark plot visuals (fills, outline, guides, glyph and selection colors).

use skia_safe as skia;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    /// Canvas area outside the frame.
    pub border_fill: skia::Color,
    /// Frame interior.
    pub background_fill: skia::Color,
    pub outline: skia::Color,
    pub axis_line: skia::Color,
    pub axis_label: skia::Color,
    pub tick: skia::Color,
    pub glyph_fill: skia::Color,
    pub glyph_line: skia::Color,
    pub selection: skia::Color,
    /// Alpha applied to unselected glyphs while a selection exists.
    pub nonselection_alpha: u8,
    pub hover: skia::Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark",
            border_fill: skia::Color::from_argb(255, 18, 18, 20),
            background_fill: skia::Color::from_argb(255, 28, 28, 32),
            outline: skia::Color::from_argb(255, 70, 70, 80),
            axis_line: skia::Color::from_argb(255, 180, 180, 190),
            axis_label: skia::Color::from_argb(255, 235, 235, 245),
            tick: skia::Color::from_argb(255, 150, 150, 160),
            glyph_fill: skia::Color::from_argb(255, 64, 160, 255),
            glyph_line: skia::Color::from_argb(255, 96, 156, 255),
            selection: skia::Color::from_argb(255, 255, 230, 70),
            nonselection_alpha: 60,
            hover: skia::Color::from_argb(255, 40, 200, 120),
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light",
            border_fill: skia::Color::from_argb(255, 255, 255, 255),
            background_fill: skia::Color::from_argb(255, 250, 250, 252),
            outline: skia::Color::from_argb(255, 230, 230, 235),
            axis_line: skia::Color::from_argb(255, 60, 60, 70),
            axis_label: skia::Color::from_argb(255, 20, 20, 30),
            tick: skia::Color::from_argb(255, 100, 100, 110),
            glyph_fill: skia::Color::from_argb(255, 32, 120, 200),
            glyph_line: skia::Color::from_argb(255, 40, 120, 200),
            selection: skia::Color::from_argb(255, 200, 60, 60),
            nonselection_alpha: 50,
            hover: skia::Color::from_argb(255, 20, 160, 90),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

pub fn presets() -> Vec<Theme> {
    vec![Theme::light(), Theme::dark()]
}

/// Look up a preset by name; unknown names fall back to light.
pub fn find(name: &str) -> Theme {
    presets()
        .into_iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
        .unwrap_or_else(Theme::light)
}
