// File: crates/plot-core/src/tile.rs
// Summary: XYZ tile renderer: picks a zoom level for the frame, queues tile requests for the
// host and paints completed tiles. Late completions outside the viewport are dropped.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use skia_safe as skia;

use crate::error::Result;
use crate::frame::{CartesianFrame, DEFAULT};
use crate::geometry::BBox;
use crate::renderer::{PaintContext, RendererView};
use crate::types::{RenderLevel, RendererId};

/// Web Mercator half-extent in metres.
pub const MERCATOR_EXTENT: f64 = 20_037_508.342_789_244;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

/// Mailbox between the renderer and the host fetching tiles.
#[derive(Default)]
pub struct TileQueue {
    requests: Vec<TileKey>,
    completions: Vec<(TileKey, skia::Image)>,
}

pub type TileQueueRef = Rc<RefCell<TileQueue>>;

impl TileQueue {
    /// Drain the tiles the renderer wants fetched.
    pub fn take_requests(&mut self) -> Vec<TileKey> {
        std::mem::take(&mut self.requests)
    }

    pub fn complete(&mut self, key: TileKey, image: skia::Image) {
        self.completions.push((key, image));
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }
}

/// Tiling scheme: world extent in data units, tile pixel size and zoom limits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSource {
    pub extent: BBox,
    pub tile_size: f64,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for TileSource {
    fn default() -> Self {
        Self {
            extent: BBox::new(-MERCATOR_EXTENT, -MERCATOR_EXTENT, MERCATOR_EXTENT, MERCATOR_EXTENT),
            tile_size: 256.0,
            min_zoom: 0,
            max_zoom: 30,
        }
    }
}

impl TileSource {
    /// Zoom whose tiles are closest to one screen pixel per tile pixel.
    pub fn zoom_for(&self, data_width: f64, pixel_width: f64) -> u8 {
        if !(data_width > 0.0 && pixel_width > 0.0) {
            return self.min_zoom;
        }
        let resolution = data_width / pixel_width;
        let z = (self.extent.width() / (self.tile_size * resolution)).log2().round();
        z.clamp(self.min_zoom as f64, self.max_zoom as f64) as u8
    }

    /// Data-space box of a tile; `y = 0` is the top row.
    pub fn tile_bounds(&self, key: TileKey) -> BBox {
        let n = (1u64 << key.z) as f64;
        let tw = self.extent.width() / n;
        let th = self.extent.height() / n;
        let x0 = self.extent.x0 + key.x as f64 * tw;
        let y1 = self.extent.y1 - key.y as f64 * th;
        BBox::new(x0, y1 - th, x0 + tw, y1)
    }

    /// Tiles covering the data box at zoom `z`.
    pub fn tiles_for(&self, view: &BBox, z: u8) -> Vec<TileKey> {
        let n = 1u64 << z;
        let tw = self.extent.width() / n as f64;
        let th = self.extent.height() / n as f64;
        let clamp = |v: f64| v.floor().clamp(0.0, (n - 1) as f64) as u32;
        let (ix0, ix1) = (clamp((view.x0 - self.extent.x0) / tw), clamp((view.x1 - self.extent.x0) / tw));
        let (iy0, iy1) = (clamp((self.extent.y1 - view.y1) / th), clamp((self.extent.y1 - view.y0) / th));
        let mut out = Vec::new();
        for y in iy0..=iy1 {
            for x in ix0..=ix1 {
                out.push(TileKey { x, y, z });
            }
        }
        out
    }
}

pub struct TileRendererView {
    id: RendererId,
    source: TileSource,
    queue: TileQueueRef,
    cache: HashMap<TileKey, skia::Image>,
    requested: BTreeSet<TileKey>,
    visible: Vec<TileKey>,
    discarded: usize,
    pub alpha: u8,
}

impl TileRendererView {
    pub fn new(source: TileSource) -> Self {
        Self {
            id: RendererId::fresh(),
            source,
            queue: Rc::new(RefCell::new(TileQueue::default())),
            cache: HashMap::new(),
            requested: BTreeSet::new(),
            visible: Vec::new(),
            discarded: 0,
            alpha: 255,
        }
    }

    /// Handle the host uses to fetch and complete tiles.
    pub fn queue(&self) -> TileQueueRef {
        self.queue.clone()
    }

    pub fn visible_tiles(&self) -> &[TileKey] {
        &self.visible
    }

    /// Completions dropped because the viewport had moved on.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    fn accept_completions(&mut self) {
        let done = std::mem::take(&mut self.queue.borrow_mut().completions);
        for (key, image) in done {
            self.requested.remove(&key);
            if self.visible.contains(&key) {
                self.cache.insert(key, image);
            } else {
                self.discarded += 1;
                tracing::debug!(?key, "discarding stale tile");
            }
        }
    }
}

impl RendererView for TileRendererView {
    fn id(&self) -> RendererId { self.id }
    fn level(&self) -> RenderLevel { RenderLevel::Image }

    fn map_data(&mut self, frame: &CartesianFrame) -> Result<()> {
        let (xr, yr) = (frame.x_range(DEFAULT)?, frame.y_range(DEFAULT)?);
        let (x0, x1) = { let r = xr.borrow(); (r.min(), r.max()) };
        let (y0, y1) = { let r = yr.borrow(); (r.min(), r.max()) };
        let view = BBox::new(x0, y0, x1, y1);
        if view.is_empty() || !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) {
            self.visible.clear();
            return Ok(());
        }
        let z = self.source.zoom_for(view.width(), frame.bbox().width);
        self.visible = self.source.tiles_for(&view, z);
        self.cache.retain(|k, _| k.z == z);
        self.accept_completions();

        let mut queue = self.queue.borrow_mut();
        for key in &self.visible {
            if !self.cache.contains_key(key) && self.requested.insert(*key) {
                queue.requests.push(*key);
            }
        }
        Ok(())
    }

    fn paint(&mut self, ctx: &mut PaintContext<'_, '_>) -> Result<()> {
        self.accept_completions();
        let xs = ctx.frame.x_scale(DEFAULT)?;
        let ys = ctx.frame.y_scale(DEFAULT)?;
        let mut paint = skia::Paint::default();
        paint.set_alpha(self.alpha);
        let canvas = ctx.canvas();
        for key in &self.visible {
            let Some(image) = self.cache.get(key) else { continue };
            let b = self.source.tile_bounds(*key);
            let (sx0, sx1) = xs.r_compute(b.x0, b.x1);
            let (sy0, sy1) = ys.r_compute(b.y0, b.y1);
            let dst = skia::Rect::from_ltrb(sx0 as f32, sy0 as f32, sx1 as f32, sy1 as f32);
            canvas.draw_image_rect(image, None, dst, &paint);
        }
        Ok(())
    }

    fn has_finished(&self) -> bool {
        self.visible.iter().all(|k| self.cache.contains_key(k))
    }

    fn painted_items(&self) -> usize {
        self.visible.iter().filter(|k| self.cache.contains_key(k)).count()
    }
}
