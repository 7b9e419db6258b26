// File: crates/plot-core/src/canvas.rs
// Summary: Drawing surfaces behind one paint interface: raster, vector (PDF) and a GPU layer.
// Notes:
// - Surfaces are sized logical box x pixel ratio; painters always work in
//   logical pixels (the ratio is applied as a canvas transform).
// - The GPU layer is drawn during the frame levels and blitted into the
//   primary raster surface in device pixels.
// - A missing or busy GPU degrades to raster with a single warning per canvas.

use std::io::Cursor;

use skia_safe as skia;

use crate::config::OutputBackend;
use crate::error::{PlotError, Result};
use crate::gpu::{GpuContext, GpuLease};

/// Exported frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Artifact {
    Png(Vec<u8>),
    Pdf(Vec<u8>),
}

impl Artifact {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Artifact::Png(b) | Artifact::Pdf(b) => b,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Artifact::Png(_) => "png",
            Artifact::Pdf(_) => "pdf",
        }
    }
}

enum Primary {
    Raster(skia::Surface),
    /// Last painted frame as a single-page PDF.
    Vector(Vec<u8>),
}

pub struct Canvas {
    backend: OutputBackend,
    width: i32,
    height: i32,
    pixel_ratio: f32,
    primary: Primary,
    gpu: Option<GpuContext>,
    gpu_surface: Option<skia::Surface>,
    gpu_disabled: bool,
    gpu_warned: bool,
    gpu_frames: u64,
}

fn physical(logical: i32, ratio: f32) -> i32 {
    ((logical.max(1) as f32) * ratio).ceil() as i32
}

fn make_raster(width: i32, height: i32) -> Result<skia::Surface> {
    skia::surfaces::raster_n32_premul((width, height)).ok_or(PlotError::Surface("raster"))
}

impl Canvas {
    /// `gpu` is only consulted for `OutputBackend::Gpu`.
    pub fn new(backend: OutputBackend, width: i32, height: i32, pixel_ratio: f32, gpu: Option<GpuContext>) -> Result<Self> {
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 { pixel_ratio } else { 1.0 };
        let (width, height) = (width.max(1), height.max(1));
        let primary = match backend {
            OutputBackend::Vector => Primary::Vector(Vec::new()),
            OutputBackend::Raster | OutputBackend::Gpu => {
                Primary::Raster(make_raster(physical(width, pixel_ratio), physical(height, pixel_ratio))?)
            }
        };
        Ok(Self {
            backend,
            width,
            height,
            pixel_ratio,
            primary,
            gpu: if backend == OutputBackend::Gpu { gpu } else { None },
            gpu_surface: None,
            gpu_disabled: false,
            gpu_warned: false,
            gpu_frames: 0,
        })
    }

    pub fn backend(&self) -> OutputBackend { self.backend }
    pub fn width(&self) -> i32 { self.width }
    pub fn height(&self) -> i32 { self.height }
    pub fn pixel_ratio(&self) -> f32 { self.pixel_ratio }

    /// Backing-store size in device pixels.
    pub fn physical_size(&self) -> (i32, i32) {
        (physical(self.width, self.pixel_ratio), physical(self.height, self.pixel_ratio))
    }

    /// True while painting goes through the GPU layer.
    pub fn gpu_enabled(&self) -> bool {
        self.gpu.is_some() && !self.gpu_disabled
    }

    /// Paint passes that drew into the GPU layer.
    pub fn gpu_frames(&self) -> u64 { self.gpu_frames }

    /// Resize the backing stores; a no-op when nothing changed. Zero sizes are ignored.
    pub fn resize(&mut self, width: i32, height: i32, pixel_ratio: f32) -> Result<bool> {
        if width <= 0 || height <= 0 {
            return Ok(false);
        }
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 { pixel_ratio } else { 1.0 };
        if width == self.width && height == self.height && pixel_ratio == self.pixel_ratio {
            return Ok(false);
        }
        self.width = width;
        self.height = height;
        self.pixel_ratio = pixel_ratio;
        if let Primary::Raster(surface) = &mut self.primary {
            *surface = make_raster(physical(width, pixel_ratio), physical(height, pixel_ratio))?;
        }
        self.gpu_surface = None;
        Ok(true)
    }

    fn warn_gpu_once(&mut self, reason: &str) {
        if !self.gpu_warned {
            self.gpu_warned = true;
            tracing::warn!(reason, "gpu layer unavailable, falling back to raster");
        }
    }

    fn lease_gpu(&mut self) -> Option<GpuLease> {
        if self.gpu_disabled {
            return None;
        }
        let ctx = self.gpu.clone()?;
        let lease = match ctx.acquire() {
            Ok(lease) => lease,
            Err(err) => {
                self.warn_gpu_once(&err.to_string());
                return None;
            }
        };
        if self.gpu_surface.is_none() {
            let (w, h) = self.physical_size();
            match lease.make_surface(w, h) {
                Some(surface) => self.gpu_surface = Some(surface),
                None => {
                    self.gpu_disabled = true;
                    self.warn_gpu_once("surface creation failed");
                    return None;
                }
            }
        }
        Some(lease)
    }

    /// Run one paint pass. The closure draws through `FrameLayers` in logical pixels.
    pub fn render<R>(&mut self, paint: impl FnOnce(&mut FrameLayers<'_>) -> R) -> Result<R> {
        let ratio = self.pixel_ratio;
        let (w, h) = (self.width, self.height);
        let is_raster = matches!(self.primary, Primary::Raster(_));
        let lease = if is_raster { self.lease_gpu() } else { None };

        let mut gpu_surface = match lease.as_ref() {
            Some(_) => self.gpu_surface.as_mut(),
            None => None,
        };
        if let Some(surface) = gpu_surface.as_deref_mut() {
            let c = surface.canvas();
            c.restore_to_count(1);
            c.reset_matrix();
            c.clear(skia::Color::TRANSPARENT);
            c.scale((ratio, ratio));
        }
        let used_gpu = gpu_surface.is_some();

        let out = match &mut self.primary {
            Primary::Raster(surface) => {
                let canvas = surface.canvas();
                let depth = canvas.save();
                canvas.reset_matrix();
                canvas.scale((ratio, ratio));
                let mut layers = FrameLayers { primary: canvas, gpu: gpu_surface, lease: lease.as_ref(), blits: 0 };
                let out = paint(&mut layers);
                canvas.restore_to_count(depth);
                out
            }
            Primary::Vector(bytes) => {
                let mut pdf = Vec::new();
                let out = {
                    let document = skia::pdf::new_document(&mut pdf, None);
                    let mut page = document.begin_page((w as f32, h as f32), None);
                    let out = {
                        let mut layers = FrameLayers { primary: page.canvas(), gpu: None, lease: None, blits: 0 };
                        paint(&mut layers)
                    };
                    page.end_page().close();
                    out
                };
                *bytes = pdf;
                out
            }
        };
        if used_gpu {
            self.gpu_frames += 1;
        }
        drop(lease);
        Ok(out)
    }

    /// Raw RGBA8 (unpremultiplied) pixels of the raster surface: `(width, height, bytes)`.
    pub fn rgba8(&mut self) -> Result<(u32, u32, Vec<u8>)> {
        let (w, h) = self.physical_size();
        let surface = match &mut self.primary {
            Primary::Raster(surface) => surface,
            Primary::Vector(_) => return Err(PlotError::Export("vector canvas has no pixels".into())),
        };
        let info = skia::ImageInfo::new((w, h), skia::ColorType::RGBA8888, skia::AlphaType::Unpremul, None);
        let row_bytes = w as usize * 4;
        let mut buf = vec![0u8; row_bytes * h as usize];
        if !surface.read_pixels(&info, &mut buf, row_bytes, (0, 0)) {
            return Err(PlotError::Export("pixel readback failed".into()));
        }
        Ok((w as u32, h as u32, buf))
    }

    pub fn to_png(&mut self) -> Result<Vec<u8>> {
        let (w, h, buf) = self.rgba8()?;
        let img = image::RgbaImage::from_raw(w, h, buf)
            .ok_or_else(|| PlotError::Export("pixel buffer size mismatch".into()))?;
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .map_err(|e| PlotError::Export(e.to_string()))?;
        Ok(out)
    }

    /// Static artifact of the last painted frame: PNG for raster/GPU, PDF for vector.
    pub fn export(&mut self) -> Result<Artifact> {
        match &self.primary {
            Primary::Vector(bytes) => {
                if bytes.is_empty() {
                    return Err(PlotError::Export("nothing painted yet".into()));
                }
                Ok(Artifact::Pdf(bytes.clone()))
            }
            Primary::Raster(_) => self.to_png().map(Artifact::Png),
        }
    }
}

/// Surfaces available to one paint pass.
pub struct FrameLayers<'a> {
    primary: &'a skia::Canvas,
    gpu: Option<&'a mut skia::Surface>,
    lease: Option<&'a GpuLease>,
    blits: u32,
}

impl<'a> FrameLayers<'a> {
    pub fn primary(&self) -> &skia::Canvas {
        self.primary
    }

    pub fn gpu_active(&self) -> bool {
        self.gpu.is_some()
    }

    /// Canvas a glyph should draw on: the GPU layer when it is active and the
    /// glyph asks for it, otherwise the primary surface.
    pub fn glyph_canvas(&mut self, wants_gpu: bool) -> &skia::Canvas {
        match self.gpu.as_deref_mut() {
            Some(surface) if wants_gpu => surface.canvas(),
            _ => self.primary,
        }
    }

    /// Clip both layers to `rect` (logical pixels) until `pop_clip`.
    pub fn push_clip(&mut self, rect: skia::Rect) {
        self.primary.save();
        self.primary.clip_rect(rect, None, true);
        if let Some(surface) = self.gpu.as_deref_mut() {
            let c = surface.canvas();
            c.save();
            c.clip_rect(rect, None, true);
        }
    }

    pub fn pop_clip(&mut self) {
        self.primary.restore();
        if let Some(surface) = self.gpu.as_deref_mut() {
            surface.canvas().restore();
        }
    }

    /// Composite the GPU layer into the primary surface (device pixels, no clip
    /// transform applied).
    pub fn blit_gpu(&mut self) {
        let Some(surface) = self.gpu.as_deref_mut() else { return };
        if let Some(lease) = self.lease {
            lease.flush(surface);
        }
        let image = surface.image_snapshot();
        self.primary.save();
        self.primary.reset_matrix();
        self.primary.draw_image(&image, (0.0, 0.0), None);
        self.primary.restore();
        self.blits += 1;
    }

    pub fn blit_count(&self) -> u32 {
        self.blits
    }
}
