// File: crates/plot-render-skia/src/gl.rs
// Summary: `GpuBackend` over a Skia GL DirectContext. Offscreen layers are GPU render targets.

use plot_core::GpuBackend;
use skia_safe as skia;
use skia_safe::gpu;

pub struct GlBackend {
    direct: gpu::DirectContext,
}

impl GlBackend {
    /// Load GL through the platform loader. Requires a current GL context.
    pub fn from_current_context() -> Option<Self> {
        let interface = gpu::gl::Interface::new_native()?;
        let direct = gpu::direct_contexts::make_gl(interface, None)?;
        Some(Self { direct })
    }

    pub fn from_direct_context(direct: gpu::DirectContext) -> Self {
        Self { direct }
    }
}

impl GpuBackend for GlBackend {
    fn name(&self) -> &str {
        "gl"
    }

    fn make_surface(&mut self, width: i32, height: i32) -> Option<skia::Surface> {
        if width <= 0 || height <= 0 || self.direct.abandoned() {
            return None;
        }
        let info = skia::ImageInfo::new_n32_premul((width, height), None);
        gpu::surfaces::render_target(
            &mut self.direct,
            gpu::Budgeted::Yes,
            &info,
            None,
            gpu::SurfaceOrigin::TopLeft,
            None,
            false,
            None,
        )
    }

    fn flush(&mut self, _surface: &mut skia::Surface) {
        self.direct.flush_and_submit();
    }
}
