// File: crates/plot-render-skia/src/lib.rs
// Summary: Native GPU contexts for plot-core. Wraps a Skia GL DirectContext as a `GpuBackend`
// when built with `gpu-gl`, and falls back to the software backend otherwise.

use plot_core::{GpuContext, SoftwareBackend};

#[cfg(feature = "gpu-gl")]
mod gl;

#[cfg(feature = "gpu-gl")]
pub use gl::GlBackend;

/// GPU context backed by the GL context current on this thread, if any.
pub fn native_gpu_context() -> Option<GpuContext> {
    #[cfg(feature = "gpu-gl")]
    {
        match GlBackend::from_current_context() {
            Some(backend) => return Some(GpuContext::new(backend)),
            None => tracing::warn!("no usable GL context is current"),
        }
    }
    #[cfg(not(feature = "gpu-gl"))]
    {
        tracing::debug!("built without gpu-gl; no native GPU context");
    }
    None
}

/// Native context when available, else the CPU stand-in.
pub fn gpu_context_or_software() -> GpuContext {
    native_gpu_context().unwrap_or_else(|| GpuContext::new(SoftwareBackend::new()))
}

/// Install the best available context for every GPU plot created on this
/// thread afterwards. Returns the backend name.
pub fn install_best_gpu_context() -> String {
    let ctx = gpu_context_or_software();
    let name = ctx.name();
    plot_core::gpu::install(ctx);
    tracing::info!(backend = %name, "gpu context installed");
    name
}
