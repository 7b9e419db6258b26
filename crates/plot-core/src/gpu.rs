// File: crates/plot-core/src/gpu.rs
// Summary: Process-wide GPU resource handle with exclusive, RAII-scoped leases.
// Notes:
// - Plots on one thread share a single context; a paint pass holds the lease
//   from its GPU draw calls until the layer is blitted.
// - The handle is injected (or installed once per thread) so tests can swap in
//   a raster-backed implementation.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use skia_safe as skia;

use crate::error::{PlotError, Result};

/// Something that can hand out GPU-backed Skia surfaces.
pub trait GpuBackend {
    fn name(&self) -> &str;

    /// Create an offscreen surface in physical pixels; `None` when the device
    /// cannot provide one (lost context, oversized request).
    fn make_surface(&mut self, width: i32, height: i32) -> Option<skia::Surface>;

    /// Submit pending work for `surface`.
    fn flush(&mut self, _surface: &mut skia::Surface) {}
}

/// CPU stand-in for a GPU device. Used when no native context exists and in tests.
#[derive(Debug, Default)]
pub struct SoftwareBackend {
    surfaces_made: usize,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surfaces_made(&self) -> usize {
        self.surfaces_made
    }
}

impl GpuBackend for SoftwareBackend {
    fn name(&self) -> &str {
        "software"
    }

    fn make_surface(&mut self, width: i32, height: i32) -> Option<skia::Surface> {
        if width <= 0 || height <= 0 {
            return None;
        }
        self.surfaces_made += 1;
        skia::surfaces::raster_n32_premul((width, height))
    }
}

struct Shared {
    backend: RefCell<Box<dyn GpuBackend>>,
    leased: Cell<bool>,
    leases: Cell<u64>,
}

/// Cloneable handle to the shared GPU backend.
#[derive(Clone)]
pub struct GpuContext {
    shared: Rc<Shared>,
}

impl fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuContext")
            .field("leased", &self.shared.leased.get())
            .field("leases", &self.shared.leases.get())
            .finish()
    }
}

impl GpuContext {
    pub fn new(backend: impl GpuBackend + 'static) -> Self {
        Self {
            shared: Rc::new(Shared {
                backend: RefCell::new(Box::new(backend)),
                leased: Cell::new(false),
                leases: Cell::new(0),
            }),
        }
    }

    pub fn name(&self) -> String {
        self.shared.backend.borrow().name().to_string()
    }

    pub fn is_leased(&self) -> bool {
        self.shared.leased.get()
    }

    /// Total leases granted so far.
    pub fn lease_count(&self) -> u64 {
        self.shared.leases.get()
    }

    pub fn same_as(&self, other: &GpuContext) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// Claim the context exclusively until the lease is dropped.
    pub fn acquire(&self) -> Result<GpuLease> {
        if self.shared.leased.get() {
            return Err(PlotError::GpuBusy);
        }
        self.shared.leased.set(true);
        self.shared.leases.set(self.shared.leases.get() + 1);
        Ok(GpuLease { shared: self.shared.clone() })
    }
}

/// Exclusive claim on the GPU context; released on drop.
pub struct GpuLease {
    shared: Rc<Shared>,
}

impl GpuLease {
    pub fn make_surface(&self, width: i32, height: i32) -> Option<skia::Surface> {
        self.shared.backend.borrow_mut().make_surface(width, height)
    }

    pub fn flush(&self, surface: &mut skia::Surface) {
        self.shared.backend.borrow_mut().flush(surface);
    }
}

impl Drop for GpuLease {
    fn drop(&mut self) {
        self.shared.leased.set(false);
    }
}

thread_local! {
    static INSTALLED: RefCell<Option<GpuContext>> = const { RefCell::new(None) };
}

/// Install the context every subsequently created GPU plot on this thread uses.
/// Returns the previously installed one.
pub fn install(ctx: GpuContext) -> Option<GpuContext> {
    INSTALLED.with(|slot| slot.borrow_mut().replace(ctx))
}

pub fn uninstall() -> Option<GpuContext> {
    INSTALLED.with(|slot| slot.borrow_mut().take())
}

pub fn installed() -> Option<GpuContext> {
    INSTALLED.with(|slot| slot.borrow().clone())
}
