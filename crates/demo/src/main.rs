// File: crates/demo/src/main.rs
// Summary: Demo loads an x,y CSV (or synthesises points), plots them with auto-ranged axes,
// a title and a color bar, box-selects the middle of the frame and writes PNG + PDF.
// Usage: plot-demo [path.csv] [--gpu]   (RUST_LOG=debug for pass-by-pass logging)

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use plot_core::range::shared;
use plot_core::{
    AxisView, ColorBarView, DataRange1d, Dimension, Geometry, GlyphRendererView, OutputBackend, PlotOptions, PlotView,
    ScaleKind, Scatter, SelectionMode, Side, TitleView,
};
use skia_safe as skia;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let use_gpu = args.iter().any(|a| a == "--gpu");
    let input = args.iter().find(|a| !a.starts_with("--"));

    let (xs, ys, stem) = match input {
        Some(raw) => {
            let path = resolve_path(raw)?;
            let (xs, ys) = load_xy_csv(&path).with_context(|| format!("failed to load CSV '{}'", path.display()))?;
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("plot").to_string();
            (xs, ys, stem)
        }
        None => {
            let (xs, ys) = synthetic(2_000);
            (xs, ys, "synthetic".to_string())
        }
    };
    if xs.is_empty() {
        anyhow::bail!("no points loaded; check headers/delimiter");
    }
    tracing::info!(points = xs.len(), "data loaded");

    let (lo, hi) = minmax(&ys);
    let palette = viridis();
    let source = plot_core::ColumnDataSource::new().with_column("x", xs).with_column("y", ys).shared();

    if use_gpu {
        let backend = plot_render_skia::install_best_gpu_context();
        tracing::info!(%backend, "gpu layer enabled");
    }
    let options = PlotOptions {
        width: 800,
        height: 500,
        output_backend: if use_gpu { OutputBackend::Gpu } else { OutputBackend::Raster },
        ..PlotOptions::default()
    };
    let mut plot = build_plot(options, &source, &palette, lo, hi)?;

    let now = Instant::now();
    plot.paint_at(now)?;
    let fb = plot.frame_box();
    tracing::info!(?fb, layouts = plot.layout_count(), "first paint");

    // Box-select the middle third of the frame.
    let (w3, h3) = (fb.width / 3.0, fb.height / 3.0);
    let rect = Geometry::rect(fb.left + w3, fb.top + h3, fb.right() - w3, fb.bottom() - h3);
    if plot.select(&rect, SelectionMode::Replace) {
        let count = source.borrow().selected.indices.len();
        tracing::info!(count, "points selected");
    }

    let png_path = out_name_with(&stem, "png");
    std::fs::write(&png_path, plot.to_png()?).with_context(|| format!("writing {}", png_path.display()))?;
    println!("Wrote {}", png_path.display());

    // Same scene on the vector backend, selection carried over through the shared source.
    let vector = PlotOptions { width: 800, height: 500, output_backend: OutputBackend::Vector, ..PlotOptions::default() };
    let mut pdf_plot = build_plot(vector, &source, &palette, lo, hi)?;
    let artifact = pdf_plot.export()?;
    let pdf_path = out_name_with(&stem, artifact.extension());
    std::fs::write(&pdf_path, artifact.bytes()).with_context(|| format!("writing {}", pdf_path.display()))?;
    println!("Wrote {}", pdf_path.display());

    Ok(())
}

fn build_plot(
    options: PlotOptions,
    source: &plot_core::SourceRef,
    palette: &[skia::Color],
    lo: f64,
    hi: f64,
) -> Result<PlotView> {
    let mut plot = PlotView::new(
        options,
        shared(DataRange1d::default()),
        shared(DataRange1d::default()),
        ScaleKind::Linear,
        ScaleKind::Linear,
    )?;
    plot.pause();
    plot.add_renderer(GlyphRendererView::new(source.clone(), Scatter::new("x", "y").with_radius(3.0)).with_gpu(true));
    plot.add_renderer(AxisView::new(Dimension::X).with_label("x"));
    plot.add_renderer(AxisView::new(Dimension::Y).with_label("y"));
    plot.add_renderer(TitleView::new("plot-core demo").on_side(Side::Above));
    plot.add_renderer(ColorBarView::new(lo, hi, palette.to_vec()));
    plot.unpause(Instant::now());
    Ok(plot)
}

/// Noisy spiral, deterministic.
fn synthetic(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    let mut seed = 0x2545_f491_4f6c_dd1d_u64;
    for i in 0..n {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let jitter = (seed % 1000) as f64 / 1000.0 - 0.5;
        let t = i as f64 * 0.01;
        xs.push(t.cos() * t + jitter);
        ys.push(t.sin() * t + jitter);
    }
    (xs, ys)
}

fn resolve_path(raw: &str) -> Result<PathBuf> {
    let p = Path::new(raw);
    if p.exists() {
        return Ok(p.to_path_buf());
    }
    anyhow::bail!("file not found: {}", p.display());
}

/// Output file like target/out/plot_<stem>.<ext>
fn out_name_with(stem: &str, ext: &str) -> PathBuf {
    let mut out = PathBuf::from("target/out");
    std::fs::create_dir_all(&out).ok();
    out.push(format!("plot_{stem}.{ext}"));
    out
}

/// Load the first two numeric columns, preferring headers named x/y.
fn load_xy_csv(path: &Path) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers = rdr.headers()?.iter().map(|h| h.trim().to_lowercase()).collect::<Vec<_>>();
    tracing::debug!(?headers, "csv headers");
    let idx = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));
    let i_x = idx(&["x", "time", "t", "index"]).unwrap_or(0);
    let i_y = idx(&["y", "value", "close", "v"]).unwrap_or(1);

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut skipped = 0usize;
    for rec in rdr.records() {
        let rec = rec?;
        let parse = |i: usize| rec.get(i).and_then(|s| s.trim().parse::<f64>().ok());
        match (parse(i_x), parse(i_y)) {
            (Some(x), Some(y)) => {
                xs.push(x);
                ys.push(y);
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "rows without numeric x/y were skipped");
    }
    Ok((xs, ys))
}

/// Five-stop viridis ramp for the color bar.
fn viridis() -> Vec<skia::Color> {
    [(68, 1, 84), (59, 82, 139), (33, 145, 140), (94, 201, 98), (253, 231, 37)]
        .into_iter()
        .map(|(r, g, b)| skia::Color::from_rgb(r, g, b))
        .collect()
}

fn minmax(v: &[f64]) -> (f64, f64) {
    v.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &y| (lo.min(y), hi.max(y)))
}
