// File: crates/plot-core/tests/plot.rs
// Purpose: End-to-end PlotView behavior: auto-ranging, navigation, tiles, GPU layer and export.

use std::time::{Duration, Instant};

use plot_core::range::{shared, ScaleHint};
use plot_core::{
    Artifact, AxisView, BBox, CartesianFrame, ColumnDataSource, DataRange1d, DataRangeConfig, Dimension, Geometry,
    GlyphRendererView, GpuContext, Insets, LayoutBox, OutputBackend, PlotError, PlotOptions, PlotView, Range1d,
    RangeRef, RendererView, ScaleKind, Scatter, SelectionMode, SoftwareBackend, SourceRef, TileKey, TileRendererView,
    TileSource,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

fn near(a: (f64, f64), b: (f64, f64)) -> bool {
    close(a.0, b.0) && close(a.1, b.1)
}

fn box_near(a: LayoutBox, b: LayoutBox) -> bool {
    near((a.left, a.top), (b.left, b.top)) && near((a.width, a.height), (b.width, b.height))
}

fn options(width: i32, height: i32) -> PlotOptions {
    PlotOptions { width, height, min_border: Insets::uniform(5), ..PlotOptions::default() }
}

fn plot_with(options: PlotOptions, x: RangeRef, y: RangeRef) -> PlotView {
    PlotView::new(options, x, y, ScaleKind::Linear, ScaleKind::Linear).expect("plot")
}

/// 110x110 canvas with a 5px border: the frame is 100x100 at (5, 5) over 0..10.
fn square_plot() -> PlotView {
    plot_with(options(110, 110), shared(Range1d::new(0.0, 10.0)), shared(Range1d::new(0.0, 10.0)))
}

fn xy(xs: Vec<f64>, ys: Vec<f64>) -> SourceRef {
    ColumnDataSource::new().with_column("x", xs).with_column("y", ys).shared()
}

fn range_of(r: &RangeRef) -> (f64, f64) {
    let r = r.borrow();
    (r.start(), r.end())
}

// ---- auto-ranging ---------------------------------------------------------------

#[test]
fn data_range_follows_source_edits() {
    let y = shared(DataRange1d::default());
    let mut pv = plot_with(options(200, 200), shared(Range1d::new(0.0, 10.0)), y.clone());
    let src = xy(vec![0.0, 1.0], vec![0.0, 10.0]);
    pv.add_renderer(GlyphRendererView::new(src.clone(), Scatter::new("x", "y")));

    pv.paint().expect("paint");
    let (s, e) = range_of(&y);
    assert!(close(s, -0.5) && close(e, 10.5), "{s} {e}");
    assert_eq!(pv.range_update_count(), 1);

    // Unchanged data: no recomputation.
    pv.paint().expect("paint");
    assert_eq!(pv.range_update_count(), 1);

    src.borrow_mut().set_column("y", vec![0.0, 20.0]);
    pv.paint().expect("paint");
    let (s, e) = range_of(&y);
    assert!(close(s, -1.0) && close(e, 21.0), "{s} {e}");
}

#[test]
fn shared_data_range_unions_plots_and_detaches_on_drop() {
    let y = shared(DataRange1d::default());
    let mut a = plot_with(options(200, 200), shared(Range1d::new(0.0, 10.0)), y.clone());
    a.add_renderer(GlyphRendererView::new(xy(vec![1.0, 2.0], vec![0.0, 10.0]), Scatter::new("x", "y")));
    a.paint().expect("paint a");
    {
        let mut b = plot_with(options(200, 200), shared(Range1d::new(0.0, 10.0)), y.clone());
        b.add_renderer(GlyphRendererView::new(xy(vec![1.0, 2.0], vec![0.0, 20.0]), Scatter::new("x", "y")));
        b.paint().expect("paint b");
        let (s, e) = range_of(&y);
        assert!(close(s, -1.0) && close(e, 21.0), "{s} {e}");
        assert_eq!(y.borrow().as_data().map(|d| d.contributors().count()), Some(2));
    }
    assert_eq!(y.borrow().as_data().map(|d| d.contributors().count()), Some(1));
    assert_eq!(y.borrow().as_data().map(|d| d.needs_update()), Some(true));

    a.paint().expect("repaint a");
    let (s, e) = range_of(&y);
    assert!(close(s, -0.5) && close(e, 10.5), "{s} {e}");
}

#[test]
fn renderers_on_other_range_names_do_not_contribute() {
    let y = shared(DataRange1d::new(DataRangeConfig { range_padding: 0.0, ..DataRangeConfig::default() }));
    let mut pv = plot_with(options(200, 200), shared(Range1d::new(0.0, 10.0)), y.clone());
    pv.frame_mut().add_y_range("right", shared(Range1d::new(0.0, 1000.0))).expect("extra");
    pv.add_renderer(GlyphRendererView::new(xy(vec![1.0], vec![3.0]), Scatter::new("x", "y")));
    pv.add_renderer(
        GlyphRendererView::new(xy(vec![1.0], vec![900.0]), Scatter::new("x", "y")).with_ranges("default", "right"),
    );
    // One value on the default range: a degenerate span around 3.
    pv.paint().expect("paint");
    assert_eq!(range_of(&y), (2.0, 4.0));
}

#[test]
fn log_axis_ignores_non_positive_data() {
    let y = shared(DataRange1d::new(DataRangeConfig { range_padding: 0.0, ..DataRangeConfig::default() }));
    let mut pv =
        PlotView::new(options(200, 200), shared(Range1d::new(0.0, 10.0)), y.clone(), ScaleKind::Linear, ScaleKind::Log)
            .expect("plot");
    assert_eq!(y.borrow().as_data().map(|d| d.config.scale_hint), Some(ScaleHint::Log));
    pv.add_renderer(GlyphRendererView::new(xy(vec![1.0, 2.0, 3.0], vec![-1.0, 1.0, 100.0]), Scatter::new("x", "y")));
    pv.paint().expect("paint");
    let (s, e) = range_of(&y);
    assert!(close(s, 1.0) && close(e, 100.0), "{s} {e}");
}

#[test]
fn match_aspect_widens_the_narrow_axis() {
    let x = shared(DataRange1d::new(DataRangeConfig { range_padding: 0.0, ..DataRangeConfig::default() }));
    let y = shared(DataRange1d::new(DataRangeConfig { range_padding: 0.0, ..DataRangeConfig::default() }));
    let opts = PlotOptions { match_aspect: true, min_border: Insets::uniform(0), ..options(200, 100) };
    let mut pv = plot_with(opts, x.clone(), y.clone());
    pv.add_renderer(GlyphRendererView::new(xy(vec![0.0, 10.0], vec![0.0, 10.0]), Scatter::new("x", "y")));
    pv.paint().expect("paint");
    // 2:1 frame: x grows to 20 units wide around its centre.
    let (x0, x1) = range_of(&x);
    assert!(close(x0, -5.0) && close(x1, 15.0), "{x0} {x1}");
    assert_eq!(range_of(&y), (0.0, 10.0));
}

#[test]
fn aspect_scale_stretches_the_y_axis() {
    let x = shared(DataRange1d::new(DataRangeConfig { range_padding: 0.0, ..DataRangeConfig::default() }));
    let y = shared(DataRange1d::new(DataRangeConfig { range_padding: 0.0, ..DataRangeConfig::default() }));
    let opts =
        PlotOptions { match_aspect: true, aspect_scale: 2.0, min_border: Insets::uniform(0), ..options(100, 100) };
    let mut pv = plot_with(opts, x.clone(), y.clone());
    pv.add_renderer(GlyphRendererView::new(xy(vec![0.0, 10.0], vec![0.0, 10.0]), Scatter::new("x", "y")));
    pv.paint().expect("paint");
    // Square frame, two y units per x unit: y grows to 20 units.
    assert_eq!(range_of(&x), (0.0, 10.0));
    let (y0, y1) = range_of(&y);
    assert!(close(y0, -5.0) && close(y1, 15.0), "{y0} {y1}");
}

#[test]
fn match_aspect_follows_resize() {
    let t0 = Instant::now();
    let x = shared(DataRange1d::new(DataRangeConfig { range_padding: 0.0, ..DataRangeConfig::default() }));
    let y = shared(DataRange1d::new(DataRangeConfig { range_padding: 0.0, ..DataRangeConfig::default() }));
    let opts = PlotOptions { match_aspect: true, min_border: Insets::uniform(0), ..options(200, 100) };
    let mut pv = plot_with(opts, x.clone(), y.clone());
    pv.add_renderer(GlyphRendererView::new(xy(vec![0.0, 10.0], vec![0.0, 10.0]), Scatter::new("x", "y")));
    pv.paint_at(t0).expect("paint");
    let (ya, yb) = range_of(&y);
    assert!(close(yb - ya, 10.0), "{ya} {yb}");

    assert!(pv.resize(100, 200, t0));
    pv.paint_at(t0 + Duration::from_millis(50)).expect("paint");
    let (ya, yb) = range_of(&y);
    assert!(close(ya, -5.0) && close(yb, 15.0), "{ya} {yb}");
    let (xa, xb) = range_of(&x);
    assert!(close(xa, 0.0) && close(xb, 10.0), "{xa} {xb}");

    // Unchanged frame: no further range work.
    let updates = pv.range_update_count();
    pv.paint_at(t0 + Duration::from_millis(100)).expect("paint");
    assert_eq!(pv.range_update_count(), updates);
}

// ---- layout -------------------------------------------------------------------

#[test]
fn axis_panel_sits_below_the_frame() {
    let mut pv = plot_with(options(300, 200), shared(Range1d::new(0.0, 10.0)), shared(Range1d::new(0.0, 10.0)));
    let axis = AxisView::new(Dimension::X).with_label("x");
    let id = pv.add_renderer(axis);
    pv.paint().expect("paint");

    let fb = pv.frame_box();
    let pb = pv.panel_box(id).expect("axis panel");
    assert!((pb.top - fb.bottom()).abs() < 1e-6);
    assert!((pb.bottom() - 195.0).abs() < 1e-6);
    assert!((fb.left - 5.0).abs() < 1e-6 && (fb.right() - 295.0).abs() < 1e-6);
    assert!(pb.height > 0.0);
}

// ---- navigation -----------------------------------------------------------------

#[test]
fn pan_zoom_and_restore() {
    let t0 = Instant::now();
    let mut pv = square_plot();
    pv.paint_at(t0).expect("paint");
    assert!(box_near(pv.frame_box(), LayoutBox::new(5.0, 5.0, 100.0, 100.0)));
    let initial = pv.range_state();

    // Dragging right by 10px reveals one unit to the left.
    assert!(pv.pan_by_pixels(10.0, 10.0, t0));
    assert!(near(pv.range_state().x["default"], (-1.0, 9.0)));
    assert!(near(pv.range_state().y["default"], (1.0, 11.0)));

    assert!(pv.restore_range_state(&initial, t0));
    assert!(pv.zoom_at_pixel(0.5, 55.0, 55.0, t0));
    assert!(near(pv.range_state().x["default"], (2.5, 7.5)));
    assert!(near(pv.range_state().y["default"], (2.5, 7.5)));

    pv.reset(t0);
    assert_eq!(pv.range_state(), initial);
    assert!(pv.scheduler().is_pending());
}

#[test]
fn zoom_anchored_at_an_edge_keeps_that_edge() {
    let t0 = Instant::now();
    let mut pv = square_plot();
    pv.paint_at(t0).expect("paint");
    assert!(pv.zoom_at_pixel(0.5, 5.0, 105.0, t0));
    assert!(near(pv.range_state().x["default"], (0.0, 5.0)));
    assert!(near(pv.range_state().y["default"], (0.0, 5.0)));
}

#[test]
fn bounded_ranges_stop_panning_at_their_limits() {
    let t0 = Instant::now();
    let x = shared(Range1d::new(0.0, 10.0).with_bounds(Some(0.0), Some(10.0)));
    let mut pv = plot_with(options(110, 110), x.clone(), shared(Range1d::new(0.0, 10.0)));
    pv.paint_at(t0).expect("paint");
    assert!(!pv.pan_by_pixels(10.0, 0.0, t0));
    assert_eq!(range_of(&x), (0.0, 10.0));

    // A long drag stops at the upper bound, keeping the span.
    x.borrow_mut().set_interactive(2.0, 8.0);
    pv.paint_at(t0).expect("paint");
    assert!(pv.pan_by_pixels(-500.0, 0.0, t0));
    assert!(near(range_of(&x), (4.0, 10.0)));
}

#[test]
fn interval_limits_reject_the_whole_zoom() {
    let t0 = Instant::now();
    let x = shared(Range1d::new(0.0, 10.0).with_intervals(Some(4.0), None));
    let y = shared(Range1d::new(0.0, 10.0));
    let mut pv = plot_with(options(110, 110), x.clone(), y.clone());
    pv.paint_at(t0).expect("paint");

    assert!(pv.zoom_at_pixel(0.5, 55.0, 55.0, t0));
    let zoomed = (range_of(&x), range_of(&y));
    assert!(near(zoomed.0, (2.5, 7.5)));
    pv.paint_at(t0).expect("paint");
    // A further 50% zoom would make x narrower than 4: nothing moves.
    assert!(!pv.zoom_at_pixel(0.5, 55.0, 55.0, t0));
    assert_eq!((range_of(&x), range_of(&y)), zoomed);
}

#[test]
fn screen_round_trip_through_the_plot() {
    let mut pv = square_plot();
    pv.paint().expect("paint");
    let (sx, sy) = pv.map_to_screen(&[0.0, 10.0], &[0.0, 10.0]).expect("map");
    assert!(near((sx[0], sx[1]), (5.0, 105.0)));
    assert!(near((sy[0], sy[1]), (105.0, 5.0)));
    let (x, y) = pv.map_from_screen(&[55.0], &[55.0]).expect("invert");
    assert!(close(x[0], 5.0) && close(y[0], 5.0));
}

// ---- selection ------------------------------------------------------------------

#[test]
fn plot_selection_requests_a_paint_and_snapshots() {
    let mut pv = square_plot();
    let src = xy(vec![2.0, 8.0], vec![2.0, 8.0]);
    pv.add_renderer(GlyphRendererView::new(src.clone(), Scatter::new("x", "y")));
    pv.paint().expect("paint");
    assert!(!pv.scheduler().is_pending());

    // (2, 2) is at (25, 85) on screen.
    assert!(pv.select(&Geometry::Point { sx: 25.0, sy: 85.0 }, SelectionMode::Replace));
    assert!(pv.scheduler().is_pending());
    let snapshot = pv.get_selection();
    let id = src.borrow().id();
    assert_eq!(snapshot[&id].indices.iter().copied().collect::<Vec<_>>(), vec![0]);

    assert!(pv.clear_selection());
    assert!(src.borrow().selected.is_empty());
    pv.update_selection(&snapshot);
    assert_eq!(src.borrow().selected, snapshot[&id]);
}

// ---- tiles ----------------------------------------------------------------------

fn tile_source() -> TileSource {
    TileSource { extent: BBox::new(0.0, 0.0, 256.0, 256.0), tile_size: 256.0, min_zoom: 0, max_zoom: 4 }
}

fn blank_tile() -> skia_safe::Image {
    let mut surface = skia_safe::surfaces::raster_n32_premul((256, 256)).expect("tile surface");
    surface.canvas().clear(skia_safe::Color::from_rgb(200, 220, 240));
    surface.image_snapshot()
}

#[test]
fn tiles_gate_has_finished_until_loaded() {
    let opts = PlotOptions { min_border: Insets::uniform(10), ..options(276, 276) };
    let mut pv = plot_with(opts, shared(Range1d::new(0.0, 256.0)), shared(Range1d::new(0.0, 256.0)));
    let tiles = TileRendererView::new(tile_source());
    let queue = tiles.queue();
    pv.add_renderer(tiles);

    pv.paint().expect("paint");
    assert!(!pv.has_finished());
    let requests = queue.borrow_mut().take_requests();
    assert_eq!(requests, vec![TileKey { x: 0, y: 0, z: 0 }]);

    // Requested tiles are not asked for twice.
    pv.paint().expect("paint");
    assert_eq!(queue.borrow().pending_requests(), 0);

    queue.borrow_mut().complete(requests[0], blank_tile());
    pv.paint().expect("paint");
    assert!(pv.has_finished());
    assert_eq!(pv.renderers()[0].painted_items(), 1);
}

#[test]
fn late_tiles_outside_the_view_are_discarded() {
    let mut frame = CartesianFrame::new(
        shared(Range1d::new(0.0, 256.0)),
        shared(Range1d::new(0.0, 256.0)),
        ScaleKind::Linear,
        ScaleKind::Linear,
    )
    .expect("frame");
    frame.set_bbox(LayoutBox::new(0.0, 0.0, 256.0, 256.0));

    let mut tiles = TileRendererView::new(tile_source());
    tiles.map_data(&frame).expect("map");
    assert_eq!(tiles.visible_tiles(), &[TileKey { x: 0, y: 0, z: 0 }]);

    let queue = tiles.queue();
    queue.borrow_mut().complete(TileKey { x: 3, y: 1, z: 2 }, blank_tile());
    queue.borrow_mut().complete(TileKey { x: 0, y: 0, z: 0 }, blank_tile());
    tiles.map_data(&frame).expect("map");
    assert_eq!(tiles.discarded(), 1);
    assert!(tiles.has_finished());
}

#[test]
fn tile_zoom_tracks_resolution() {
    let src = tile_source();
    assert_eq!(src.zoom_for(256.0, 256.0), 0);
    assert_eq!(src.zoom_for(64.0, 256.0), 2);
    assert_eq!(src.zoom_for(1e-9, 256.0), 4);
    assert_eq!(src.tile_bounds(TileKey { x: 1, y: 0, z: 1 }), BBox::new(128.0, 128.0, 256.0, 256.0));
    assert_eq!(src.tiles_for(&BBox::new(0.0, 0.0, 100.0, 100.0), 1), vec![TileKey { x: 0, y: 1, z: 1 }]);
}

// ---- GPU layer ------------------------------------------------------------------

fn gpu_plot(ctx: &GpuContext) -> (PlotView, SourceRef) {
    let opts = PlotOptions { output_backend: OutputBackend::Gpu, ..options(120, 80) };
    let mut pv = PlotView::with_gpu(
        opts,
        shared(Range1d::new(0.0, 10.0)),
        shared(Range1d::new(0.0, 10.0)),
        ScaleKind::Linear,
        ScaleKind::Linear,
        Some(ctx.clone()),
    )
    .expect("gpu plot");
    let src = xy(vec![1.0, 5.0, 9.0], vec![1.0, 5.0, 9.0]);
    pv.add_renderer(GlyphRendererView::new(src.clone(), Scatter::new("x", "y")).with_gpu(true));
    (pv, src)
}

#[test]
fn gpu_layer_is_drawn_and_released() {
    let ctx = GpuContext::new(SoftwareBackend::new());
    let (mut pv, _) = gpu_plot(&ctx);
    assert!(pv.canvas().gpu_enabled());
    pv.paint().expect("paint");
    pv.paint().expect("paint");
    assert_eq!(pv.canvas().gpu_frames(), 2);
    assert_eq!(ctx.lease_count(), 2);
    assert!(!ctx.is_leased());
    assert_eq!(ctx.name(), "software");

    let png = pv.to_png().expect("png");
    let img = image::load_from_memory(&png).expect("decode");
    assert_eq!((img.width(), img.height()), (120, 80));
}

#[test]
fn held_gpu_lease_falls_back_to_raster() {
    let ctx = GpuContext::new(SoftwareBackend::new());
    let (mut pv, _) = gpu_plot(&ctx);
    let lease = ctx.acquire().expect("lease");
    assert!(matches!(ctx.acquire(), Err(PlotError::GpuBusy)));

    pv.paint().expect("paint still succeeds");
    assert_eq!(pv.canvas().gpu_frames(), 0);
    drop(lease);

    pv.paint().expect("paint");
    assert_eq!(pv.canvas().gpu_frames(), 1);
}

#[test]
fn installed_context_is_shared_by_new_plots() {
    let ctx = GpuContext::new(SoftwareBackend::new());
    plot_core::gpu::install(ctx.clone());
    let opts = PlotOptions { output_backend: OutputBackend::Gpu, ..options(50, 50) };
    let mut a = plot_with(opts.clone(), shared(Range1d::new(0.0, 1.0)), shared(Range1d::new(0.0, 1.0)));
    let mut b = plot_with(opts, shared(Range1d::new(0.0, 1.0)), shared(Range1d::new(0.0, 1.0)));
    a.paint().expect("a");
    b.paint().expect("b");
    assert_eq!(ctx.lease_count(), 2);
    let previous = plot_core::gpu::uninstall().expect("installed");
    assert!(previous.same_as(&ctx));

    // Raster plots ignore the GPU context.
    let mut raster = square_plot();
    raster.paint().expect("raster");
    assert!(!raster.canvas().gpu_enabled());
}

// ---- export ---------------------------------------------------------------------

#[test]
fn hidpi_png_has_physical_dimensions() {
    let opts = PlotOptions { device_pixel_ratio: 2.0, ..options(200, 100) };
    let mut pv = plot_with(opts, shared(Range1d::new(0.0, 1.0)), shared(Range1d::new(0.0, 1.0)));
    let png = pv.to_png().expect("png");
    let img = image::load_from_memory(&png).expect("decode");
    assert_eq!((img.width(), img.height()), (400, 200));

    let opts = PlotOptions { device_pixel_ratio: 2.0, hidpi: false, ..options(200, 100) };
    let mut pv = plot_with(opts, shared(Range1d::new(0.0, 1.0)), shared(Range1d::new(0.0, 1.0)));
    let png = pv.to_png().expect("png");
    let img = image::load_from_memory(&png).expect("decode");
    assert_eq!((img.width(), img.height()), (200, 100));
}

#[test]
fn device_pixel_ratio_change_resizes_the_surface() {
    let t0 = Instant::now();
    let mut pv = square_plot();
    pv.paint_at(t0).expect("paint");
    assert_eq!(pv.canvas().physical_size(), (110, 110));
    pv.set_device_pixel_ratio(1.5, t0 + Duration::from_millis(1));
    assert!(pv.scheduler().is_pending());
    pv.paint_at(t0 + Duration::from_millis(20)).expect("paint");
    assert_eq!(pv.canvas().physical_size(), (165, 165));
    // Layout stays in logical pixels.
    assert!(box_near(pv.frame_box(), LayoutBox::new(5.0, 5.0, 100.0, 100.0)));
}

#[test]
fn vector_backend_exports_pdf() {
    let opts = PlotOptions { output_backend: OutputBackend::Vector, ..options(200, 150) };
    let mut pv = plot_with(opts, shared(Range1d::new(0.0, 10.0)), shared(Range1d::new(0.0, 10.0)));
    pv.add_renderer(GlyphRendererView::new(xy(vec![1.0, 2.0], vec![3.0, 4.0]), Scatter::new("x", "y")));
    pv.add_renderer(AxisView::new(Dimension::X));

    let artifact = pv.export().expect("export");
    assert_eq!(artifact.extension(), "pdf");
    assert!(matches!(&artifact, Artifact::Pdf(b) if b.starts_with(b"%PDF")));
    assert!(matches!(pv.to_png(), Err(PlotError::Export(_))));
}

#[test]
fn raster_export_is_png() {
    let mut pv = square_plot();
    let artifact = pv.export().expect("export");
    assert_eq!(artifact.extension(), "png");
    assert!(artifact.bytes().starts_with(&[0x89, b'P', b'N', b'G']));
    assert_eq!(pv.paint_count(), 1);
}
