use climate_viz::interact::{PointerEvent, Tooltip, ZoomConfig, ZoomTransform, handle_event};
use climate_viz::ingest::{CsvText, DataSource};
use climate_viz::pipeline;
use climate_viz::view::{ViewConfig, ViewState};
use climate_viz::viz::layout::{ChartLayout, MarkShape, layout_chart};

const HUMIDITY_WIND: &str = "\
Year,Humidity (%),Wind_Speed (m/s)
2000,60,10
2000,70,14
2001,55,8
2002,80,20
";

fn mounted(config: &ViewConfig, csv: &str) -> (ChartLayout, ViewState) {
    let rows = CsvText::new("fixture", csv).fetch().unwrap();
    let state = ViewState::new(config);
    let model = pipeline::run(config, &rows, state.selection);
    (layout_chart(config, &model), state)
}

/// Surface coordinates of the centre of the first mark of `series`.
fn mark_center(layout: &ChartLayout, series: usize) -> (f64, f64) {
    let m = layout.frame.margin;
    let (x, y) = match layout.series[series].marks[0].shape {
        MarkShape::Bar(r) => (r.x + r.w / 2.0, r.y + r.h / 2.0),
        MarkShape::Dot { cx, cy, .. } => (cx, cy),
    };
    (x + m.left as f64, y + m.top as f64)
}

fn legend_center(layout: &ChartLayout, entry: usize) -> (f64, f64) {
    let m = layout.frame.margin;
    let hit = layout.legend[entry].hit;
    (hit.x + hit.w / 2.0 + m.left as f64, hit.y + hit.h / 2.0 + m.top as f64)
}

#[test]
fn wheel_zoom_clamps_to_ceiling_exactly() {
    let cfg = ZoomConfig::default();
    let (layout, _) = mounted(&ViewConfig::humidity_and_wind(), HUMIDITY_WIND);
    let viewport = layout.plot;
    let center = (viewport.w / 2.0, viewport.h / 2.0);

    let mut t = ZoomTransform::IDENTITY;
    for _ in 0..20 {
        t = t.wheeled(-500.0, center, &cfg, viewport);
    }
    assert_eq!(t.k, 5.0);

    // a huge single delta clamps the same way, and zooming out stops at 1
    let once = ZoomTransform::IDENTITY.wheeled(-1.0e6, center, &cfg, viewport);
    assert_eq!(once.k, 5.0);
    let out = once.wheeled(1.0e6, center, &cfg, viewport);
    assert_eq!(out.k, 1.0);
    assert_eq!(out, ZoomTransform::IDENTITY);
}

#[test]
fn repeated_wheel_at_ceiling_is_stable() {
    let config = ViewConfig::humidity_and_wind();
    let (layout, mut state) = mounted(&config, HUMIDITY_WIND);
    let mut tooltip = Tooltip::default();
    let (x, y) = mark_center(&layout, 0);

    let wheel = PointerEvent::Wheel { x, y, delta_y: -5000.0 };
    assert!(handle_event(&config, &layout, &mut state, &mut tooltip, wheel));
    let first = state.zoom;
    assert_eq!(first.k, 5.0);
    assert!(!handle_event(&config, &layout, &mut state, &mut tooltip, wheel));
    assert_eq!(state.zoom, first);
}

#[test]
fn legend_toggle_twice_restores_only_that_series() {
    let config = ViewConfig::humidity_and_wind();
    let (layout, mut state) = mounted(&config, HUMIDITY_WIND);
    let mut tooltip = Tooltip::default();
    assert_eq!(layout.legend.len(), 2);

    let (a, b) = (layout.legend[0].series, layout.legend[1].series);
    let (x, y) = legend_center(&layout, 0);
    let click = PointerEvent::Click { x, y };

    assert!(handle_event(&config, &layout, &mut state, &mut tooltip, click));
    assert_eq!(state.visibility.opacity(a), 0.0);
    assert_eq!(state.visibility.opacity(b), 1.0);

    assert!(handle_event(&config, &layout, &mut state, &mut tooltip, click));
    assert_eq!(state.visibility.opacity(a), 1.0);
    assert_eq!(state.visibility.opacity(b), 1.0);
}

#[test]
fn tooltip_follows_pointer_and_skips_hidden_series() {
    let config = ViewConfig::humidity_and_wind();
    let (layout, mut state) = mounted(&config, HUMIDITY_WIND);
    let mut tooltip = Tooltip::default();

    let (x, y) = mark_center(&layout, 0);
    assert!(handle_event(&config, &layout, &mut state, &mut tooltip, PointerEvent::Move { x, y }));
    assert!(tooltip.visible);
    assert_eq!(tooltip.anchor, (x + 5.0, y - 28.0));
    assert_eq!(tooltip.lines[0], "Year: 2000");
    assert_eq!(tooltip.lines[1], "Humidity: 65.00%");

    assert!(handle_event(&config, &layout, &mut state, &mut tooltip, PointerEvent::Leave));
    assert!(!tooltip.visible);

    // hide humidity; the same spot no longer produces a tooltip
    let (lx, ly) = legend_center(&layout, 0);
    handle_event(&config, &layout, &mut state, &mut tooltip, PointerEvent::Click { x: lx, y: ly });
    handle_event(&config, &layout, &mut state, &mut tooltip, PointerEvent::Move { x, y });
    assert!(!tooltip.visible);
}

#[test]
fn views_without_zoom_ignore_wheel_and_drag() {
    let config = ViewConfig::precipitation();
    let csv = "Year,Precipitation (mm)\n2000,100\n2001,200\n";
    let (layout, mut state) = mounted(&config, csv);
    let mut tooltip = Tooltip::default();

    let wheel = PointerEvent::Wheel { x: 100.0, y: 100.0, delta_y: -300.0 };
    assert!(!handle_event(&config, &layout, &mut state, &mut tooltip, wheel));
    let drag = PointerEvent::Drag { dx: 40.0, dy: 0.0 };
    assert!(!handle_event(&config, &layout, &mut state, &mut tooltip, drag));
    assert_eq!(state.zoom, ZoomTransform::IDENTITY);
}

#[test]
fn drag_pans_within_the_zoomed_extent() {
    let config = ViewConfig::humidity_and_wind();
    let (layout, mut state) = mounted(&config, HUMIDITY_WIND);
    let mut tooltip = Tooltip::default();
    let viewport = layout.plot;
    let zoom = config.interaction.zoom.unwrap();
    state.zoom = ZoomTransform::IDENTITY.scaled_to(2.0, (0.0, 0.0), &zoom, viewport);
    assert_eq!(state.zoom, ZoomTransform { k: 2.0, x: 0.0, y: 0.0 });

    let drag = PointerEvent::Drag { dx: -100.0, dy: 0.0 };
    assert!(handle_event(&config, &layout, &mut state, &mut tooltip, drag));
    assert_eq!(state.zoom.x, -100.0);

    // cannot drag past the right edge of the content
    let far = PointerEvent::Drag { dx: -1.0e5, dy: 0.0 };
    handle_event(&config, &layout, &mut state, &mut tooltip, far);
    assert!((state.zoom.x - (viewport.w - 2.0 * viewport.w)).abs() < 1e-9);
}
