use climate_viz::ingest::{CsvText, DataSource};
use climate_viz::pipeline;
use climate_viz::view::{ViewConfig, ViewState};
use climate_viz::scale::Scale;
use climate_viz::viz::layout::{MarkShape, Rect, layout_chart};
use climate_viz::viz::{self, ChartSurface};
use climate_viz::{RawRow, Tooltip};
use std::fs;

const PRECIPITATION: &str = "\
Year,Precipitation (mm)
2001,200
2000,100
2000,50
";

const FULL: &str = "\
Year,Country,Avg_Temp (°C),Min_Temp (°C),Max_Temp (°C),Precipitation (mm),Humidity (%),Wind_Speed (m/s)
2000,A,14.1,2.0,30.5,820,61,12.5
2000,B,15.3,,31.0,640,70,9.0
2001,A,14.8,3.1,32.2,900,58,14.0
2002,C,bad,1.5,29.9,15000,66,11.1
2003,B,15.9,2.8,33.4,710,72,10.2
";

const HUMIDITY_WIND: &str = "\
Year,Humidity (%),Wind_Speed (m/s)
2000,60,10
2000,70,14
2001,58,14
2002,80,25
";

fn rows(csv: &str) -> Vec<RawRow> {
    CsvText::new("fixture", csv).fetch().unwrap()
}

#[test]
fn precipitation_bars_sum_per_year_in_order() {
    let config = ViewConfig::precipitation();
    let state = ViewState::new(&config);
    let model = pipeline::run(&config, &rows(PRECIPITATION), state.selection);
    let layout = layout_chart(&config, &model);

    let bars: Vec<(i32, f64, f64)> = layout.series[0]
        .marks
        .iter()
        .map(|m| match m.shape {
            MarkShape::Bar(r) => (m.key, m.value, r.h),
            MarkShape::Dot { .. } => panic!("bar view produced a dot"),
        })
        .collect();
    assert_eq!(bars.len(), 2);
    assert_eq!((bars[0].0, bars[0].1), (2000, 150.0));
    assert_eq!((bars[1].0, bars[1].1), (2001, 200.0));
    assert!((bars[0].2 / bars[1].2 - 150.0 / 200.0).abs() < 1e-9);
    // the tallest bar reaches the top of the zero-based axis
    assert!((bars[1].2 - layout.plot.h).abs() < 1e-9);
}

#[test]
fn dual_bars_are_paired_half_width() {
    let config = ViewConfig::humidity_and_wind();
    let state = ViewState::new(&config);
    let model = pipeline::run(&config, &rows(HUMIDITY_WIND), state.selection);
    let layout = layout_chart(&config, &model);
    let bandwidth = match &model.x {
        Scale::Band(b) => b.bandwidth(),
        other => panic!("dual bars need a band axis, got {other:?}"),
    };
    let bars = |series: usize| -> Vec<(i32, f64, Rect)> {
        layout.series[series]
            .marks
            .iter()
            .map(|m| match m.shape {
                MarkShape::Bar(r) => (m.key, m.value, r),
                MarkShape::Dot { .. } => panic!("bar view produced a dot"),
            })
            .collect()
    };
    let humidity = bars(0);
    let wind = bars(1);
    assert_eq!(humidity.len(), 3);
    assert_eq!(wind.len(), 3);

    let h = layout.plot.h;
    for ((hk, hv, hr), (wk, wv, wr)) in humidity.iter().zip(&wind) {
        assert_eq!(hk, wk);
        assert!((hr.w - bandwidth / 2.0).abs() < 1e-9);
        assert!((wr.w - bandwidth / 2.0).abs() < 1e-9);
        assert!((wr.x - (hr.x + hr.w)).abs() < 1e-9);
        // each bar is scaled against its own fixed ceiling
        assert!((hr.h - h * hv / 100.0).abs() < 1e-9);
        assert!((wr.h - h * wv / 50.0).abs() < 1e-9);
    }
    assert_eq!((humidity[0].1, wind[0].1), (65.0, 12.0));
}

#[test]
fn every_builtin_view_renders_svg() {
    let data = rows(FULL);
    for config in ViewConfig::builtin() {
        let state = ViewState::new(&config);
        let model = pipeline::run(&config, &data, state.selection);
        let layout = layout_chart(&config, &model);
        let svg = viz::render_svg(&layout, &state, None).unwrap();
        assert!(svg.contains("<svg"), "{}", config.title);
        assert!(svg.contains("</svg>"), "{}", config.title);
        let (w, h) = config.frame.outer_size();
        assert!(svg.contains(&format!("width=\"{w}\"")), "{}", config.title);
        assert!(svg.contains(&format!("height=\"{h}\"")), "{}", config.title);
    }
}

#[test]
fn strict_views_drop_bad_rows_and_outliers() {
    let data = rows(FULL);

    let config = ViewConfig::temperature_overview();
    let model = pipeline::run(&config, &data, 0);
    let keys: Vec<i32> = model.points.iter().map(|p| p.key).collect();
    assert_eq!(keys, vec![2000, 2001, 2003]);

    let config = ViewConfig::precipitation();
    let model = pipeline::run(&config, &data, 0);
    let keys: Vec<i32> = model.points.iter().map(|p| p.key).collect();
    assert_eq!(keys, vec![2000, 2001, 2003]);

    // tolerant view keeps 2002 and the row with a missing minimum
    let config = ViewConfig::temperature_details();
    let model = pipeline::run(&config, &data, 1);
    let keys: Vec<i32> = model.points.iter().map(|p| p.key).collect();
    assert_eq!(keys, vec![2000, 2001, 2002, 2003]);
    assert_eq!(model.y.len(), 1);
    assert_eq!(model.y[0].series, 1);
}

#[test]
fn empty_data_renders_axes_without_marks() {
    let header_only = "Year,Humidity (%),Wind_Speed (m/s)\n";
    let config = ViewConfig::humidity_and_wind();
    let state = ViewState::new(&config);
    let model = pipeline::run(&config, &rows(header_only), state.selection);
    assert!(model.points.is_empty());

    let layout = layout_chart(&config, &model);
    assert!(layout.series.iter().all(|s| s.marks.is_empty() && s.path.is_empty()));
    assert!(layout.x_axis.ticks.is_empty());
    assert_eq!(layout.y_axes.len(), 2);
    assert!(!layout.y_axes[0].ticks.is_empty());

    let svg = viz::render_svg(&layout, &state, None).unwrap();
    assert!(svg.contains("</svg>"));
}

#[test]
fn missing_values_break_the_line() {
    let csv = "\
Year,Avg_Temp (°C),Min_Temp (°C),Max_Temp (°C)
2000,14,2,30
2001,15,,31
2002,16,3,32
2003,17,4,33
";
    let config = ViewConfig::temperature_details();
    let model = pipeline::run(&config, &rows(csv), 1);
    let layout = layout_chart(&config, &model);
    let runs: Vec<usize> = layout.series[0].path.iter().map(Vec::len).collect();
    assert_eq!(runs, vec![1, 2]);
}

#[test]
fn tooltip_text_lands_in_svg() {
    let config = ViewConfig::precipitation();
    let state = ViewState::new(&config);
    let model = pipeline::run(&config, &rows(PRECIPITATION), state.selection);
    let layout = layout_chart(&config, &model);
    let mut tooltip = Tooltip::default();
    tooltip.show((200.0, 200.0), layout.series[0].marks[0].tooltip.clone());

    let svg = viz::render_svg(&layout, &state, Some(&tooltip)).unwrap();
    assert!(svg.contains("Year: 2000"));
    assert!(svg.contains("Precipitation: 150.00 mm"));
}

#[test]
fn files_are_written_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let config = ViewConfig::precipitation();
    let state = ViewState::new(&config);
    let model = pipeline::run(&config, &rows(PRECIPITATION), state.selection);
    let layout = layout_chart(&config, &model);

    let svg = dir.path().join("rain.svg");
    viz::render_to_file(&svg, &layout, &state, None).unwrap();
    let text = fs::read_to_string(&svg).unwrap();
    assert!(text.contains("<svg"));

    let png = dir.path().join("rain.png");
    viz::render_to_file(&png, &layout, &state, None).unwrap();
    let bytes = fs::read(&png).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}

#[test]
fn surface_resizes_to_the_chart() {
    let config = ViewConfig::precipitation();
    let state = ViewState::new(&config);
    let model = pipeline::run(&config, &rows(PRECIPITATION), state.selection);
    let layout = layout_chart(&config, &model);

    let mut surface = ChartSurface::new(1, 1);
    surface.redraw(&layout, &state, None).unwrap();
    let (w, h) = config.frame.outer_size();
    assert_eq!(surface.size(), (w, h));
    assert_eq!(surface.pixels().len(), (w * h * 3) as usize);
    // a bar is painted somewhere, so not every pixel is white
    assert!(surface.pixels().iter().any(|b| *b != 255));
}
