use climate_viz::error::LoadError;
use climate_viz::ingest::{CsvFile, CsvText, DataSource, read_rows};
use climate_viz::{LoadStatus, PointerEvent, RawRow, ViewController, ViewHost};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const CSV: &str = "\
Year,Avg_Temp (°C),Min_Temp (°C),Max_Temp (°C),Precipitation (mm),Humidity (%),Wind_Speed (m/s)
2000,14.0,2.0,30.0,800,60,10
2001,15.0,3.0,31.0,900,65,12
";

const LATE_CSV: &str = "\
Year,Avg_Temp (°C),Min_Temp (°C),Max_Temp (°C),Precipitation (mm),Humidity (%),Wind_Speed (m/s)
1990,11.0,1.0,20.0,100,50,5
";

/// Answers late with `LATE_CSV`.
struct Slow;

impl DataSource for Slow {
    fn describe(&self) -> String {
        "slow".into()
    }

    fn fetch(&self) -> Result<Vec<RawRow>, LoadError> {
        thread::sleep(Duration::from_millis(300));
        read_rows(LATE_CSV.as_bytes())
    }
}

fn host(source: Arc<dyn DataSource>) -> ViewHost {
    ViewHost::new(source, ViewController::climate())
}

#[test]
fn mount_loads_and_renders() {
    let mut h = host(Arc::new(CsvText::new("fixture", CSV)));
    h.mount();
    assert!(h.wait(Duration::from_secs(5)));

    let view = h.view().unwrap();
    assert_eq!(view.status(), &LoadStatus::Ready);
    assert_eq!(view.state().data.len(), 2);
    let svg = view.render_svg().unwrap().unwrap();
    assert!(svg.contains("</svg>"));
}

#[test]
fn stale_completion_is_discarded() {
    let mut h = host(Arc::new(Slow));
    h.mount();
    assert!(h.is_loading());
    // swap the source before the first load finishes; this remounts
    h.set_source(Arc::new(CsvText::new("fixture", CSV)));
    assert!(h.wait(Duration::from_secs(5)));
    let generation = h.view().unwrap().generation();
    assert_eq!(generation, 2);

    thread::sleep(Duration::from_millis(600));
    assert!(!h.poll());

    let view = h.view().unwrap();
    assert_eq!(view.generation(), generation);
    assert_eq!(view.status(), &LoadStatus::Ready);
    let keys: Vec<i32> = view.state().data.iter().map(|p| p.key).collect();
    assert_eq!(keys, vec![2000, 2001]);
}

#[test]
fn unmounted_view_ignores_its_load() {
    let mut h = host(Arc::new(Slow));
    h.mount();
    h.unmount();
    assert!(h.view().is_none());
    thread::sleep(Duration::from_millis(600));
    assert!(!h.poll());
    assert!(h.view().is_none());
}

#[test]
fn failed_load_leaves_an_empty_view() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = host(Arc::new(CsvFile::new(dir.path().join("missing.csv"))));
    h.mount();
    assert!(h.wait(Duration::from_secs(5)));

    let view = h.view().unwrap();
    assert!(matches!(view.status(), LoadStatus::Failed(_)));
    assert!(view.layout().is_none());
    assert!(view.render_svg().unwrap().is_none());
}

#[test]
fn csv_without_year_column_fails() {
    let mut h = host(Arc::new(CsvText::new("bad", "year_of,x\n2000,1\n")));
    h.mount();
    assert!(h.wait(Duration::from_secs(5)));
    match h.view().unwrap().status() {
        LoadStatus::Failed(reason) => assert!(reason.contains("Year"), "{reason}"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn navigation_stops_at_both_ends_and_remounts() {
    let mut h = host(Arc::new(CsvText::new("fixture", CSV)));
    h.mount();
    let first = h.view().unwrap().generation();

    assert!(!h.retreat());
    assert_eq!(h.view().unwrap().generation(), first);

    assert!(h.advance());
    assert!(h.advance());
    assert!(h.advance());
    assert!(!h.advance());
    assert_eq!(h.controller().index(), 3);
    assert_eq!(h.view().unwrap().generation(), first + 3);
    assert!(h.wait(Duration::from_secs(5)));
    assert!(h.retreat());
    assert_eq!(h.controller().index(), 2);
}

#[test]
fn remount_starts_with_fresh_state() {
    let mut h = host(Arc::new(CsvText::new("fixture", CSV)));
    h.jump(3);
    assert!(h.wait(Duration::from_secs(5)));

    let view = h.view_mut().unwrap();
    assert!(view.zoom_to(3.0));
    assert!(view.toggle_legend("Humidity"));
    assert_eq!(view.state().zoom.k, 3.0);
    assert!(!view.state().visibility.is_visible(0));

    assert!(h.retreat());
    assert!(h.advance());
    assert!(h.wait(Duration::from_secs(5)));
    let view = h.view().unwrap();
    assert_eq!(view.state().zoom.k, 1.0);
    assert!(view.state().visibility.is_visible(0));
}

#[test]
fn selectors_switch_the_plotted_series() {
    let mut h = host(Arc::new(CsvText::new("fixture", CSV)));
    h.jump(1);
    assert!(h.wait(Duration::from_secs(5)));

    let view = h.view_mut().unwrap();
    assert_eq!(view.state().selection, 0);
    assert!(view.select_metric("Maximum Temp"));
    assert_eq!(view.state().selection, 2);
    assert_eq!(view.model().unwrap().y[0].series, 2);
    assert!(!view.select_metric("Maximum Temp"));
    assert!(!view.select_metric("Dew Point"));

    // the rebuilt layout still takes pointer events
    view.handle(PointerEvent::Leave);
    assert!(!view.tooltip().visible);
}
