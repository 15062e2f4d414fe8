//! The generic chart pipeline: parse -> aggregate -> sort -> scales.
//!
//! Every view runs this same code; only its [`ViewConfig`] differs.

use crate::aggregate::{aggregate, sort_by_key};
use crate::models::{AggregatedPoint, RawRow};
use crate::parse::parse_records;
use crate::scale::{Extent, LinearScale, Scale};
use crate::view::ViewConfig;

/// A value axis bound to one configured series.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueAxis {
    pub series: usize,
    pub scale: LinearScale,
}

/// Aggregated data plus the scales derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartModel {
    /// Sorted ascending by key.
    pub points: Vec<AggregatedPoint>,
    pub x: Scale,
    /// One axis per drawn series: left first, right second.
    pub y: Vec<ValueAxis>,
}

impl ChartModel {
    pub fn axis_for(&self, series: usize) -> Option<&LinearScale> {
        self.y.iter().find(|a| a.series == series).map(|a| &a.scale)
    }
}

/// Run the whole pipeline for one view.
pub fn run(config: &ViewConfig, rows: &[RawRow], selection: usize) -> ChartModel {
    let records = parse_records(rows, &config.parse);
    let points = aggregate(&records, &config.series_specs());
    log::debug!(
        "{}: {} rows -> {} records -> {} groups",
        config.title,
        rows.len(),
        records.len(),
        points.len()
    );
    build(config, points, selection)
}

/// Sort aggregated points and derive the scales for them.
pub fn build(config: &ViewConfig, points: Vec<AggregatedPoint>, selection: usize) -> ChartModel {
    let points = sort_by_key(points);
    let keys: Vec<i32> = points.iter().map(|p| p.key).collect();
    let frame = config.frame;
    let x = Scale::for_keys(
        config.x_axis.kind,
        &keys,
        frame.width as f64,
        config.x_axis.padding,
    );

    let y = config
        .drawn_series(selection)
        .into_iter()
        .filter_map(|i| {
            let series = config.series.get(i)?;
            let data = Extent::of(points.iter().filter_map(|p| p.value(&series.metric)));
            Some(ValueAxis {
                series: i,
                scale: LinearScale::new(series.domain.resolve(data), (frame.height as f64, 0.0)),
            })
        })
        .collect();

    ChartModel { points, x, y }
}
