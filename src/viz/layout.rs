//! Backend-free chart geometry.
//!
//! [`layout_chart`] turns a [`ChartModel`] into axes, marks and legend entries
//! in plot-local pixels (origin at the top-left corner of the plot area). The
//! renderer paints this, and the interaction layer hit-tests against it.

use super::text::{estimate_text_width_px, truncate_to_width};
use super::util::{format_reading, format_tick};
use crate::interact::Visibility;
use crate::models::AggregatedPoint;
use crate::pipeline::ChartModel;
use crate::scale::{LinearScale, Scale};
use crate::view::{ChartFrame, MarkKind, Rgb, SeriesConfig, ViewConfig};

/// Requested tick count for value and temporal axes.
const TICKS: usize = 10;
/// Minimum spacing between band axis labels.
const BAND_LABEL_PX: f64 = 40.0;
const DOT_RADIUS: f64 = 5.0;
pub const LEGEND_FONT_PX: u32 = 10;
const LEGEND_SWATCH: f64 = 19.0;
const LEGEND_ROW: f64 = 20.0;
const LEGEND_LABEL_MAX_PX: f64 = 160.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Inclusive of the top-left edges, exclusive of the bottom-right ones.
    pub fn contains(&self, p: (f64, f64)) -> bool {
        p.0 >= self.x && p.0 < self.right() && p.1 >= self.y && p.1 < self.bottom()
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSide {
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Position along the axis in plot-local pixels.
    pub pos: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisLayout {
    pub side: AxisSide,
    pub ticks: Vec<Tick>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkShape {
    Bar(Rect),
    Dot { cx: f64, cy: f64, r: f64 },
}

impl MarkShape {
    pub fn contains(&self, p: (f64, f64)) -> bool {
        match *self {
            MarkShape::Bar(r) => r.contains(p),
            MarkShape::Dot { cx, cy, r } => {
                let (dx, dy) = (p.0 - cx, p.1 - cy);
                dx * dx + dy * dy <= r * r
            }
        }
    }
}

/// One hoverable mark.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub key: i32,
    pub value: f64,
    pub shape: MarkShape,
    pub tooltip: Vec<String>,
}

/// Everything drawn for one series; this is the unit the legend toggles.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesLayout {
    pub series: usize,
    pub label: String,
    pub color: Rgb,
    /// Line segments, broken wherever a value is missing. Empty for bars.
    pub path: Vec<Vec<(f64, f64)>>,
    pub marks: Vec<Mark>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub series: usize,
    pub label: String,
    pub color: Rgb,
    pub swatch: Rect,
    /// Clickable area: swatch plus label.
    pub hit: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub frame: ChartFrame,
    /// Plot area in plot-local pixels, `(0, 0, width, height)`.
    pub plot: Rect,
    pub x_axis: AxisLayout,
    pub y_axes: Vec<AxisLayout>,
    pub series: Vec<SeriesLayout>,
    pub legend: Vec<LegendEntry>,
}

impl ChartLayout {
    /// Topmost visible mark under `p` (plot-local, zoom already inverted).
    pub fn hit_mark(&self, p: (f64, f64), visibility: &Visibility) -> Option<&Mark> {
        self.series
            .iter()
            .rev()
            .filter(|s| visibility.is_visible(s.series))
            .find_map(|s| s.marks.iter().find(|m| m.shape.contains(p)))
    }

    /// Series whose legend entry is under `p` (plot-local).
    pub fn hit_legend(&self, p: (f64, f64)) -> Option<usize> {
        self.legend.iter().find(|e| e.hit.contains(p)).map(|e| e.series)
    }
}

/// Lay out a chart for `config` from an already built model.
pub fn layout_chart(config: &ViewConfig, model: &ChartModel) -> ChartLayout {
    let frame = config.frame;
    let (w, h) = (frame.width as f64, frame.height as f64);

    let x_axis = AxisLayout {
        side: AxisSide::Bottom,
        ticks: x_ticks(&model.x, w),
        title: config.x_axis.title.clone(),
    };

    let y_axes = model
        .y
        .iter()
        .enumerate()
        .filter_map(|(i, axis)| {
            let series = config.series.get(axis.series)?;
            Some(AxisLayout {
                side: if i == 0 { AxisSide::Left } else { AxisSide::Right },
                ticks: value_ticks(&axis.scale),
                title: series.axis_title.clone(),
            })
        })
        .collect();

    let series = match config.mark {
        MarkKind::Line { points } => model
            .y
            .iter()
            .filter_map(|axis| {
                let cfg = config.series.get(axis.series)?;
                Some(line_series(axis.series, cfg, &model.points, &model.x, &axis.scale, points))
            })
            .collect(),
        MarkKind::Bar | MarkKind::DualBar => {
            let pairs = model.y.len().max(1);
            model
                .y
                .iter()
                .enumerate()
                .filter_map(|(slot, axis)| {
                    let cfg = config.series.get(axis.series)?;
                    Some(bar_series(
                        axis.series,
                        cfg,
                        &model.points,
                        &model.x,
                        &axis.scale,
                        (slot, pairs),
                        config.x_axis.padding,
                        w,
                    ))
                })
                .collect()
        }
    };

    let legend = if config.interaction.legend {
        legend_entries(config, model, w)
    } else {
        Vec::new()
    };

    ChartLayout {
        frame,
        plot: Rect::new(0.0, 0.0, w, h),
        x_axis,
        y_axes,
        series,
        legend,
    }
}

fn x_ticks(x: &Scale, width: f64) -> Vec<Tick> {
    match x {
        Scale::Temporal(s) => s
            .year_ticks(TICKS)
            .into_iter()
            .filter_map(|year| {
                let pos = s.map_year(year)?;
                let date = chrono::NaiveDate::from_ymd_opt(year, 1, 1)?;
                Some(Tick {
                    pos,
                    label: date.format("%Y").to_string(),
                })
            })
            .collect(),
        Scale::Linear(s) => s
            .ticks(TICKS)
            .into_iter()
            .filter(|v| v.fract() == 0.0)
            .map(|v| Tick {
                pos: s.map(v),
                label: format!("{}", v as i64),
            })
            .collect(),
        Scale::Band(s) => {
            let keys = s.keys();
            let fit = ((width / BAND_LABEL_PX).floor() as usize).max(1);
            let every = keys.len().div_ceil(fit).max(1);
            keys.iter()
                .step_by(every)
                .filter_map(|k| {
                    Some(Tick {
                        pos: s.center(*k)?,
                        label: k.to_string(),
                    })
                })
                .collect()
        }
    }
}

fn value_ticks(scale: &LinearScale) -> Vec<Tick> {
    let step = scale.tick_step(TICKS).unwrap_or(1.0);
    scale
        .ticks(TICKS)
        .into_iter()
        .map(|v| Tick {
            pos: scale.map(v),
            label: format_tick(v, step),
        })
        .collect()
}

fn tooltip_lines(key: i32, cfg: &SeriesConfig, value: f64) -> Vec<String> {
    vec![
        format!("Year: {key}"),
        format_reading(&cfg.label, value, cfg.metric.unit()),
    ]
}

fn line_series(
    index: usize,
    cfg: &SeriesConfig,
    points: &[AggregatedPoint],
    x: &Scale,
    y: &LinearScale,
    dots: bool,
) -> SeriesLayout {
    let mut path: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    let mut marks = Vec::new();

    for p in points {
        let placed = x
            .position(p.key)
            .zip(p.value(&cfg.metric))
            .map(|(px, v)| (px, y.map(v), v));
        match placed {
            Some((px, py, v)) => {
                current.push((px, py));
                if dots {
                    marks.push(Mark {
                        key: p.key,
                        value: v,
                        shape: MarkShape::Dot {
                            cx: px,
                            cy: py,
                            r: DOT_RADIUS,
                        },
                        tooltip: tooltip_lines(p.key, cfg, v),
                    });
                }
            }
            None => {
                if !current.is_empty() {
                    path.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        path.push(current);
    }

    SeriesLayout {
        series: index,
        label: cfg.label.clone(),
        color: cfg.color,
        path,
        marks,
    }
}

/// `slot` is `(index, count)` of this series among side-by-side bars.
#[allow(clippy::too_many_arguments)]
fn bar_series(
    index: usize,
    cfg: &SeriesConfig,
    points: &[AggregatedPoint],
    x: &Scale,
    y: &LinearScale,
    slot: (usize, usize),
    padding: f64,
    width: f64,
) -> SeriesLayout {
    // band scales know their bandwidth; continuous ones get an even share
    let band = match x {
        Scale::Band(b) => b.bandwidth(),
        _ => width / points.len().max(1) as f64 * (1.0 - padding),
    };
    let bar_w = band / slot.1 as f64;

    let domain = y.domain();
    let (lo, hi) = if domain.min <= domain.max {
        (domain.min, domain.max)
    } else {
        (domain.max, domain.min)
    };
    let baseline = y.map(0f64.clamp(lo, hi));

    let marks = points
        .iter()
        .filter_map(|p| {
            let v = p.value(&cfg.metric)?;
            let left = match x {
                Scale::Band(b) => b.position(p.key)?,
                _ => x.position(p.key)? - band / 2.0,
            } + slot.0 as f64 * bar_w;
            let top = y.map(v);
            let rect = Rect::new(left, top.min(baseline), bar_w, (baseline - top).abs());
            Some(Mark {
                key: p.key,
                value: v,
                shape: MarkShape::Bar(rect),
                tooltip: tooltip_lines(p.key, cfg, v),
            })
        })
        .collect();

    SeriesLayout {
        series: index,
        label: cfg.label.clone(),
        color: cfg.color,
        path: Vec::new(),
        marks,
    }
}

fn legend_entries(config: &ViewConfig, model: &ChartModel, width: f64) -> Vec<LegendEntry> {
    model
        .y
        .iter()
        .enumerate()
        .filter_map(|(row, axis)| {
            let cfg = config.series.get(axis.series)?;
            let label = truncate_to_width(&cfg.label, LEGEND_FONT_PX, LEGEND_LABEL_MAX_PX);
            let top = row as f64 * LEGEND_ROW;
            let swatch = Rect::new(width - LEGEND_SWATCH, top, LEGEND_SWATCH, LEGEND_SWATCH);
            let text_w = estimate_text_width_px(&label, LEGEND_FONT_PX);
            let hit_left = swatch.x - 5.0 - text_w;
            let hit = Rect::new(hit_left, top, width - hit_left, LEGEND_SWATCH);
            Some(LegendEntry {
                series: axis.series,
                label,
                color: cfg.color,
                swatch,
                hit,
            })
        })
        .collect()
}
