//! Per-view configuration records and per-view transient state.
//!
//! Every chart view runs the same pipeline; a [`ViewConfig`] says which fields
//! to parse, how to filter and reduce them, which scales to build and which
//! kind of mark to draw. The four views of the climate slideshow are available
//! from [`ViewConfig::builtin`].

use crate::aggregate::{Reducer, SeriesSpec};
use crate::error::ConfigError;
use crate::interact::{Visibility, ZoomConfig, ZoomTransform};
use crate::models::{AggregatedPoint, Metric, columns};
use crate::parse::ParsePolicy;
use crate::scale::{LinearDomain, ScaleKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque RGB color, written as `#rrggbb` in configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const STEELBLUE: Rgb = Rgb(70, 130, 180);
}

impl FromStr for Rgb {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ConfigError::BadColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(bad)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(bad());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Space around the plot area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Margins {
    pub const fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// Plot area size plus margins. The drawing surface is
/// `width + left + right` by `height + top + bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartFrame {
    pub width: u32,
    pub height: u32,
    pub margin: Margins,
}

impl ChartFrame {
    /// Fit the plot area into an outer surface of `outer_w` x `outer_h`.
    pub fn fit(outer_w: u32, outer_h: u32, margin: Margins) -> Self {
        Self {
            width: outer_w.saturating_sub(margin.left + margin.right),
            height: outer_h.saturating_sub(margin.top + margin.bottom),
            margin,
        }
    }

    pub fn outer_size(&self) -> (u32, u32) {
        (
            self.width + self.margin.left + self.margin.right,
            self.height + self.margin.top + self.margin.bottom,
        )
    }

    /// Surface pixel -> plot-local pixel.
    pub fn to_plot(&self, surface: (f64, f64)) -> (f64, f64) {
        (
            surface.0 - self.margin.left as f64,
            surface.1 - self.margin.top as f64,
        )
    }
}

/// One plotted series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub metric: Metric,
    pub reducer: Reducer,
    /// Legend and tooltip label.
    pub label: String,
    pub color: Rgb,
    pub axis_title: String,
    pub domain: LinearDomain,
}

impl SeriesConfig {
    pub fn spec(&self) -> SeriesSpec {
        SeriesSpec::new(self.metric.clone(), self.reducer)
    }
}

/// How the aggregated series are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkKind {
    /// One continuous path for the selected series, optionally with a dot per point.
    Line {
        #[serde(default)]
        points: bool,
    },
    /// One rectangle per key for the first series.
    Bar,
    /// Paired half-width bars: first series on the left axis, second on the right.
    DualBar,
}

impl MarkKind {
    fn name(&self) -> &'static str {
        match self {
            MarkKind::Line { .. } => "line",
            MarkKind::Bar => "bar",
            MarkKind::DualBar => "dual-bar",
        }
    }

    fn series_needed(&self) -> usize {
        match self {
            MarkKind::Line { .. } | MarkKind::Bar => 1,
            MarkKind::DualBar => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XAxisConfig {
    pub kind: ScaleKind,
    pub title: String,
    /// Band padding; ignored by continuous scales.
    #[serde(default = "default_padding")]
    pub padding: f64,
}

fn default_padding() -> f64 {
    0.1
}

/// Which interactions a view wires up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    #[serde(default)]
    pub tooltip: bool,
    #[serde(default)]
    pub zoom: Option<ZoomConfig>,
    #[serde(default)]
    pub legend: bool,
}

/// A metric-selector control: a button label and the series it activates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    pub label: String,
    pub series: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub parse: ParsePolicy,
    pub series: Vec<SeriesConfig>,
    pub mark: MarkKind,
    pub x_axis: XAxisConfig,
    pub frame: ChartFrame,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub selectors: Vec<Selector>,
}

impl ViewConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let view = self.title.clone();
        if self.series.is_empty() {
            return Err(ConfigError::NoSeries { view });
        }
        let needed = self.mark.series_needed();
        if self.series.len() < needed {
            return Err(ConfigError::TooFewSeries {
                view,
                mark: self.mark.name(),
                needed,
                found: self.series.len(),
            });
        }
        if let Some(sel) = self.selectors.iter().find(|s| s.series >= self.series.len()) {
            return Err(ConfigError::BadSelector {
                view,
                label: sel.label.clone(),
                index: sel.series,
            });
        }
        // series are keyed by metric after aggregation
        for (i, s) in self.series.iter().enumerate() {
            if self.series[..i].iter().any(|prev| prev.metric == s.metric) {
                return Err(ConfigError::DuplicateMetric {
                    view,
                    metric: s.metric.to_string(),
                });
            }
        }
        let padding = self.x_axis.padding;
        if !(0.0..1.0).contains(&padding) {
            return Err(ConfigError::BadPadding { view, padding });
        }
        if let Some(zoom) = &self.interaction.zoom {
            let (min, max) = zoom.scale_extent;
            if !(min > 0.0 && min <= max) {
                return Err(ConfigError::BadScaleExtent { view, min, max });
            }
        }
        Ok(())
    }

    /// Reducer spec for every configured series.
    pub fn series_specs(&self) -> Vec<SeriesSpec> {
        self.series.iter().map(SeriesConfig::spec).collect()
    }

    /// Indices of the series drawn for the given selection.
    pub fn drawn_series(&self, selection: usize) -> Vec<usize> {
        match self.mark {
            MarkKind::Line { .. } => vec![selection.min(self.series.len().saturating_sub(1))],
            MarkKind::Bar => vec![0],
            MarkKind::DualBar => vec![0, 1],
        }
    }

    /// The four climate views in slideshow order.
    pub fn builtin() -> Vec<ViewConfig> {
        vec![
            Self::temperature_overview(),
            Self::temperature_details(),
            Self::precipitation(),
            Self::humidity_and_wind(),
        ]
    }

    /// Mean average temperature per year as a line with hoverable dots.
    pub fn temperature_overview() -> Self {
        let avg = Metric::from(columns::AVG_TEMP);
        Self {
            title: "Introduction".into(),
            subtitle: "Overview of global temperature trends.".into(),
            parse: ParsePolicy::strict(vec![avg.clone()]),
            series: vec![SeriesConfig {
                metric: avg,
                reducer: Reducer::Mean,
                label: "Avg Temp".into(),
                color: Rgb::STEELBLUE,
                axis_title: "Average Temperature (°C)".into(),
                domain: LinearDomain::zero_based(),
            }],
            mark: MarkKind::Line { points: true },
            x_axis: year_axis(ScaleKind::Temporal),
            frame: ChartFrame::fit(960, 500, Margins::new(20, 30, 50, 70)),
            interaction: InteractionConfig {
                tooltip: true,
                ..InteractionConfig::default()
            },
            selectors: Vec::new(),
        }
    }

    /// Average, minimum or maximum temperature per year, picked by selector.
    pub fn temperature_details() -> Self {
        let metrics = [
            (columns::AVG_TEMP, Reducer::Mean, "Avg Temp", "Average Temp"),
            (columns::MIN_TEMP, Reducer::Min, "Min Temp", "Minimum Temp"),
            (columns::MAX_TEMP, Reducer::Max, "Max Temp", "Maximum Temp"),
        ];
        let series = metrics
            .iter()
            .map(|(col, reducer, label, _)| SeriesConfig {
                metric: Metric::from(*col),
                reducer: *reducer,
                label: (*label).into(),
                color: Rgb::STEELBLUE,
                axis_title: "Temperature (°C)".into(),
                domain: LinearDomain::data(),
            })
            .collect();
        let selectors = metrics
            .iter()
            .enumerate()
            .map(|(i, (_, _, _, button))| Selector {
                label: (*button).into(),
                series: i,
            })
            .collect();
        Self {
            title: "Temperature Details by Year".into(),
            subtitle: "Select the type of temperature to display:".into(),
            parse: ParsePolicy::tolerant(metrics.iter().map(|(c, ..)| Metric::from(*c)).collect()),
            series,
            mark: MarkKind::Line { points: false },
            x_axis: year_axis(ScaleKind::Temporal),
            frame: ChartFrame::fit(960, 500, Margins::new(20, 30, 50, 70)),
            interaction: InteractionConfig::default(),
            selectors,
        }
    }

    /// Total precipitation per year as bars; readings of 10 000 mm or more are dropped.
    pub fn precipitation() -> Self {
        let precip = Metric::from(columns::PRECIPITATION);
        Self {
            title: "Yearly Precipitation Trends".into(),
            subtitle: "Explore precipitation changes over the years.".into(),
            parse: ParsePolicy::strict(vec![precip.clone()])
                .with_upper_bound(precip.clone(), 10_000.0),
            series: vec![SeriesConfig {
                metric: precip,
                reducer: Reducer::Sum,
                label: "Precipitation".into(),
                color: Rgb::STEELBLUE,
                axis_title: "Precipitation (mm)".into(),
                domain: LinearDomain::zero_based(),
            }],
            mark: MarkKind::Bar,
            x_axis: year_axis(ScaleKind::Band),
            frame: ChartFrame::fit(960, 500, Margins::new(20, 30, 50, 70)),
            interaction: InteractionConfig {
                tooltip: true,
                ..InteractionConfig::default()
            },
            selectors: Vec::new(),
        }
    }

    /// Mean humidity and wind speed per year on two fixed axes, with zoom and legend.
    pub fn humidity_and_wind() -> Self {
        let humidity = Metric::from(columns::HUMIDITY);
        let wind = Metric::from(columns::WIND_SPEED);
        Self {
            title: "Climate Factors: Humidity and Wind Speed".into(),
            subtitle: "Explore how humidity and wind speed levels have changed over the years."
                .into(),
            parse: ParsePolicy::strict(vec![humidity.clone(), wind.clone()]),
            series: vec![
                SeriesConfig {
                    metric: humidity,
                    reducer: Reducer::Mean,
                    label: "Humidity".into(),
                    color: Rgb(0x69, 0xb3, 0xa2),
                    axis_title: "Humidity (%)".into(),
                    domain: LinearDomain::fixed(0.0, 100.0),
                },
                SeriesConfig {
                    metric: wind,
                    reducer: Reducer::Mean,
                    label: "Wind Speed".into(),
                    color: Rgb(0xd8, 0x87, 0x71),
                    axis_title: "Wind Speed (m/s)".into(),
                    domain: LinearDomain::fixed(0.0, 50.0),
                },
            ],
            mark: MarkKind::DualBar,
            x_axis: year_axis(ScaleKind::Band),
            frame: ChartFrame::fit(960, 500, Margins::new(20, 80, 60, 80)),
            interaction: InteractionConfig {
                tooltip: true,
                zoom: Some(ZoomConfig::default()),
                legend: true,
            },
            selectors: Vec::new(),
        }
    }
}

fn year_axis(kind: ScaleKind) -> XAxisConfig {
    XAxisConfig {
        kind,
        title: "Year".into(),
        padding: default_padding(),
    }
}

/// Transient state of one mounted view. Dropped on unmount, rebuilt on re-entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Index into the view's series, chosen by its selectors.
    pub selection: usize,
    pub zoom: ZoomTransform,
    pub visibility: Visibility,
    /// Last aggregated sequence, sorted by key.
    pub data: Vec<AggregatedPoint>,
}

impl ViewState {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            selection: config.selectors.first().map(|s| s.series).unwrap_or(0),
            zoom: ZoomTransform::IDENTITY,
            visibility: Visibility::new(config.series.len()),
            data: Vec::new(),
        }
    }
}
