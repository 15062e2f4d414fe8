//! Domain -> pixel mappings derived from aggregated data.
//!
//! - [`TemporalScale`]: continuous year axis, dates normalised to January 1st
//! - [`LinearScale`]: value axis, usually inverted (`[height, 0]`) so larger values plot higher
//! - [`BandScale`]: categorical axis with one equal-width slot per distinct key
//!
//! Scales never look at input order and never fail: an empty input produces a
//! degenerate scale whose domain is `[0, 0]` and which maps everything to the
//! middle of its range.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// `[min, max]` of a numeric sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    pub const EMPTY: Extent = Extent { min: 0.0, max: 0.0 };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Extent of the finite values, `None` when there are none.
    pub fn of<I>(values: I) -> Option<Extent>
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Extent>, v| match acc {
                None => Some(Extent::new(v, v)),
                Some(e) => Some(Extent::new(e.min.min(v), e.max.max(v))),
            })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Scale families a view can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    Temporal,
    Linear,
    Band,
}

fn interpolate(domain: Extent, range: (f64, f64), v: f64) -> f64 {
    let span = domain.span();
    if span == 0.0 || !span.is_finite() {
        return (range.0 + range.1) / 2.0;
    }
    range.0 + (v - domain.min) / span * (range.1 - range.0)
}

/// Tick layout in d3's integer form: ticks are `i * inc` for `inc > 0`,
/// `i / -inc` otherwise, for `i` in `i1..=i2`.
struct TickSpec {
    i1: i64,
    i2: i64,
    inc: f64,
}

fn tick_spec(start: f64, stop: f64, count: usize) -> Option<TickSpec> {
    let step = (stop - start) / count as f64;
    if step <= 0.0 || !step.is_finite() {
        return None;
    }
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };

    if power < 0.0 {
        let inc = 10f64.powf(-power) / factor;
        let mut i1 = (start * inc).round() as i64;
        let mut i2 = (stop * inc).round() as i64;
        if (i1 as f64) / inc < start {
            i1 += 1;
        }
        if (i2 as f64) / inc > stop {
            i2 -= 1;
        }
        Some(TickSpec { i1, i2, inc: -inc })
    } else {
        let inc = 10f64.powf(power) * factor;
        let mut i1 = (start / inc).round() as i64;
        let mut i2 = (stop / inc).round() as i64;
        if (i1 as f64) * inc < start {
            i1 += 1;
        }
        if (i2 as f64) * inc > stop {
            i2 -= 1;
        }
        Some(TickSpec { i1, i2, inc })
    }
}

/// Continuous numeric scale.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearScale {
    domain: Extent,
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: Extent, range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> Extent {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn map(&self, v: f64) -> f64 {
        interpolate(self.domain, self.range, v)
    }

    /// Pixel -> domain value. A degenerate scale returns its domain minimum.
    pub fn invert(&self, px: f64) -> f64 {
        let span = self.range.1 - self.range.0;
        if span == 0.0 || self.domain.span() == 0.0 {
            return self.domain.min;
        }
        self.domain.min + (px - self.range.0) / span * self.domain.span()
    }

    /// Round tick values (1, 2 or 5 times a power of ten) inside the domain,
    /// roughly `count` of them.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = ordered(self.domain);
        if count == 0 {
            return Vec::new();
        }
        if lo == hi {
            return vec![lo];
        }
        match tick_spec(lo, hi, count) {
            Some(spec) if spec.i2 >= spec.i1 => (spec.i1..=spec.i2)
                .map(|i| {
                    if spec.inc < 0.0 {
                        i as f64 / -spec.inc
                    } else {
                        i as f64 * spec.inc
                    }
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Distance between two ticks produced by [`LinearScale::ticks`].
    pub fn tick_step(&self, count: usize) -> Option<f64> {
        let (lo, hi) = ordered(self.domain);
        if count == 0 {
            return None;
        }
        tick_spec(lo, hi, count).map(|s| if s.inc < 0.0 { 1.0 / -s.inc } else { s.inc })
    }
}

fn ordered(e: Extent) -> (f64, f64) {
    if e.min <= e.max { (e.min, e.max) } else { (e.max, e.min) }
}

/// Where the lower end of a value axis comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainFloor {
    Zero,
    DataMin,
    Fixed(f64),
}

/// Where the upper end of a value axis comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainCeiling {
    DataMax,
    Fixed(f64),
}

/// Recipe for a [`LinearScale`] domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearDomain {
    pub floor: DomainFloor,
    pub ceiling: DomainCeiling,
}

impl LinearDomain {
    /// `[0, max(data)]`.
    pub const fn zero_based() -> Self {
        Self {
            floor: DomainFloor::Zero,
            ceiling: DomainCeiling::DataMax,
        }
    }

    /// `[min(data), max(data)]`.
    pub const fn data() -> Self {
        Self {
            floor: DomainFloor::DataMin,
            ceiling: DomainCeiling::DataMax,
        }
    }

    /// Fixed bounds, independent of the data.
    pub const fn fixed(min: f64, max: f64) -> Self {
        Self {
            floor: DomainFloor::Fixed(min),
            ceiling: DomainCeiling::Fixed(max),
        }
    }

    /// Resolve against the data extent; missing data counts as zero.
    pub fn resolve(&self, data: Option<Extent>) -> Extent {
        let data = data.unwrap_or(Extent::EMPTY);
        let min = match self.floor {
            DomainFloor::Zero => 0.0,
            DomainFloor::DataMin => data.min,
            DomainFloor::Fixed(v) => v,
        };
        let max = match self.ceiling {
            DomainCeiling::DataMax => data.max,
            DomainCeiling::Fixed(v) => v,
        };
        Extent::new(min, max)
    }
}

/// Continuous year axis. Years are placed at January 1st.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalScale {
    domain: Option<(NaiveDate, NaiveDate)>,
    range: (f64, f64),
}

impl TemporalScale {
    pub fn from_years<I>(years: I, range: (f64, f64)) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let domain = years
            .into_iter()
            .filter_map(year_start)
            .fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| match acc {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            });
        Self { domain, range }
    }

    pub fn domain(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Domain as days from the common era; `[0, 0]` when empty.
    pub fn extent(&self) -> Extent {
        match self.domain {
            Some((lo, hi)) => Extent::new(
                lo.num_days_from_ce() as f64,
                hi.num_days_from_ce() as f64,
            ),
            None => Extent::EMPTY,
        }
    }

    pub fn map_date(&self, date: NaiveDate) -> f64 {
        interpolate(self.extent(), self.range, date.num_days_from_ce() as f64)
    }

    pub fn map_year(&self, year: i32) -> Option<f64> {
        year_start(year).map(|d| self.map_date(d))
    }

    /// Year ticks spaced 1, 2 or 5 times a power of ten.
    pub fn year_ticks(&self, count: usize) -> Vec<i32> {
        let Some((lo, hi)) = self.domain else {
            return Vec::new();
        };
        let (lo, hi) = (lo.year(), hi.year());
        if count == 0 {
            return Vec::new();
        }
        if lo == hi {
            return vec![lo];
        }
        let step = match tick_spec(lo as f64, hi as f64, count) {
            Some(s) if s.inc > 0.0 => s.inc as i32,
            _ => 1,
        }
        .max(1);
        let first = lo.div_euclid(step) * step;
        let first = if first < lo { first + step } else { first };
        (first..=hi).step_by(step as usize).collect()
    }
}

fn year_start(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}

/// Categorical axis dividing the range into equal slots, one per distinct key.
///
/// With `n` keys over width `W` and padding `p`, each slot is `W / n` wide and
/// the band inside it `W / n * (1 - p)`, centred in its slot.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    keys: Vec<i32>,
    range: (f64, f64),
    padding: f64,
}

impl BandScale {
    /// Duplicate keys keep their first position. Padding is clamped into `[0, 1)`.
    pub fn new<I>(keys: I, range: (f64, f64), padding: f64) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let mut out: Vec<i32> = Vec::new();
        for k in keys {
            if !out.contains(&k) {
                out.push(k);
            }
        }
        let padding = if padding.is_finite() {
            padding.clamp(0.0, 0.999)
        } else {
            0.0
        };
        Self {
            keys: out,
            range,
            padding,
        }
    }

    pub fn keys(&self) -> &[i32] {
        &self.keys
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    pub fn step(&self) -> f64 {
        if self.keys.is_empty() {
            0.0
        } else {
            (self.range.1 - self.range.0) / self.keys.len() as f64
        }
    }

    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding)
    }

    /// Left edge of the band for `key`.
    pub fn position(&self, key: i32) -> Option<f64> {
        let i = self.keys.iter().position(|k| *k == key)?;
        let step = self.step();
        Some(self.range.0 + i as f64 * step + step * self.padding / 2.0)
    }

    pub fn center(&self, key: i32) -> Option<f64> {
        self.position(key).map(|x| x + self.bandwidth() / 2.0)
    }

    /// Smallest and largest key; `[0, 0]` when empty.
    pub fn extent(&self) -> Extent {
        Extent::of(self.keys.iter().map(|k| *k as f64)).unwrap_or(Extent::EMPTY)
    }
}

/// Any of the three scale kinds, as used for the horizontal axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Scale {
    Temporal(TemporalScale),
    Linear(LinearScale),
    Band(BandScale),
}

impl Scale {
    /// Build a horizontal key scale of `kind` over `keys`, spanning `[0, width]`.
    pub fn for_keys(kind: ScaleKind, keys: &[i32], width: f64, padding: f64) -> Self {
        match kind {
            ScaleKind::Temporal => {
                Scale::Temporal(TemporalScale::from_years(keys.iter().copied(), (0.0, width)))
            }
            ScaleKind::Linear => {
                let domain =
                    Extent::of(keys.iter().map(|k| *k as f64)).unwrap_or(Extent::EMPTY);
                Scale::Linear(LinearScale::new(domain, (0.0, width)))
            }
            ScaleKind::Band => Scale::Band(BandScale::new(keys.iter().copied(), (0.0, width), padding)),
        }
    }

    pub fn kind(&self) -> ScaleKind {
        match self {
            Scale::Temporal(_) => ScaleKind::Temporal,
            Scale::Linear(_) => ScaleKind::Linear,
            Scale::Band(_) => ScaleKind::Band,
        }
    }

    pub fn extent(&self) -> Extent {
        match self {
            Scale::Temporal(s) => s.extent(),
            Scale::Linear(s) => s.domain(),
            Scale::Band(s) => s.extent(),
        }
    }

    /// Pixel position of a key: the band centre for band scales.
    pub fn position(&self, key: i32) -> Option<f64> {
        match self {
            Scale::Temporal(s) => s.map_year(key),
            Scale::Linear(s) => Some(s.map(key as f64)),
            Scale::Band(s) => s.center(key),
        }
    }
}
