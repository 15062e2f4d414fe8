use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Column holding the grouping key of every observation.
pub const YEAR_COLUMN: &str = "Year";

/// Well-known metric columns of the climate dataset.
pub mod columns {
    pub const AVG_TEMP: &str = "Avg_Temp (°C)";
    pub const MIN_TEMP: &str = "Min_Temp (°C)";
    pub const MAX_TEMP: &str = "Max_Temp (°C)";
    pub const PRECIPITATION: &str = "Precipitation (mm)";
    pub const HUMIDITY: &str = "Humidity (%)";
    pub const WIND_SPEED: &str = "Wind_Speed (m/s)";
}

/// One source row as delivered by the ingestion layer: column name -> raw cell text.
pub type RawRow = BTreeMap<String, String>;

/// A metric, identified by the source column it is read from.
///
/// Display label and unit are derived from the header, e.g.
/// `"Wind_Speed (m/s)"` -> label `"Wind Speed"`, unit `"m/s"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metric(String);

impl Metric {
    pub fn new(column: impl Into<String>) -> Self {
        Self(column.into())
    }

    /// Source column name.
    pub fn column(&self) -> &str {
        &self.0
    }

    /// Header without its unit suffix, underscores turned into spaces.
    pub fn label(&self) -> String {
        let base = match split_unit(&self.0) {
            Some((base, _)) => base,
            None => self.0.as_str(),
        };
        base.trim().replace('_', " ")
    }

    /// Unit taken from the trailing parenthesised part of the header, if any.
    pub fn unit(&self) -> Option<&str> {
        split_unit(&self.0).map(|(_, unit)| unit)
    }
}

impl From<&str> for Metric {
    fn from(column: &str) -> Self {
        Self::new(column)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split `"Name (unit)"` into `("Name ", "unit")`.
fn split_unit(header: &str) -> Option<(&str, &str)> {
    let open = header.rfind('(')?;
    let close = header.rfind(')')?;
    if close <= open {
        return None;
    }
    let inner = header[open + 1..close].trim();
    if inner.is_empty() {
        None
    } else {
        Some((&header[..open], inner))
    }
}

/// A parsed observation. Metrics that were empty or unparseable are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedRecord {
    pub year: i32,
    pub metrics: BTreeMap<Metric, Option<f64>>,
}

impl TypedRecord {
    pub fn get(&self, metric: &Metric) -> Option<f64> {
        self.metrics.get(metric).copied().flatten()
    }
}

/// One group of the aggregated sequence. `None` marks a metric whose group had
/// no values to reduce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPoint {
    pub key: i32,
    pub values: BTreeMap<Metric, Option<f64>>,
}

impl AggregatedPoint {
    pub fn value(&self, metric: &Metric) -> Option<f64> {
        self.values.get(metric).copied().flatten()
    }
}

impl From<&AggregatedPoint> for TypedRecord {
    fn from(p: &AggregatedPoint) -> Self {
        Self {
            year: p.key,
            metrics: p.values.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_and_unit_come_from_header() {
        let m = Metric::from(columns::WIND_SPEED);
        assert_eq!(m.label(), "Wind Speed");
        assert_eq!(m.unit(), Some("m/s"));

        let m = Metric::from(columns::AVG_TEMP);
        assert_eq!(m.label(), "Avg Temp");
        assert_eq!(m.unit(), Some("°C"));
    }

    #[test]
    fn header_without_unit() {
        let m = Metric::from("CO2_Level");
        assert_eq!(m.label(), "CO2 Level");
        assert_eq!(m.unit(), None);
        assert_eq!(Metric::from("Odd ()").unit(), None);
    }
}
