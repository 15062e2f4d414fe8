//! Record parser: raw string rows -> typed records, with per-view filtering.
//!
//! Malformed rows are never an error; they are dropped and only counted in the
//! debug log.

use crate::models::{Metric, RawRow, TypedRecord, YEAR_COLUMN};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("static regex"));

static LEADING_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").expect("static regex")
});

/// Drop records whose `metric` is at or above `limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpperBound {
    pub metric: Metric,
    pub limit: f64,
}

/// Which fields to parse and which records survive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsePolicy {
    /// Metric columns read from every row.
    pub fields: Vec<Metric>,
    /// Records with a `None` in any of these are dropped.
    #[serde(default)]
    pub required: Vec<Metric>,
    #[serde(default)]
    pub bounds: Vec<UpperBound>,
}

impl ParsePolicy {
    /// Every field must be present.
    pub fn strict(fields: Vec<Metric>) -> Self {
        Self {
            required: fields.clone(),
            fields,
            bounds: Vec::new(),
        }
    }

    /// Only the year must parse; metrics may stay `None`.
    pub fn tolerant(fields: Vec<Metric>) -> Self {
        Self {
            fields,
            required: Vec::new(),
            bounds: Vec::new(),
        }
    }

    pub fn with_upper_bound(mut self, metric: Metric, limit: f64) -> Self {
        self.bounds.push(UpperBound { metric, limit });
        self
    }
}

/// Integer prefix of a cell: `"2001"`, `" 2001.5"`, `"2001abc"` -> 2001.
pub fn parse_year(raw: &str) -> Option<i32> {
    let caps = LEADING_INT.captures(raw)?;
    caps.get(1)?.as_str().parse::<i32>().ok()
}

/// Float prefix of a cell. Empty, unparseable or non-finite cells are `None`.
pub fn parse_metric(raw: Option<&str>) -> Option<f64> {
    let caps = LEADING_FLOAT.captures(raw?)?;
    let v = caps.get(1)?.as_str().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Parse one row; `None` when the policy drops it.
pub fn parse_record(row: &RawRow, policy: &ParsePolicy) -> Option<TypedRecord> {
    let year = parse_year(row.get(YEAR_COLUMN)?)?;

    let metrics: BTreeMap<Metric, Option<f64>> = policy
        .fields
        .iter()
        .map(|m| (m.clone(), parse_metric(row.get(m.column()).map(String::as_str))))
        .collect();
    let record = TypedRecord { year, metrics };

    if policy.required.iter().any(|m| record.get(m).is_none()) {
        return None;
    }
    let out_of_bounds = policy
        .bounds
        .iter()
        .any(|b| record.get(&b.metric).is_some_and(|v| v >= b.limit));
    if out_of_bounds {
        return None;
    }
    Some(record)
}

/// Parse all rows, keeping input order.
pub fn parse_records(rows: &[RawRow], policy: &ParsePolicy) -> Vec<TypedRecord> {
    let out: Vec<TypedRecord> = rows
        .iter()
        .filter_map(|row| parse_record(row, policy))
        .collect();
    let dropped = rows.len() - out.len();
    if dropped > 0 {
        log::debug!("parser dropped {dropped} of {} rows", rows.len());
    }
    out
}
