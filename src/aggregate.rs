//! Group-by-year aggregation with a pluggable reducer per series.

use crate::models::{AggregatedPoint, Metric, TypedRecord};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Collapses the values of one group into a single number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    Mean,
    Min,
    Max,
    Sum,
    /// First value of the group; meant for groups holding a single value.
    Identity,
}

impl Reducer {
    /// Reduce `values`. An empty input gives `None` for every reducer.
    pub fn reduce<I>(self, values: I) -> Option<f64>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        let out = match self {
            Reducer::Identity => first,
            Reducer::Min => iter.fold(first, f64::min),
            Reducer::Max => iter.fold(first, f64::max),
            Reducer::Sum => iter.fold(first, |a, b| a + b),
            Reducer::Mean => {
                let (sum, n) = iter.fold((first, 1usize), |(s, n), v| (s + v, n + 1));
                sum / n as f64
            }
        };
        Some(out)
    }
}

/// One output series: which metric to read and how to reduce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub metric: Metric,
    pub reducer: Reducer,
}

impl SeriesSpec {
    pub fn new(metric: Metric, reducer: Reducer) -> Self {
        Self { metric, reducer }
    }
}

/// Group by year and reduce every series. See [`aggregate_by`].
pub fn aggregate(records: &[TypedRecord], series: &[SeriesSpec]) -> Vec<AggregatedPoint> {
    aggregate_by(records, |r| r.year, series)
}

/// Group `records` by `key` and reduce each series over the non-null values of
/// its metric. Groups come out in first-seen order; call [`sort_by_key`] for
/// chronological order. When two specs name the same metric the later wins.
pub fn aggregate_by<K>(records: &[TypedRecord], key: K, series: &[SeriesSpec]) -> Vec<AggregatedPoint>
where
    K: Fn(&TypedRecord) -> i32,
{
    let mut index: AHashMap<i32, usize> = AHashMap::new();
    let mut groups: Vec<(i32, Vec<&TypedRecord>)> = Vec::new();
    for r in records {
        let k = key(r);
        let slot = *index.entry(k).or_insert_with(|| {
            groups.push((k, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(r);
    }

    groups
        .into_iter()
        .map(|(key, members)| {
            let values: BTreeMap<Metric, Option<f64>> = series
                .iter()
                .map(|s| {
                    let reduced = s.reducer.reduce(members.iter().filter_map(|r| r.get(&s.metric)));
                    (s.metric.clone(), reduced)
                })
                .collect();
            AggregatedPoint { key, values }
        })
        .collect()
}

/// Ascending by key.
pub fn sort_by_key(mut points: Vec<AggregatedPoint>) -> Vec<AggregatedPoint> {
    points.sort_by_key(|p| p.key);
    points
}
