use crate::models::{Metric, TypedRecord};
use serde::{Deserialize, Serialize};

/// Summary statistics for one metric across all parsed records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub metric: Metric,
    pub count: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Compute one summary per metric, in the order given.
pub fn summarize(records: &[TypedRecord], metrics: &[Metric]) -> Vec<Summary> {
    metrics
        .iter()
        .map(|metric| {
            let mut vals: Vec<f64> = records.iter().filter_map(|r| r.get(metric)).collect();
            let missing = records.len() - vals.len();
            vals.sort_by(f64::total_cmp);
            let count = vals.len();
            let min = vals.first().copied();
            let max = vals.last().copied();
            let mean = if count > 0 {
                Some(vals.iter().sum::<f64>() / count as f64)
            } else {
                None
            };
            let median = if count == 0 {
                None
            } else if count % 2 == 1 {
                Some(vals[count / 2])
            } else {
                Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
            };
            Summary {
                metric: metric.clone(),
                count,
                missing,
                min,
                max,
                mean,
                median,
            }
        })
        .collect()
}
