//! Typed errors for the loading boundary and view configuration.

use thiserror::Error;

/// Failure to obtain the raw rows of a dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("dataset has no `{0}` column")]
    MissingColumn(String),
}

/// A view configuration that cannot be rendered.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("view `{view}` has no series")]
    NoSeries { view: String },
    #[error("view `{view}`: {mark} marks need {needed} series, found {found}")]
    TooFewSeries {
        view: String,
        mark: &'static str,
        needed: usize,
        found: usize,
    },
    #[error("view `{view}`: selector `{label}` points at missing series {index}")]
    BadSelector {
        view: String,
        label: String,
        index: usize,
    },
    #[error("view `{view}`: metric `{metric}` is configured more than once")]
    DuplicateMetric { view: String, metric: String },
    #[error("view `{view}`: band padding {padding} outside [0, 1)")]
    BadPadding { view: String, padding: f64 },
    #[error("view `{view}`: zoom scale extent {min}..{max} is empty or below zero")]
    BadScaleExtent { view: String, min: f64, max: f64 },
    #[error("invalid color `{0}`, expected #rrggbb")]
    BadColor(String),
}
