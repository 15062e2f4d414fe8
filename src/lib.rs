//! climate_viz
//!
//! Turns a yearly climate CSV into interactive charts. Every chart runs the
//! same pipeline, parameterised by a [`ViewConfig`]:
//!
//! parse rows -> group by year and reduce -> sort -> build scales -> lay out -> draw.
//!
//! ### Features
//! - Tolerant row parsing with per-view null policies and value bounds
//! - Mean / min / max / sum reducers over year groups
//! - Temporal, linear and band scales with round tick steps
//! - Line, bar and paired dual-axis bar charts to SVG or PNG
//! - Tooltip, zoom/pan and legend toggles as explicit state
//! - A four-view slideshow with asynchronous, stale-safe loading
//!
//! ### Example
//! ```no_run
//! use climate_viz::{ViewConfig, ViewState, ingest, pipeline, viz};
//!
//! let rows = ingest::read_rows(std::fs::File::open("climate.csv")?)?;
//! let config = ViewConfig::precipitation();
//! let state = ViewState::new(&config);
//! let model = pipeline::run(&config, &rows, state.selection);
//! let layout = viz::layout::layout_chart(&config, &model);
//! viz::render_to_file("precipitation.svg", &layout, &state, None)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod aggregate;
pub mod controller;
pub mod error;
pub mod host;
pub mod ingest;
pub mod interact;
pub mod models;
pub mod parse;
pub mod pipeline;
pub mod scale;
pub mod stats;
pub mod view;
pub mod viz;

pub use aggregate::{Reducer, SeriesSpec};
pub use controller::ViewController;
pub use error::{ConfigError, LoadError};
pub use host::{LoadStatus, MountedView, ViewHost};
pub use interact::{PointerEvent, Tooltip, Visibility, ZoomConfig, ZoomTransform};
pub use models::{AggregatedPoint, Metric, RawRow, TypedRecord};
pub use parse::ParsePolicy;
pub use view::{MarkKind, ViewConfig, ViewState};
