//! Fetch-and-parse boundary: turn a delimited file into [`RawRow`]s.
//!
//! The pipeline only sees the resulting rows; where they came from (a local file,
//! an HTTP endpoint, an embedded fixture) is hidden behind [`DataSource`].
//!
//! ```no_run
//! use climate_viz::ingest::{DataSource, open_source};
//!
//! let source = open_source("climate_change_dataset.csv");
//! let rows = source.fetch()?;
//! println!("{} rows from {}", rows.len(), source.describe());
//! # Ok::<(), climate_viz::error::LoadError>(())
//! ```

use crate::error::LoadError;
use crate::models::{RawRow, YEAR_COLUMN};
use csv::ReaderBuilder;
use reqwest::blocking::Client as HttpClient;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Anything that can deliver the rows of the climate dataset.
pub trait DataSource: Send + Sync {
    /// Human readable origin, used in log lines.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Vec<RawRow>, LoadError>;
}

/// CSV file on the local filesystem.
#[derive(Debug, Clone)]
pub struct CsvFile {
    pub path: PathBuf,
}

impl CsvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for CsvFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<RawRow>, LoadError> {
        let file = File::open(&self.path)?;
        read_rows(file)
    }
}

/// CSV held in memory (fixtures, bundled samples).
#[derive(Debug, Clone)]
pub struct CsvText {
    pub name: String,
    pub text: String,
}

impl CsvText {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

impl DataSource for CsvText {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn fetch(&self) -> Result<Vec<RawRow>, LoadError> {
        read_rows(self.text.as_bytes())
    }
}

/// CSV served over HTTP(S). Blocking; meant to run on a loader thread.
#[derive(Debug, Clone)]
pub struct HttpCsv {
    pub url: String,
    pub timeout: Duration,
}

impl HttpCsv {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl DataSource for HttpCsv {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<Vec<RawRow>, LoadError> {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(concat!("climate-viz/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let resp = http.get(&self.url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        let body = resp.bytes()?;
        read_rows(body.as_ref())
    }
}

/// Pick a source from a user supplied location: URLs go over HTTP, everything
/// else is treated as a file path.
pub fn open_source(location: &str) -> Arc<dyn DataSource> {
    let lower = location.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Arc::new(HttpCsv::new(location))
    } else {
        Arc::new(CsvFile::new(location))
    }
}

/// Read a headed CSV into rows. Short rows simply lack the trailing columns;
/// a file without a `Year` header is rejected.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, LoadError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    if !headers.iter().any(|h| h.trim() == YEAR_COLUMN) {
        return Err(LoadError::MissingColumn(YEAR_COLUMN.to_string()));
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.trim().to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_rows_lack_trailing_columns() {
        let text = "Year,Country,Avg_Temp (°C)\n2001,Peru,12.5\n2002,Chile\n";
        let rows = read_rows(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Avg_Temp (°C)").map(String::as_str), Some("12.5"));
        assert!(rows[1].get("Avg_Temp (°C)").is_none());
    }

    #[test]
    fn missing_year_header_is_rejected() {
        let err = read_rows("Country,Temp\nPeru,3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "Year"));
    }

    #[test]
    fn urls_and_paths_pick_different_sources() {
        assert_eq!(open_source("https://x.test/a.csv").describe(), "https://x.test/a.csv");
        assert_eq!(open_source("data/a.csv").describe(), "data/a.csv");
    }
}
