//! Data sources for the grid
//!
//! A source produces the full ordered set of rows once, at load time.
//! The grid never re-fetches to sort or filter.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use csv::ReaderBuilder;
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::data::datatable::{CellValue, Row};

/// Anything that can asynchronously produce the grid's rows
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch every row
    async fn fetch(&self) -> Result<Vec<Row>>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Convert a JSON document into rows
///
/// Accepts a top-level array of objects, or an object with the array
/// under `data`. Array entries that aren't objects are skipped.
pub fn rows_from_json(document: &JsonValue) -> Result<Vec<Row>> {
    let records = match document {
        JsonValue::Array(items) => items,
        JsonValue::Object(obj) => obj
            .get("data")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| anyhow!("JSON object has no `data` array"))?,
        other => return Err(anyhow!("Expected a JSON array of records, got {}", kind_of(other))),
    };

    let mut rows = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        match Row::from_json(record) {
            Some(row) => rows.push(row),
            None => warn!(target: "data_source", "Skipping record {} (not an object)", idx),
        }
    }
    Ok(rows)
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Rows served as JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpJsonSource {
    url: String,
    client: reqwest::Client,
}

impl HttpJsonSource {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl DataSource for HttpJsonSource {
    async fn fetch(&self) -> Result<Vec<Row>> {
        debug!(target: "data_source", "GET {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to fetch rows from {}: HTTP {}",
                self.url,
                response.status()
            ));
        }

        let document: JsonValue = response
            .json()
            .await
            .with_context(|| format!("Response from {} is not JSON", self.url))?;
        rows_from_json(&document)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Rows read from a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for JsonFileSource {
    async fn fetch(&self) -> Result<Vec<Row>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read JSON file: {:?}", self.path))?;
        let document: JsonValue = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON file: {:?}", self.path))?;
        rows_from_json(&document)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Rows read from a CSV file with a header line
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Parse CSV text; cell types are inferred per value
pub fn rows_from_csv(contents: &str) -> Result<Vec<Row>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(contents.as_bytes());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(header, cell)| (header, CellValue::infer_from_string(cell)))
                .collect(),
        );
    }
    Ok(rows)
}

#[async_trait]
impl DataSource for CsvFileSource {
    async fn fetch(&self) -> Result<Vec<Row>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to open CSV file: {:?}", self.path))?;
        rows_from_csv(&contents).with_context(|| format!("Failed to parse CSV file: {:?}", self.path))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Rows already in memory
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    rows: Vec<Row>,
}

impl StaticSource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl DataSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<Row>> {
        Ok(self.rows.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory rows", self.rows.len())
    }
}

/// Pick a file source by extension; anything not `.csv` is read as JSON
pub fn file_source(path: impl Into<PathBuf>) -> Box<dyn DataSource> {
    let path = path.into();
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Box::new(CsvFileSource::new(path))
    } else {
        Box::new(JsonFileSource::new(path))
    }
}
