// used for the row sources
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::time::Instant;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::{ReportError, Result};

pub type Row = Vec<String>;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Table names come from configuration and cannot be bound as parameters, so
/// only plain identifiers are let through.
pub fn sql_identifier(name: &str) -> Result<&str> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(ReportError::Config(format!("'{}' is not a plain SQL identifier", name)))
    }
}

/// Anything that can answer a query with rows of text.
pub trait RowSource {
    fn run_query(&mut self, query: &str, params: &[&str]) -> Result<Vec<Row>>;
    /// Query text paired with what happened when it ran, for the log.
    fn statistics(&self) -> Vec<(String, String)>;
    fn close(&mut self);
}

/// Acquires row sources. Acquisition is where setup failures surface.
pub trait Connector {
    fn connect(&self) -> Result<Box<dyn RowSource>>;
}

// ------------- SQLite -------------
#[derive(Clone, Debug)]
pub enum SourceMode {
    /// A fresh in-memory database per connection, primed with an optional SQL script.
    InMemory { seed: Option<String> },
    /// An existing database file, opened read-only.
    File(String),
}

#[derive(Clone, Debug)]
pub struct SqliteConnector {
    mode: SourceMode,
}
impl SqliteConnector {
    pub fn new(mode: SourceMode) -> Self {
        Self { mode }
    }
    pub fn in_memory(seed: impl Into<String>) -> Self {
        Self::new(SourceMode::InMemory { seed: Some(seed.into()) })
    }
}
impl Connector for SqliteConnector {
    fn connect(&self) -> Result<Box<dyn RowSource>> {
        let connection = match &self.mode {
            SourceMode::InMemory { seed } => {
                let connection = Connection::open_in_memory()?;
                if let Some(script) = seed {
                    connection.execute_batch(script)?;
                }
                connection
            }
            SourceMode::File(path) => Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?,
        };
        Ok(Box::new(SqliteSource::new(connection)))
    }
}

pub struct SqliteSource {
    connection: Option<Connection>,
    statistics: Vec<(String, String)>,
}
impl SqliteSource {
    pub fn new(connection: Connection) -> Self {
        Self { connection: Some(connection), statistics: Vec::new() }
    }
}
impl RowSource for SqliteSource {
    fn run_query(&mut self, query: &str, params: &[&str]) -> Result<Vec<Row>> {
        let connection = self
            .connection
            .as_ref()
            .ok_or_else(|| ReportError::Source("the connection is closed".into()))?;
        let started = Instant::now();
        let mut statement = connection.prepare(query)?;
        let width = statement.column_count();
        let mut rows = statement.query(params_from_iter(params.iter()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut fields = Vec::with_capacity(width);
            for i in 0..width {
                fields.push(text_of(row.get_ref(i)?));
            }
            result.push(fields);
        }
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(rows = result.len(), ms = elapsed_ms, "query complete");
        self.statistics.push((
            query.to_owned(),
            format!("{} rows in {:.3} ms", result.len(), elapsed_ms),
        ));
        Ok(result)
    }
    fn statistics(&self) -> Vec<(String, String)> {
        self.statistics.clone()
    }
    fn close(&mut self) {
        // dropping the connection closes it
        self.connection.take();
    }
}

// NULL becomes the empty string, the way blank answers arrive
fn text_of(value: ValueRef) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(r) => r.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

// ------------- Static -------------
/// Serves the same rows for every query.
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    rows: Vec<Row>,
    statistics: Vec<(String, String)>,
    closed: bool,
}
impl StaticSource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows, statistics: Vec::new(), closed: false }
    }
    pub fn from_strs(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|field| field.to_string()).collect())
                .collect(),
        )
    }
}
impl RowSource for StaticSource {
    fn run_query(&mut self, query: &str, _params: &[&str]) -> Result<Vec<Row>> {
        if self.closed {
            return Err(ReportError::Source("the source is closed".into()));
        }
        self.statistics.push((query.to_owned(), format!("{} rows", self.rows.len())));
        Ok(self.rows.clone())
    }
    fn statistics(&self) -> Vec<(String, String)> {
        self.statistics.clone()
    }
    fn close(&mut self) {
        self.closed = true;
    }
}
impl Connector for StaticSource {
    fn connect(&self) -> Result<Box<dyn RowSource>> {
        Ok(Box::new(StaticSource::new(self.rows.clone())))
    }
}
