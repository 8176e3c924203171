use std::error::Error as StdError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Row source error: {0}")]
    Source(String),
    #[error("Setup failed: {message}")]
    Setup {
        message: String,
        #[source]
        cause: Box<ReportError>,
    },
    #[error("Report failed: {message}")]
    Run {
        message: String,
        #[source]
        cause: Box<ReportError>,
    },
    #[error("Attribute '{attribute}' was never declared on '{datum}'")]
    UndeclaredAttribute { datum: String, attribute: String },
    #[error("No value present for attribute '{attribute}' on '{datum}'")]
    NoValue { datum: String, attribute: String },
    #[error("Parse error: {message}")]
    Parse { message: String, column: Option<usize> },
    #[error("Malformed row {row}: {message}")]
    MalformedRow { row: usize, message: String },
    #[error("Unknown subject: {0}")]
    UnknownSubject(String),
    #[error("Invalid parameter '{name}': {message}")]
    Parameter { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, ReportError>;

impl ReportError {
    pub fn setup(message: impl Into<String>, cause: ReportError) -> Self {
        Self::Setup { message: message.into(), cause: Box::new(cause) }
    }
    pub fn run(message: impl Into<String>, cause: ReportError) -> Self {
        Self::Run { message: message.into(), cause: Box::new(cause) }
    }
    pub fn parse(message: impl Into<String>, column: Option<usize>) -> Self {
        Self::Parse { message: message.into(), column }
    }
    /// Programmer errors, as opposed to bad data in a row.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::UndeclaredAttribute { .. })
    }
    /// The message followed by every underlying cause, outermost first.
    pub fn chain(&self) -> String {
        let mut text = self.to_string();
        let mut cause = self.source();
        while let Some(inner) = cause {
            text.push_str(": ");
            text.push_str(&inner.to_string());
            cause = inner.source();
        }
        text
    }
}

// Helper conversions
impl From<rusqlite::Error> for ReportError {
    fn from(e: rusqlite::Error) -> Self { Self::Source(e.to_string()) }
}
impl From<config::ConfigError> for ReportError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
