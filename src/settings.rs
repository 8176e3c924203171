//! Layered settings: built-in defaults, then an optional config file, then
//! `GRAINSTAT__*` environment variables.

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{ReportError, Result};
use crate::source::{SourceMode, SqliteConnector};

pub const DEFAULT_CONFIG_FILE: &str = "grainstat.toml";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    pub database: DatabaseSettings,
    pub roster: RosterSettings,
    pub surveys: SurveySettings,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file with the roster and survey tables.
    pub path: Option<String>,
    /// SQL script priming an in-memory database, used when no path is given.
    pub seed: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RosterSettings {
    pub table: String,
    pub parent_id: Option<String>,
    pub excluded_types: Vec<String>,
    pub program_name: String,
    pub org_unit: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SurveySettings {
    pub table: String,
    /// Surveys taken before this moment score Q1, Q2 and Q4 out of 10, later ones out of 5.
    pub scoring_change: String,
    pub satisfied_threshold: f64,
    /// Decimal places kept on a fraction before it is shown as a percentage.
    /// Must be at least 2.
    pub precision: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            database: DatabaseSettings::default(),
            roster: RosterSettings::default(),
            surveys: SurveySettings::default(),
        }
    }
}
impl Default for RosterSettings {
    fn default() -> Self {
        Self {
            table: "LMI_KASPERSKY_ROSTER".into(),
            parent_id: Some("10982630".into()),
            excluded_types: vec![
                "Administrator".into(),
                "AdministratorLink".into(),
                "MasterAdministrator".into(),
            ],
            program_name: "Kaspersky".into(),
            org_unit: "CAN01".into(),
        }
    }
}
impl Default for SurveySettings {
    fn default() -> Self {
        Self {
            table: "LMI_10982630_Customer_Survey".into(),
            scoring_change: "2015-01-29 11:30:00".into(),
            satisfied_threshold: 0.85,
            precision: 4,
        }
    }
}

impl Settings {
    /// A missing file is fine, a malformed one is not.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = path.unwrap_or(DEFAULT_CONFIG_FILE);
        let settings: Settings = Config::builder()
            .add_source(File::with_name(file).required(path.is_some()))
            .add_source(Environment::with_prefix("GRAINSTAT").separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
    pub fn validate(&self) -> Result<()> {
        if self.surveys.precision < 2 {
            return Err(ReportError::Config(format!(
                "surveys.precision is {}, percentages need at least 2",
                self.surveys.precision
            )));
        }
        Ok(())
    }
    pub fn connector(&self) -> Result<SqliteConnector> {
        let mode = match &self.database.path {
            Some(path) => SourceMode::File(path.clone()),
            None => {
                let seed = match &self.database.seed {
                    Some(script) => Some(std::fs::read_to_string(script).map_err(|e| {
                        ReportError::Config(format!(
                            "could not read seed script '{}': {}",
                            script, e
                        ))
                    })?),
                    None => None,
                };
                SourceMode::InMemory { seed }
            }
        };
        Ok(SqliteConnector::new(mode))
    }
}
