//! The roster: subjects eligible for reporting in a run.
//!
//! A roster is loaded once from its own row source, deduplicated by subject id
//! (first row wins) and narrowed by a [`RosterFilter`]. After `load` returns it
//! is only read, so dependent reports share it through an `Arc`.

use std::collections::HashMap;

use tracing::{error, info, warn};

use crate::attributes;
use crate::datum::{Datum, NameHasher};
use crate::error::{ReportError, Result};
use crate::params::RosterFilter;
use crate::settings::RosterSettings;
use crate::source::{sql_identifier, Connector, RowSource};

const ROSTER_COLUMNS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RosterState {
    Empty,
    Loading,
    Loaded,
}

/// What happened to the rows of one load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub added: usize,
    pub duplicates: usize,
    pub filtered: usize,
    pub skipped: usize,
}

enum Admission {
    Added,
    Duplicate,
    Filtered,
}

pub struct Roster {
    settings: RosterSettings,
    source: Option<Box<dyn RowSource>>,
    subjects: HashMap<String, Datum, NameHasher>,
    order: Vec<String>,
    state: RosterState,
}

impl Roster {
    pub fn new(settings: RosterSettings) -> Self {
        Self {
            settings,
            source: None,
            subjects: HashMap::default(),
            order: Vec::new(),
            state: RosterState::Empty,
        }
    }
    pub fn state(&self) -> RosterState {
        self.state
    }
    pub fn settings(&self) -> &RosterSettings {
        &self.settings
    }
    fn clear(&mut self) {
        self.subjects.clear();
        self.order.clear();
        self.state = RosterState::Empty;
    }
    /// The roster query and its parameters.
    pub fn query(&self) -> Result<(String, Vec<String>)> {
        let mut query = format!(
            "SELECT NODE_ID, PARENT_ID, TEAM, NAME, EMAIL, DESCRIPTION, STATUS, TYPE FROM {}",
            sql_identifier(&self.settings.table)?
        );
        let mut params = Vec::new();
        let mut conditions = Vec::new();
        if let Some(parent_id) = &self.settings.parent_id {
            params.push(parent_id.clone());
            conditions.push(format!("PARENT_ID = ?{}", params.len()));
        }
        if !self.settings.excluded_types.is_empty() {
            let mut placeholders = Vec::new();
            for excluded in &self.settings.excluded_types {
                params.push(excluded.clone());
                placeholders.push(format!("?{}", params.len()));
            }
            conditions.push(format!("TYPE NOT IN ({})", placeholders.join(", ")));
        }
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        Ok((query, params))
    }

    pub fn load(&mut self, connector: &dyn Connector, filter: &RosterFilter) -> Result<LoadSummary> {
        info!("Loading roster");
        self.clear();
        let (query, params) = self.query()?;
        // every load reads from the connector it is given
        self.close();
        let source = connector.connect().map_err(|e| {
            error!(error = %e, "could not acquire the roster source");
            ReportError::setup("could not acquire the roster source", e)
        })?;
        self.source = Some(source);
        self.state = RosterState::Loading;
        let params: Vec<&str> = params.iter().map(String::as_str).collect();
        let rows = match self.source.as_mut() {
            Some(source) => source.run_query(&query, &params),
            None => Err(ReportError::Source("the roster source is closed".into())),
        };
        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                self.state = RosterState::Empty;
                error!(error = %e, "roster query failed");
                return Err(e);
            }
        };

        let mut summary = LoadSummary::default();
        for (index, row) in rows.iter().enumerate() {
            match self.admit(index, row, filter) {
                Ok(Admission::Added) => summary.added += 1,
                Ok(Admission::Duplicate) => summary.duplicates += 1,
                Ok(Admission::Filtered) => summary.filtered += 1,
                Err(e) => {
                    summary.skipped += 1;
                    let first = row.first().map(String::as_str).unwrap_or("");
                    if e.is_contract_violation() {
                        error!(row = index, error = %e, "Error adding user for line beginning with {}", first);
                    } else {
                        warn!(row = index, error = %e, "Error adding user for line beginning with {}", first);
                    }
                }
            }
        }
        if let Some(source) = &self.source {
            for (query, statistics) in source.statistics() {
                info!("Query: {} => {}", query, statistics);
            }
        }
        info!(
            duplicates = summary.duplicates,
            filtered = summary.filtered,
            skipped = summary.skipped,
            "Loaded {} users into roster",
            self.len()
        );
        self.state = RosterState::Loaded;
        Ok(summary)
    }

    fn admit(&mut self, index: usize, row: &[String], filter: &RosterFilter) -> Result<Admission> {
        if row.len() < ROSTER_COLUMNS {
            return Err(ReportError::MalformedRow {
                row: index,
                message: format!("expected {} columns, found {}", ROSTER_COLUMNS, row.len()),
            });
        }
        let field = |i: usize| row[i].trim();
        let node_id = field(0);
        if node_id.is_empty() {
            return Err(ReportError::MalformedRow { row: index, message: "blank node id".into() });
        }
        if self.has_user(node_id) {
            return Ok(Admission::Duplicate);
        }

        let mut subject = Datum::new(node_id);
        for attribute in attributes::SUBJECT_ATTRIBUTES {
            subject.declare_attribute(attribute);
        }
        subject.set_unique(attributes::NODE_ID);

        subject.add_value(attributes::NODE_ID, node_id)?;
        subject.add_value(attributes::PARENT_ID, field(1))?;
        subject.add_value(attributes::TEAM_NAME, field(2))?;
        subject.add_value(attributes::NAME, field(3))?;
        subject.add_value(attributes::EMAIL, field(4))?;
        subject.add_value(attributes::DESCRIPTION, field(5))?;
        subject.add_value(attributes::STATUS, field(6))?;
        subject.add_value(attributes::TYPE, field(7))?;
        subject.add_value(attributes::FULL_NAME, field(3))?;
        subject.add_value(attributes::PROGRAM_NAME, self.settings.program_name.as_str())?;
        subject.add_value(attributes::ORG_UNIT, self.settings.org_unit.as_str())?;

        if !filter.admits(&subject) {
            return Ok(Admission::Filtered);
        }
        self.order.push(node_id.to_owned());
        self.subjects.insert(node_id.to_owned(), subject);
        Ok(Admission::Added)
    }

    pub fn has_user(&self, id: &str) -> bool {
        self.subjects.contains_key(id)
    }
    pub fn get_user(&self, id: &str) -> Option<&Datum> {
        self.subjects.get(id)
    }
    pub fn user_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
    pub fn full_name(&self, id: &str) -> Option<String> {
        let name = self
            .get_user(id)
            .and_then(|subject| subject.first_text(attributes::NAME).ok());
        if name.is_none() {
            error!("Could not determine full name for parameter: {}", id);
        }
        name
    }
    /// True when the status reads "disabled", ignoring case. The name suggests
    /// the opposite; kept as the reports have always behaved until the owners
    /// confirm which one they meant.
    pub fn is_active(&self, id: &str) -> bool {
        self.get_user(id)
            .and_then(|subject| subject.values(attributes::STATUS).first())
            .is_some_and(|status| status.to_string().eq_ignore_ascii_case("disabled"))
    }
    pub fn len(&self) -> usize {
        self.order.len()
    }
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
    /// Releases the row source. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close();
            info!("Roster source closed");
        }
    }
}

impl Drop for Roster {
    fn drop(&mut self) {
        self.close();
    }
}
