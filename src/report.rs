//! Reports and the pipeline that runs them.
//!
//! One run acquires a row source, loads the roster, runs every requested
//! report against that single roster and releases everything it acquired,
//! whether or not the reports succeeded.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::attributes;
use crate::error::{ReportError, Result};
use crate::grain::{parse_timestamp, subject_grain, time_grain};
use crate::params::ReportParameters;
use crate::roster::Roster;
use crate::settings::Settings;
use crate::source::{sql_identifier, Connector, Row, RowSource};
use crate::survey::{CsatRate, CsatVolume, DsatCases, NetPromoterScore, SurveyVolume};

// ------------- Context -------------
/// Carried through a run so every log line can be correlated.
#[derive(Clone, Debug)]
pub struct RunContext {
    pub run_id: String,
}
impl RunContext {
    pub fn new() -> Self {
        Self { run_id: Uuid::new_v4().to_string() }
    }
    pub fn with_id(run_id: impl Into<String>) -> Self {
        Self { run_id: run_id.into() }
    }
}
impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Percentage,
    Count,
    None,
}

// ------------- Tally -------------
/// Row accounting for one report. Filtered rows are expected, skipped rows
/// and contract violations are not.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RowTally {
    pub seen: usize,
    pub accumulated: usize,
    pub filtered: usize,
    pub ignored: usize,
    pub skipped: usize,
    pub contract_violations: usize,
}

/// How a single row was handled.
pub enum RowOutcome {
    Accumulated,
    /// Not a roster subject.
    Filtered,
    /// Read fine but the report's policy leaves it out, e.g. a blank survey.
    Ignored,
}

impl RowTally {
    pub fn record(&mut self, index: usize, outcome: Result<RowOutcome>) {
        self.seen += 1;
        match outcome {
            Ok(RowOutcome::Accumulated) => self.accumulated += 1,
            Ok(RowOutcome::Filtered) => self.filtered += 1,
            Ok(RowOutcome::Ignored) => self.ignored += 1,
            Err(e) if e.is_contract_violation() => {
                self.contract_violations += 1;
                error!(row = index, error = %e, "contract violation while processing row");
            }
            Err(e) => {
                self.skipped += 1;
                warn!(row = index, error = %e, "skipping row");
            }
        }
    }
}

// ------------- Table -------------
#[derive(Clone, Debug, Serialize)]
pub struct ReportTable {
    pub report: String,
    pub units: Units,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub tally: RowTally,
}

// ------------- Report -------------
/// Everything a report may touch while it runs.
pub struct ReportInput<'a> {
    pub source: &'a mut dyn RowSource,
    pub roster: Arc<Roster>,
    pub params: &'a ReportParameters,
    pub settings: &'a Settings,
}

pub trait Report {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn units(&self) -> Units;
    fn schema(&self, params: &ReportParameters) -> Vec<String>;
    /// Rows in the order they should be rendered.
    fn run(&self, input: &mut ReportInput<'_>) -> Result<(Vec<Row>, RowTally)>;
}

/// The first column of a metric report.
pub fn grain_column(params: &ReportParameters) -> String {
    if params.is_stack() { "User Grain".into() } else { "Date Grain".into() }
}

/// The bucket a row lands in: its time grain for trend reports, otherwise the
/// chosen attribute of the subject it belongs to.
pub fn resolve_grain(
    params: &ReportParameters,
    roster: &Roster,
    timestamp: &str,
    subject_id: &str,
) -> Result<String> {
    if params.is_time_trend() {
        let timestamp = parse_timestamp(timestamp)?;
        Ok(time_grain(&timestamp, params.time_grain, params.date_format))
    } else {
        let subject = roster
            .get_user(subject_id)
            .ok_or_else(|| ReportError::UnknownSubject(subject_id.to_owned()))?;
        subject_grain(params.user_grain, subject)
    }
}

pub fn log_statistics(source: &dyn RowSource) {
    for (query, statistics) in source.statistics() {
        info!("Query {}: {}", query, statistics);
    }
}

// ------------- Roster listing -------------
pub struct RosterListing;

impl Report for RosterListing {
    fn name(&self) -> &'static str { "Roster" }
    fn description(&self) -> &'static str { "A list of users in the roster." }
    fn units(&self) -> Units { Units::None }
    fn schema(&self, _params: &ReportParameters) -> Vec<String> {
        ["Node ID", "Parent ID", "Team", "Name", "Email", "Description", "Status", "Type"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }
    fn run(&self, input: &mut ReportInput<'_>) -> Result<(Vec<Row>, RowTally)> {
        const COLUMNS: [&str; 8] = [
            attributes::NODE_ID,
            attributes::PARENT_ID,
            attributes::TEAM_NAME,
            attributes::NAME,
            attributes::EMAIL,
            attributes::DESCRIPTION,
            attributes::STATUS,
            attributes::TYPE,
        ];
        let roster = Arc::clone(&input.roster);
        let mut rows = Vec::new();
        let mut tally = RowTally::default();
        for (index, id) in roster.user_ids().enumerate() {
            let outcome = roster
                .get_user(id)
                .ok_or_else(|| ReportError::UnknownSubject(id.to_owned()))
                .and_then(|subject| {
                    COLUMNS
                        .iter()
                        .map(|attribute| subject.first_text(attribute))
                        .collect::<Result<Row>>()
                })
                .map(|row| {
                    rows.push(row);
                    RowOutcome::Accumulated
                });
            tally.record(index, outcome);
        }
        Ok((rows, tally))
    }
}

// ------------- Teams -------------
pub struct Teams;

impl Report for Teams {
    fn name(&self) -> &'static str { "Teams" }
    fn description(&self) -> &'static str { "A list of teams in the roster." }
    fn units(&self) -> Units { Units::None }
    fn schema(&self, _params: &ReportParameters) -> Vec<String> {
        vec!["Team".into()]
    }
    fn run(&self, input: &mut ReportInput<'_>) -> Result<(Vec<Row>, RowTally)> {
        let settings = input.roster.settings();
        let table = sql_identifier(&settings.table)?;
        let (query, params) = match &settings.parent_id {
            Some(parent_id) => (
                format!("SELECT DISTINCT TEAM FROM {} WHERE PARENT_ID = ?1", table),
                vec![parent_id.as_str()],
            ),
            None => (format!("SELECT DISTINCT TEAM FROM {}", table), Vec::new()),
        };
        let rows = input.source.run_query(&query, &params)?;
        log_statistics(&*input.source);
        let tally = RowTally { seen: rows.len(), accumulated: rows.len(), ..RowTally::default() };
        Ok((rows, tally))
    }
}

// ------------- Registry -------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    Roster,
    Teams,
    CsatRate,
    CsatVolume,
    DsatCases,
    SurveyVolume,
    NetPromoterScore,
}

impl ReportKind {
    pub const ALL: [ReportKind; 7] = [
        ReportKind::Roster,
        ReportKind::Teams,
        ReportKind::CsatRate,
        ReportKind::CsatVolume,
        ReportKind::DsatCases,
        ReportKind::SurveyVolume,
        ReportKind::NetPromoterScore,
    ];
    pub fn key(&self) -> &'static str {
        match self {
            ReportKind::Roster => "roster",
            ReportKind::Teams => "teams",
            ReportKind::CsatRate => "csat-rate",
            ReportKind::CsatVolume => "csat-volume",
            ReportKind::DsatCases => "dsat-cases",
            ReportKind::SurveyVolume => "survey-volume",
            ReportKind::NetPromoterScore => "nps",
        }
    }
    pub fn report(&self) -> Box<dyn Report> {
        match self {
            ReportKind::Roster => Box::new(RosterListing),
            ReportKind::Teams => Box::new(Teams),
            ReportKind::CsatRate => Box::new(CsatRate),
            ReportKind::CsatVolume => Box::new(CsatVolume),
            ReportKind::DsatCases => Box::new(DsatCases),
            ReportKind::SurveyVolume => Box::new(SurveyVolume),
            ReportKind::NetPromoterScore => Box::new(NetPromoterScore),
        }
    }
}
impl FromStr for ReportKind {
    type Err = ReportError;
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.key() == key)
            .ok_or_else(|| ReportError::Parameter {
                name: "report".into(),
                message: format!("unknown report '{}'", s),
            })
    }
}
impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ------------- Runner -------------
pub struct ReportRunner<'a> {
    connector: &'a dyn Connector,
    settings: &'a Settings,
}

impl<'a> ReportRunner<'a> {
    pub fn new(connector: &'a dyn Connector, settings: &'a Settings) -> Self {
        Self { connector, settings }
    }

    /// Loads a roster for the parameters. Callers share the result with every
    /// report that filters on the same parameters.
    pub fn load_roster(&self, params: &ReportParameters) -> Result<Arc<Roster>> {
        let mut roster = Roster::new(self.settings.roster.clone());
        roster.load(self.connector, &params.filter)?;
        Ok(Arc::new(roster))
    }

    pub fn run(
        &self,
        report: &dyn Report,
        params: &ReportParameters,
        context: &RunContext,
    ) -> Result<ReportTable> {
        self.run_all(&[report], params, context)?
            .pop()
            .ok_or_else(|| ReportError::Source(format!("{} produced no table", report.name())))
    }

    /// Runs several reports against one source and one roster. The first
    /// failing report aborts the run.
    pub fn run_all(
        &self,
        reports: &[&dyn Report],
        params: &ReportParameters,
        context: &RunContext,
    ) -> Result<Vec<ReportTable>> {
        let span = info_span!("run", run_id = %context.run_id);
        let _guard = span.enter();
        params.validate()?;

        let mut source = self.connector.connect().map_err(|e| {
            error!(error = %e, "could not acquire the report source");
            ReportError::setup("could not acquire the report source", e)
        })?;
        let result = self
            .load_roster(params)
            .map_err(|e| match e {
                ReportError::Setup { .. } => e,
                other => ReportError::setup("could not load the roster", other),
            })
            .and_then(|roster| self.run_with_roster(source.as_mut(), roster, reports, params, context));
        source.close();
        if let Err(e) = &result {
            error!(error = %e.chain(), "run failed");
        }
        result
    }

    /// For reports running under a parent that already holds a loaded roster.
    pub fn run_with_roster(
        &self,
        source: &mut dyn RowSource,
        roster: Arc<Roster>,
        reports: &[&dyn Report],
        params: &ReportParameters,
        context: &RunContext,
    ) -> Result<Vec<ReportTable>> {
        let mut tables = Vec::new();
        for report in reports {
            let span = info_span!("report", run_id = %context.run_id, report = report.name());
            let _guard = span.enter();
            let mut input = ReportInput {
                source: &mut *source,
                roster: Arc::clone(&roster),
                params,
                settings: self.settings,
            };
            let (rows, tally) = report
                .run(&mut input)
                .map_err(|e| ReportError::run(format!("Error running {}", report.name()), e))?;
            info!(
                rows = rows.len(),
                seen = tally.seen,
                filtered = tally.filtered,
                ignored = tally.ignored,
                skipped = tally.skipped,
                contract_violations = tally.contract_violations,
                "report complete"
            );
            tables.push(ReportTable {
                report: report.name().to_owned(),
                units: report.units(),
                columns: report.schema(params),
                rows,
                tally,
            });
        }
        Ok(tables)
    }
}
