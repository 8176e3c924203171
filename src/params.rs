use std::collections::HashSet;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::attributes;
use crate::datum::{Datum, Value};
use crate::error::{ReportError, Result};
use crate::grain::{DateFormat, SubjectGrain, TimeGrain};

lazy_static! {
    // names are separated by semicolons or commas, whitespace around them is noise
    static ref LIST_SEPARATOR: Regex = Regex::new(r"\s*[;,]\s*").unwrap();
}

/// Splits a delimited list of names, dropping empty entries.
pub fn split_list(text: &str) -> Vec<String> {
    LIST_SEPARATOR
        .split(text.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

// ------------- Roster filter -------------
/// Which subjects make it into the roster.
#[derive(Clone, Debug, Default)]
pub struct RosterFilter {
    pub agent_names: HashSet<String>,
    pub team_names: HashSet<String>,
    pub include_all: bool,
}

impl RosterFilter {
    pub fn everyone() -> Self {
        Self { include_all: true, ..Self::default() }
    }
    pub fn agents<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { agent_names: names.into_iter().map(Into::into).collect(), ..Self::default() }
    }
    pub fn teams<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { team_names: names.into_iter().map(Into::into).collect(), ..Self::default() }
    }
    /// Builds a filter from delimited name lists. With neither list given
    /// everyone is included.
    pub fn from_lists(agents: Option<&str>, teams: Option<&str>, include_all: bool) -> Self {
        Self {
            agent_names: agents.map(split_list).unwrap_or_default().into_iter().collect(),
            team_names: teams.map(split_list).unwrap_or_default().into_iter().collect(),
            include_all: include_all || (agents.is_none() && teams.is_none()),
        }
    }
    /// Allow-listed by name or by team, or everyone when the override is set.
    pub fn admits(&self, subject: &Datum) -> bool {
        if self.include_all {
            return true;
        }
        let listed = |attribute: &str, names: &HashSet<String>| {
            subject
                .values(attribute)
                .first()
                .and_then(Value::as_text)
                .is_some_and(|name| names.contains(name))
        };
        listed(attributes::NAME, &self.agent_names) || listed(attributes::TEAM_NAME, &self.team_names)
    }
}

// ------------- Report parameters -------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportType {
    /// One row per time grain, in the order the grains were first seen.
    TimeTrend,
    /// One row per subject grain.
    Stack,
}

#[derive(Clone, Debug)]
pub struct ReportParameters {
    pub filter: RosterFilter,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub report_type: ReportType,
    pub time_grain: TimeGrain,
    pub date_format: DateFormat,
    pub user_grain: SubjectGrain,
}

impl ReportParameters {
    pub fn new(filter: RosterFilter, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            filter,
            start_date,
            end_date,
            report_type: ReportType::TimeTrend,
            time_grain: TimeGrain::Month,
            date_format: DateFormat::Iso,
            user_grain: SubjectGrain::Name,
        }
    }
    pub fn is_time_trend(&self) -> bool {
        self.report_type == ReportType::TimeTrend
    }
    pub fn is_stack(&self) -> bool {
        self.report_type == ReportType::Stack
    }
    pub fn validate(&self) -> Result<()> {
        if self.end_date <= self.start_date {
            return Err(ReportError::Parameter {
                name: "end date".into(),
                message: format!("{} is not after {}", self.end_date, self.start_date),
            });
        }
        Ok(())
    }
    /// Bounds as the text the survey queries compare against.
    pub fn date_bounds(&self) -> (String, String) {
        (
            self.start_date.format("%Y-%m-%d").to_string(),
            self.end_date.format("%Y-%m-%d").to_string(),
        )
    }
}

pub fn parse_date(name: &str, text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|e| ReportError::Parameter {
        name: name.to_owned(),
        message: format!("'{}' is not a YYYY-MM-DD date: {}", text, e),
    })
}
