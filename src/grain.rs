//! Grain resolution: turning a row into the label of the bucket it belongs to.
//!
//! A *time grain* truncates a timestamp to a granularity and renders it in one
//! of a few display formats. A *subject grain* reads one attribute off the
//! roster entry the row belongs to. Both are pure functions.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::attributes;
use crate::datum::Datum;
use crate::error::{ReportError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGrain {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    Iso,
    Compact,
    Long,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectGrain {
    Id,
    Name,
    Team,
    Program,
    OrgUnit,
}

impl SubjectGrain {
    pub fn attribute(&self) -> &'static str {
        match self {
            SubjectGrain::Id => attributes::NODE_ID,
            SubjectGrain::Name => attributes::NAME,
            SubjectGrain::Team => attributes::TEAM_NAME,
            SubjectGrain::Program => attributes::PROGRAM_NAME,
            SubjectGrain::OrgUnit => attributes::ORG_UNIT,
        }
    }
}

pub fn time_grain(timestamp: &NaiveDateTime, grain: TimeGrain, format: DateFormat) -> String {
    let date = timestamp.date();
    match grain {
        TimeGrain::Day => match format {
            DateFormat::Iso => date.format("%Y-%m-%d").to_string(),
            DateFormat::Compact => date.format("%Y%m%d").to_string(),
            DateFormat::Long => date.format("%B %-d, %Y").to_string(),
        },
        TimeGrain::Week => {
            // ISO weeks belong to the ISO year, which may differ from the calendar year
            let week = date.iso_week();
            match format {
                DateFormat::Iso => format!("{}-W{:02}", week.year(), week.week()),
                DateFormat::Compact => format!("{}W{:02}", week.year(), week.week()),
                DateFormat::Long => format!("Week {}, {}", week.week(), week.year()),
            }
        }
        TimeGrain::Month => match format {
            DateFormat::Iso => date.format("%Y-%m").to_string(),
            DateFormat::Compact => date.format("%Y%m").to_string(),
            DateFormat::Long => date.format("%B %Y").to_string(),
        },
        TimeGrain::Quarter => {
            let quarter = date.month0() / 3 + 1;
            match format {
                DateFormat::Iso => format!("{}-Q{}", date.year(), quarter),
                DateFormat::Compact => format!("{}Q{}", date.year(), quarter),
                DateFormat::Long => format!("Q{} {}", quarter, date.year()),
            }
        }
        TimeGrain::Year => date.year().to_string(),
    }
}

/// Fails when the subject never had the attribute populated.
pub fn subject_grain(grain: SubjectGrain, subject: &Datum) -> Result<String> {
    subject.first_text(grain.attribute())
}

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parses the timestamp text a row source hands back.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(timestamp);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ReportError::parse(format!("'{}' is not a timestamp", text), None))
}

// ------------- Names -------------
fn unknown(kind: &str, value: &str) -> ReportError {
    ReportError::Parameter {
        name: kind.to_owned(),
        message: format!("unknown value '{}'", value),
    }
}

impl FromStr for TimeGrain {
    type Err = ReportError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(TimeGrain::Day),
            "week" => Ok(TimeGrain::Week),
            "month" => Ok(TimeGrain::Month),
            "quarter" => Ok(TimeGrain::Quarter),
            "year" => Ok(TimeGrain::Year),
            _ => Err(unknown("time grain", s)),
        }
    }
}
impl FromStr for DateFormat {
    type Err = ReportError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "iso" => Ok(DateFormat::Iso),
            "compact" => Ok(DateFormat::Compact),
            "long" => Ok(DateFormat::Long),
            _ => Err(unknown("date format", s)),
        }
    }
}
impl FromStr for SubjectGrain {
    type Err = ReportError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "id" => Ok(SubjectGrain::Id),
            "name" => Ok(SubjectGrain::Name),
            "team" => Ok(SubjectGrain::Team),
            "program" => Ok(SubjectGrain::Program),
            "orgunit" | "org-unit" => Ok(SubjectGrain::OrgUnit),
            _ => Err(unknown("user grain", s)),
        }
    }
}

impl fmt::Display for TimeGrain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TimeGrain::Day => "day",
            TimeGrain::Week => "week",
            TimeGrain::Month => "month",
            TimeGrain::Quarter => "quarter",
            TimeGrain::Year => "year",
        };
        write!(f, "{}", name)
    }
}
impl fmt::Display for SubjectGrain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SubjectGrain::Id => "id",
            SubjectGrain::Name => "name",
            SubjectGrain::Team => "team",
            SubjectGrain::Program => "program",
            SubjectGrain::OrgUnit => "orgunit",
        };
        write!(f, "{}", name)
    }
}
