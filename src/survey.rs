//! Customer survey reports.
//!
//! Every report here reads the survey table for the requested date range,
//! drops rows whose technician is not on the roster, and then applies its own
//! blank-survey policy before bucketing:
//! * CSAT rate, CSAT volume and DSAT cases leave out surveys with no answers.
//! * Net promoter score only looks at Q3 and leaves out rows where it is blank.
//! * Survey volume counts every row.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::aggregation::Aggregation;
use crate::attributes;
use crate::error::{ReportError, Result};
use crate::grain::{parse_timestamp, time_grain, TimeGrain};
use crate::params::ReportParameters;
use crate::report::{
    grain_column, log_statistics, resolve_grain, Report, ReportInput, RowOutcome, RowTally, Units,
};
use crate::roster::Roster;
use crate::source::{sql_identifier, Row};
use crate::stats;

// ------------- Scoring -------------
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurveyScore {
    pub points: u32,
    pub max_points: u32,
}

impl SurveyScore {
    /// No question was answered.
    pub fn is_blank(&self) -> bool {
        self.max_points == 0
    }
    pub fn ratio(&self) -> Option<f64> {
        stats::ratio(f64::from(self.points), f64::from(self.max_points))
    }
}

/// Each answer is paired with the most points it can earn. Blank answers add
/// to neither side.
pub fn score(answers: &[(&str, u32)]) -> Result<SurveyScore> {
    let mut total = SurveyScore::default();
    for (question, (answer, max_points)) in answers.iter().enumerate() {
        let answer = answer.trim();
        if answer.is_empty() {
            continue;
        }
        let points: u32 = answer.parse().map_err(|_| {
            ReportError::parse(format!("answer '{}' is not a whole number", answer), Some(question))
        })?;
        total.points = total.points.checked_add(points).ok_or_else(|| {
            ReportError::parse(format!("answer '{}' overflows the survey total", answer), Some(question))
        })?;
        total.max_points += max_points;
    }
    Ok(total)
}

// ------------- Helpers -------------
fn field(row: &[String], index: usize, column: usize) -> Result<&str> {
    row.get(column).map(|f| f.trim()).ok_or_else(|| ReportError::MalformedRow {
        row: index,
        message: format!("missing column {}", column),
    })
}

fn survey_rows(input: &mut ReportInput<'_>, columns: &str) -> Result<Vec<Row>> {
    let query = format!(
        "SELECT {} FROM {} WHERE Date >= ?1 AND Date < ?2",
        columns,
        sql_identifier(&input.settings.surveys.table)?
    );
    let (start, end) = input.params.date_bounds();
    let rows = input.source.run_query(&query, &[start.as_str(), end.as_str()])?;
    log_statistics(&*input.source);
    Ok(rows)
}

fn metric_schema(params: &ReportParameters, metric: &str) -> Vec<String> {
    vec![grain_column(params), metric.to_owned()]
}

// ------------- CSAT rate -------------
pub struct CsatRate;

impl CsatRate {
    fn accumulate(
        &self,
        index: usize,
        row: &[String],
        roster: &Roster,
        params: &ReportParameters,
        scoring_change: &NaiveDateTime,
        data: &mut Aggregation,
    ) -> Result<RowOutcome> {
        let technician = field(row, index, 1)?;
        if !roster.has_user(technician) {
            return Ok(RowOutcome::Filtered);
        }
        let date = field(row, index, 0)?;
        let taken = parse_timestamp(date)?;
        // Q3 was always out of 10, the others dropped to 5 when the scale changed
        let scaled = if taken < *scoring_change { 10 } else { 5 };
        let survey = score(&[
            (field(row, index, 2)?, scaled),
            (field(row, index, 3)?, scaled),
            (field(row, index, 4)?, 10),
            (field(row, index, 5)?, scaled),
        ])?;
        let Some(rate) = survey.ratio() else {
            return Ok(RowOutcome::Ignored);
        };
        let grain = resolve_grain(params, roster, date, technician)?;
        let bucket = data.bucket(&grain);
        bucket.declare_attribute(attributes::SAT_SURVEYS);
        bucket.add_value(attributes::SAT_SURVEYS, rate)?;
        Ok(RowOutcome::Accumulated)
    }
}

impl Report for CsatRate {
    fn name(&self) -> &'static str { "LMI CSAT Rate" }
    fn description(&self) -> &'static str { "CSAT rate for LMI surveys." }
    fn units(&self) -> Units { Units::Percentage }
    fn schema(&self, params: &ReportParameters) -> Vec<String> {
        metric_schema(params, "CSAT Rate (%)")
    }
    fn run(&self, input: &mut ReportInput<'_>) -> Result<(Vec<Row>, RowTally)> {
        let surveys = &input.settings.surveys;
        let scoring_change = parse_timestamp(&surveys.scoring_change).map_err(|e| {
            ReportError::Config(format!("scoring change '{}': {}", surveys.scoring_change, e))
        })?;
        let precision = surveys.precision;
        let rows = survey_rows(input, "Date, Technician_ID, Q1, Q2, Q3, Q4")?;
        let roster = Arc::clone(&input.roster);

        let mut data = Aggregation::new();
        let mut tally = RowTally::default();
        for (index, row) in rows.iter().enumerate() {
            let outcome =
                self.accumulate(index, row, &roster, input.params, &scoring_change, &mut data);
            tally.record(index, outcome);
        }

        let mut result = Vec::new();
        for (grain, bucket) in data.iter() {
            if let Some(rate) = stats::average(bucket.values(attributes::SAT_SURVEYS)) {
                result.push(vec![grain.to_owned(), stats::percentage(rate, precision)]);
            }
        }
        Ok((result, tally))
    }
}

// ------------- CSAT volume -------------
pub struct CsatVolume;

impl CsatVolume {
    fn accumulate(
        &self,
        index: usize,
        row: &[String],
        roster: &Roster,
        params: &ReportParameters,
        threshold: f64,
        data: &mut Aggregation,
    ) -> Result<RowOutcome> {
        let technician = field(row, index, 4)?;
        if !roster.has_user(technician) {
            return Ok(RowOutcome::Filtered);
        }
        let survey = score(&[
            (field(row, index, 5)?, 10),
            (field(row, index, 6)?, 10),
            (field(row, index, 7)?, 10),
            (field(row, index, 8)?, 10),
        ])?;
        match survey.ratio() {
            Some(rate) if rate >= threshold => {
                let grain = resolve_grain(params, roster, field(row, index, 0)?, technician)?;
                let bucket = data.bucket(&grain);
                bucket.declare_attribute(attributes::SAT_SURVEYS);
                bucket.add_value(attributes::SAT_SURVEYS, technician)?;
                Ok(RowOutcome::Accumulated)
            }
            _ => Ok(RowOutcome::Ignored),
        }
    }
}

impl Report for CsatVolume {
    fn name(&self) -> &'static str { "LMI CSAT Volume" }
    fn description(&self) -> &'static str { "Customer satisfaction survey count for LMI surveys." }
    fn units(&self) -> Units { Units::Count }
    fn schema(&self, params: &ReportParameters) -> Vec<String> {
        metric_schema(params, "Case Count")
    }
    fn run(&self, input: &mut ReportInput<'_>) -> Result<(Vec<Row>, RowTally)> {
        let threshold = input.settings.surveys.satisfied_threshold;
        let rows = survey_rows(
            input,
            "Date, Session_ID, Customer_Name, Technician_Name, Technician_ID, Q1, Q2, Q3, Q4",
        )?;
        let roster = Arc::clone(&input.roster);

        let mut data = Aggregation::new();
        let mut tally = RowTally::default();
        for (index, row) in rows.iter().enumerate() {
            let outcome = self.accumulate(index, row, &roster, input.params, threshold, &mut data);
            tally.record(index, outcome);
        }

        let result = data
            .iter()
            .map(|(grain, bucket)| {
                vec![grain.to_owned(), stats::count(bucket.values(attributes::SAT_SURVEYS).len())]
            })
            .collect();
        Ok((result, tally))
    }
}

// ------------- DSAT cases -------------
/// Detail rows for every dissatisfied survey, in the order the source returns them.
pub struct DsatCases;

impl DsatCases {
    #[allow(clippy::too_many_arguments)]
    fn accumulate(
        &self,
        index: usize,
        row: &[String],
        roster: &Roster,
        params: &ReportParameters,
        threshold: f64,
        precision: usize,
        details: &mut Vec<Row>,
    ) -> Result<RowOutcome> {
        let technician = field(row, index, 4)?;
        if !roster.has_user(technician) {
            return Ok(RowOutcome::Filtered);
        }
        let answers = [
            field(row, index, 5)?,
            field(row, index, 6)?,
            field(row, index, 7)?,
            field(row, index, 8)?,
            field(row, index, 9)?,
        ];
        let weighted: Vec<(&str, u32)> = answers.iter().map(|answer| (*answer, 10)).collect();
        let survey = score(&weighted)?;
        match survey.ratio() {
            Some(rate) if rate < threshold => {
                let taken = parse_timestamp(field(row, index, 0)?)?;
                let mut detail = vec![
                    time_grain(&taken, TimeGrain::Day, params.date_format),
                    field(row, index, 1)?.to_owned(),
                    field(row, index, 2)?.to_owned(),
                    field(row, index, 3)?.to_owned(),
                ];
                detail.extend(answers.iter().map(|answer| answer.to_string()));
                detail.push(stats::percentage(rate, precision));
                details.push(detail);
                Ok(RowOutcome::Accumulated)
            }
            _ => Ok(RowOutcome::Ignored),
        }
    }
}

impl Report for DsatCases {
    fn name(&self) -> &'static str { "LMI DSAT Cases" }
    fn description(&self) -> &'static str { "Customer dissatisfaction survey details for LMI surveys." }
    fn units(&self) -> Units { Units::None }
    fn schema(&self, _params: &ReportParameters) -> Vec<String> {
        ["Date Grain", "SessionID", "Customer", "Technician", "Q1", "Q2", "Q3", "Q4", "Q5", "CSAT (%)"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }
    fn run(&self, input: &mut ReportInput<'_>) -> Result<(Vec<Row>, RowTally)> {
        let threshold = input.settings.surveys.satisfied_threshold;
        let precision = input.settings.surveys.precision;
        let rows = survey_rows(
            input,
            "Date, Session_ID, Customer_Name, Technician_Name, Technician_ID, Q1, Q2, Q3, Q4, Q5",
        )?;
        let roster = Arc::clone(&input.roster);

        let mut result = Vec::new();
        let mut tally = RowTally::default();
        for (index, row) in rows.iter().enumerate() {
            let outcome = self.accumulate(
                index,
                row,
                &roster,
                input.params,
                threshold,
                precision,
                &mut result,
            );
            tally.record(index, outcome);
        }
        Ok((result, tally))
    }
}

// ------------- Survey volume -------------
pub struct SurveyVolume;

impl Report for SurveyVolume {
    fn name(&self) -> &'static str { "LMI Survey Volume" }
    fn description(&self) -> &'static str { "Survey count of LMI surveys." }
    fn units(&self) -> Units { Units::Count }
    fn schema(&self, params: &ReportParameters) -> Vec<String> {
        metric_schema(params, "Case Count")
    }
    fn run(&self, input: &mut ReportInput<'_>) -> Result<(Vec<Row>, RowTally)> {
        let rows = survey_rows(input, "Date, Technician_ID")?;
        let roster = Arc::clone(&input.roster);

        let mut data = Aggregation::new();
        let mut tally = RowTally::default();
        for (index, row) in rows.iter().enumerate() {
            let outcome = field(row, index, 1).and_then(|technician| {
                if !roster.has_user(technician) {
                    return Ok(RowOutcome::Filtered);
                }
                let grain = resolve_grain(input.params, &roster, field(row, index, 0)?, technician)?;
                let bucket = data.bucket(&grain);
                bucket.declare_attribute(attributes::ALL_SURVEYS);
                bucket.add_value(attributes::ALL_SURVEYS, technician)?;
                Ok(RowOutcome::Accumulated)
            });
            tally.record(index, outcome);
        }

        let result = data
            .iter()
            .map(|(grain, bucket)| {
                vec![grain.to_owned(), stats::count(bucket.values(attributes::ALL_SURVEYS).len())]
            })
            .collect();
        Ok((result, tally))
    }
}

// ------------- Net promoter score -------------
pub struct NetPromoterScore;

impl NetPromoterScore {
    fn accumulate(
        &self,
        index: usize,
        row: &[String],
        roster: &Roster,
        params: &ReportParameters,
        data: &mut Aggregation,
    ) -> Result<RowOutcome> {
        let technician = field(row, index, 1)?;
        if !roster.has_user(technician) {
            return Ok(RowOutcome::Filtered);
        }
        let answer = field(row, index, 3)?;
        if answer.is_empty() {
            return Ok(RowOutcome::Ignored);
        }
        let answer: i32 = answer.parse().map_err(|_| {
            ReportError::parse(format!("Q3 answer '{}' is not a whole number", answer), Some(3))
        })?;
        let session = field(row, index, 2)?;
        let grain = resolve_grain(params, roster, field(row, index, 0)?, technician)?;

        let bucket = data.bucket(&grain);
        bucket.declare_attribute(attributes::VIABLE_SURVEYS);
        bucket.declare_attribute(attributes::PROMOTERS);
        bucket.declare_attribute(attributes::DETRACTORS);
        bucket.add_value(attributes::VIABLE_SURVEYS, session)?;
        // promoters answer 9 or 10, detractors 6 or less
        match answer {
            9 | 10 => bucket.add_value(attributes::PROMOTERS, session)?,
            ..=6 => bucket.add_value(attributes::DETRACTORS, session)?,
            _ => (),
        }
        Ok(RowOutcome::Accumulated)
    }
}

impl Report for NetPromoterScore {
    fn name(&self) -> &'static str { "Net Promoter Score" }
    fn description(&self) -> &'static str { "How likely a customer would recommend the client." }
    fn units(&self) -> Units { Units::Percentage }
    fn schema(&self, params: &ReportParameters) -> Vec<String> {
        metric_schema(params, "Net Promoter Score (%)")
    }
    fn run(&self, input: &mut ReportInput<'_>) -> Result<(Vec<Row>, RowTally)> {
        let precision = input.settings.surveys.precision;
        let rows = survey_rows(input, "Date, Technician_ID, Session_ID, Q3")?;
        let roster = Arc::clone(&input.roster);

        let mut data = Aggregation::new();
        let mut tally = RowTally::default();
        for (index, row) in rows.iter().enumerate() {
            let outcome = self.accumulate(index, row, &roster, input.params, &mut data);
            tally.record(index, outcome);
        }

        let mut result = Vec::new();
        for (grain, bucket) in data.iter() {
            let surveys = bucket.values(attributes::VIABLE_SURVEYS).len() as f64;
            let promoters = bucket.values(attributes::PROMOTERS).len() as f64;
            let detractors = bucket.values(attributes::DETRACTORS).len() as f64;
            if let (Some(promoted), Some(detracted)) =
                (stats::ratio(promoters, surveys), stats::ratio(detractors, surveys))
            {
                result.push(vec![grain.to_owned(), stats::percentage(promoted - detracted, precision)]);
            }
        }
        Ok((result, tally))
    }
}
