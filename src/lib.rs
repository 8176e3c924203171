//! Grainstat – roster-filtered survey reporting.
//!
//! A run answers one question ("what was the CSAT rate per month for these
//! agents?") by combining two inputs:
//! * A [`roster::Roster`] of subjects eligible for reporting, loaded once from a
//!   row source and narrowed by a [`params::RosterFilter`].
//! * Survey rows from the same or another source, each attributed to a subject.
//!
//! Rows whose subject is not on the roster are dropped. The rest are bucketed by
//! grain, either a time grain of the row's timestamp or an attribute of its
//! subject, and each bucket is reduced to one output row.
//!
//! ## Modules
//! * [`datum`] – Named, multi-valued attribute records used for subjects and buckets.
//! * [`aggregation`] – Buckets keyed by grain label, in first-seen order.
//! * [`grain`] – Time and subject grain resolution.
//! * [`roster`] – Loading, deduplication and lookup of subjects.
//! * [`stats`] – Averages, ratios and percentage formatting.
//! * [`source`] – The [`source::RowSource`] seam plus SQLite and static implementations.
//! * [`report`] – The [`report::Report`] trait, the registry and the runner.
//! * [`survey`] – The customer survey reports.
//! * [`settings`] – Layered configuration.
//!
//! ## Quick Start
//! ```
//! use chrono::NaiveDate;
//! use grainstat::params::{ReportParameters, RosterFilter};
//! use grainstat::report::{ReportKind, ReportRunner, RunContext};
//! use grainstat::settings::Settings;
//! use grainstat::source::StaticSource;
//!
//! let settings = Settings::default();
//! let source = StaticSource::from_strs(&[&["U1", "10982630", "Team A", "Ann", "", "", "", "Agent"]]);
//! let params = ReportParameters::new(
//!     RosterFilter::everyone(),
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
//! );
//! let report = ReportKind::Roster.report();
//! let table = ReportRunner::new(&source, &settings)
//!     .run(report.as_ref(), &params, &RunContext::new())
//!     .unwrap();
//! assert_eq!(table.rows.len(), 1);
//! ```

pub mod aggregation;
pub mod attributes;
pub mod datum;
pub mod error;
pub mod grain;
pub mod params;
pub mod report;
pub mod roster;
pub mod settings;
pub mod source;
pub mod stats;
pub mod survey;

pub use error::{ReportError, Result};
