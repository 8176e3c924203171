use chrono::{NaiveDate, NaiveDateTime};
use grainstat::attributes;
use grainstat::datum::Datum;
use grainstat::grain::{parse_timestamp, subject_grain, time_grain, DateFormat, SubjectGrain, TimeGrain};
use grainstat::ReportError;

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(9, 30, 0).unwrap()
}

#[test]
fn iso_labels() {
    let t = at(2024, 1, 10);
    assert_eq!(time_grain(&t, TimeGrain::Day, DateFormat::Iso), "2024-01-10");
    assert_eq!(time_grain(&t, TimeGrain::Week, DateFormat::Iso), "2024-W02");
    assert_eq!(time_grain(&t, TimeGrain::Month, DateFormat::Iso), "2024-01");
    assert_eq!(time_grain(&t, TimeGrain::Quarter, DateFormat::Iso), "2024-Q1");
    assert_eq!(time_grain(&t, TimeGrain::Year, DateFormat::Iso), "2024");
}

#[test]
fn compact_and_long_labels() {
    let t = at(2024, 1, 10);
    assert_eq!(time_grain(&t, TimeGrain::Day, DateFormat::Compact), "20240110");
    assert_eq!(time_grain(&t, TimeGrain::Week, DateFormat::Compact), "2024W02");
    assert_eq!(time_grain(&t, TimeGrain::Month, DateFormat::Compact), "202401");
    assert_eq!(time_grain(&t, TimeGrain::Day, DateFormat::Long), "January 10, 2024");
    assert_eq!(time_grain(&t, TimeGrain::Week, DateFormat::Long), "Week 2, 2024");
    assert_eq!(time_grain(&t, TimeGrain::Month, DateFormat::Long), "January 2024");
    assert_eq!(time_grain(&t, TimeGrain::Quarter, DateFormat::Long), "Q1 2024");
}

#[test]
fn same_grain_same_label() {
    let morning = at(2024, 3, 4);
    let evening = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap().and_hms_opt(23, 59, 59).unwrap();
    for grain in [TimeGrain::Month, TimeGrain::Quarter, TimeGrain::Year] {
        assert_eq!(
            time_grain(&morning, grain, DateFormat::Iso),
            time_grain(&evening, grain, DateFormat::Iso)
        );
    }
    assert_ne!(
        time_grain(&morning, TimeGrain::Day, DateFormat::Iso),
        time_grain(&evening, TimeGrain::Day, DateFormat::Iso)
    );
}

#[test]
fn weeks_use_the_iso_year() {
    // 2021-01-01 falls in the last ISO week of 2020
    assert_eq!(time_grain(&at(2021, 1, 1), TimeGrain::Week, DateFormat::Iso), "2020-W53");
    assert_eq!(time_grain(&at(2024, 12, 30), TimeGrain::Week, DateFormat::Iso), "2025-W01");
}

#[test]
fn quarters_split_on_calendar_months() {
    assert_eq!(time_grain(&at(2024, 3, 31), TimeGrain::Quarter, DateFormat::Iso), "2024-Q1");
    assert_eq!(time_grain(&at(2024, 4, 1), TimeGrain::Quarter, DateFormat::Iso), "2024-Q2");
    assert_eq!(time_grain(&at(2024, 12, 1), TimeGrain::Quarter, DateFormat::Compact), "2024Q4");
}

#[test]
fn subject_grain_reads_the_chosen_attribute() {
    let mut subject = Datum::new("U1");
    for attribute in attributes::SUBJECT_ATTRIBUTES {
        subject.declare_attribute(attribute);
    }
    subject.add_value(attributes::NODE_ID, "U1").unwrap();
    subject.add_value(attributes::NAME, "Ann").unwrap();
    subject.add_value(attributes::TEAM_NAME, "Team A").unwrap();

    assert_eq!(subject_grain(SubjectGrain::Id, &subject).unwrap(), "U1");
    assert_eq!(subject_grain(SubjectGrain::Name, &subject).unwrap(), "Ann");
    assert_eq!(subject_grain(SubjectGrain::Team, &subject).unwrap(), "Team A");
    assert!(matches!(
        subject_grain(SubjectGrain::OrgUnit, &subject),
        Err(ReportError::NoValue { .. })
    ));
}

#[test]
fn timestamps_in_common_shapes() {
    assert_eq!(parse_timestamp("2024-01-10 09:30:00").unwrap(), at(2024, 1, 10));
    assert_eq!(parse_timestamp("2024-01-10T09:30:00.000").unwrap(), at(2024, 1, 10));
    assert_eq!(
        parse_timestamp("2024-01-10").unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap().and_hms_opt(0, 0, 0).unwrap()
    );
    assert!(matches!(parse_timestamp("10/01/2024"), Err(ReportError::Parse { .. })));
}

#[test]
fn grain_names_parse() {
    assert_eq!("Week".parse::<TimeGrain>().unwrap(), TimeGrain::Week);
    assert_eq!("long".parse::<DateFormat>().unwrap(), DateFormat::Long);
    assert_eq!("orgunit".parse::<SubjectGrain>().unwrap(), SubjectGrain::OrgUnit);
    assert!(matches!("fortnight".parse::<TimeGrain>(), Err(ReportError::Parameter { .. })));
    assert_eq!(TimeGrain::Quarter.to_string(), "quarter");
}
