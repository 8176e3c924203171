use grainstat::attributes;
use grainstat::params::{split_list, RosterFilter};
use grainstat::roster::{LoadSummary, Roster, RosterState};
use grainstat::settings::RosterSettings;
use grainstat::source::{SourceMode, SqliteConnector, StaticSource};
use grainstat::ReportError;

fn setup() -> SqliteConnector {
    SqliteConnector::in_memory(include_str!("../fixtures/demo.sql"))
}

fn load(filter: RosterFilter) -> (Roster, LoadSummary) {
    let mut roster = Roster::new(RosterSettings::default());
    let summary = roster.load(&setup(), &filter).expect("roster loads");
    (roster, summary)
}

#[test]
fn excluded_types_and_other_parents_are_left_out() {
    let (roster, summary) = load(RosterFilter::everyone());
    assert_eq!(roster.state(), RosterState::Loaded);
    assert_eq!(roster.user_ids().collect::<Vec<_>>(), vec!["U1", "U2", "U3"]);
    assert!(!roster.has_user("A1"));
    assert!(!roster.has_user("X1"));
    assert_eq!(summary, LoadSummary { added: 3, duplicates: 1, filtered: 0, skipped: 0 });
}

#[test]
fn first_row_wins_for_a_duplicate_id() {
    let (roster, _) = load(RosterFilter::everyone());
    let ann = roster.get_user("U1").unwrap();
    assert_eq!(ann.first_text(attributes::NAME).unwrap(), "Ann");
    assert_eq!(ann.first_text(attributes::TEAM_NAME).unwrap(), "Team A");
    assert_eq!(ann.values(attributes::NAME).len(), 1);
}

#[test]
fn subjects_carry_roster_settings() {
    let (roster, _) = load(RosterFilter::everyone());
    let cid = roster.get_user("U3").unwrap();
    assert_eq!(cid.first_text(attributes::PROGRAM_NAME).unwrap(), "Kaspersky");
    assert_eq!(cid.first_text(attributes::ORG_UNIT).unwrap(), "CAN01");
    assert_eq!(cid.first_text(attributes::DESCRIPTION).unwrap(), "Tier 2");
    assert_eq!(cid.first_text(attributes::TYPE).unwrap(), "Technician");
    assert_eq!(cid.first_text(attributes::STATUS).unwrap(), "Enabled");
}

#[test]
fn agent_filter_admits_named_subjects_only() {
    let (roster, summary) = load(RosterFilter::agents(split_list("Ann; Cid")));
    assert_eq!(roster.user_ids().collect::<Vec<_>>(), vec!["U1", "U3"]);
    assert_eq!(summary.filtered, 1);
}

#[test]
fn team_filter_admits_whole_teams() {
    let (roster, summary) = load(RosterFilter::teams(["Team B"]));
    // the first U1 row is on Team A, so the later Team B row for U1 gets in
    assert_eq!(roster.user_ids().collect::<Vec<_>>(), vec!["U2", "U1"]);
    assert_eq!(roster.full_name("U1").as_deref(), Some("Ann Again"));
    assert_eq!(summary.duplicates, 0);
}

#[test]
fn names_match_exactly() {
    let (roster, _) = load(RosterFilter::agents(["ann"]));
    assert!(roster.is_empty());
}

#[test]
fn include_all_overrides_the_lists() {
    let filter = RosterFilter { include_all: true, ..RosterFilter::agents(["Nobody"]) };
    let (roster, _) = load(filter);
    assert_eq!(roster.len(), 3);
}

#[test]
fn lookups() {
    let (roster, _) = load(RosterFilter::everyone());
    assert_eq!(roster.full_name("U2").as_deref(), Some("Bob"));
    assert_eq!(roster.full_name("Z9"), None);
    // reads true for a disabled status
    assert!(roster.is_active("U2"));
    assert!(!roster.is_active("U1"));
    assert!(!roster.is_active("Z9"));
}

#[test]
fn short_and_blank_rows_are_skipped() {
    let source = StaticSource::from_strs(&[
        &["U1", "P", "Team A", "Ann", "", "", "Enabled", "Technician"],
        &["U2", "P", "Team A"],
        &["  ", "P", "Team A", "Nobody", "", "", "Enabled", "Technician"],
        &["U3", "P", "Team B", "Cid", "", "", "Enabled", "Technician"],
    ]);
    let mut roster = Roster::new(RosterSettings::default());
    let summary = roster.load(&source, &RosterFilter::everyone()).unwrap();
    assert_eq!(summary.skipped, 2);
    assert_eq!(roster.user_ids().collect::<Vec<_>>(), vec!["U1", "U3"]);
}

#[test]
fn reload_replaces_previous_subjects() {
    let mut roster = Roster::new(RosterSettings::default());
    roster.load(&setup(), &RosterFilter::everyone()).unwrap();
    roster.load(&setup(), &RosterFilter::agents(["Bob"])).unwrap();
    assert_eq!(roster.user_ids().collect::<Vec<_>>(), vec!["U2"]);
}

#[test]
fn reload_reads_from_the_new_source() {
    let first = StaticSource::from_strs(&[&["U1", "P", "Team A", "Ann", "", "", "Enabled", "Technician"]]);
    let second = StaticSource::from_strs(&[&["U2", "P", "Team B", "Bob", "", "", "Enabled", "Technician"]]);
    let mut roster = Roster::new(RosterSettings::default());
    roster.load(&first, &RosterFilter::everyone()).unwrap();
    roster.load(&second, &RosterFilter::everyone()).unwrap();
    assert_eq!(roster.user_ids().collect::<Vec<_>>(), vec!["U2"]);
    assert!(!roster.has_user("U1"));
}

#[test]
fn unreachable_source_leaves_the_roster_empty() {
    let connector = SqliteConnector::new(SourceMode::File("/nonexistent/dir/roster.db".into()));
    let mut roster = Roster::new(RosterSettings::default());
    let err = roster.load(&connector, &RosterFilter::everyone()).unwrap_err();
    assert!(matches!(err, ReportError::Setup { .. }));
    assert_eq!(roster.state(), RosterState::Empty);
    assert!(roster.is_empty());
}

#[test]
fn missing_table_fails_the_load() {
    let connector = SqliteConnector::in_memory("CREATE TABLE unrelated (x TEXT);");
    let mut roster = Roster::new(RosterSettings::default());
    let err = roster.load(&connector, &RosterFilter::everyone()).unwrap_err();
    assert!(matches!(err, ReportError::Source(_)));
    assert_eq!(roster.state(), RosterState::Empty);
}

#[test]
fn close_is_idempotent() {
    let (mut roster, _) = load(RosterFilter::everyone());
    roster.close();
    roster.close();
    assert!(roster.has_user("U1"));
}

#[test]
fn query_binds_parent_and_excluded_types() {
    let roster = Roster::new(RosterSettings::default());
    let (query, params) = roster.query().unwrap();
    assert!(query.ends_with("WHERE PARENT_ID = ?1 AND TYPE NOT IN (?2, ?3, ?4)"));
    assert_eq!(params[0], "10982630");
    assert_eq!(params.len(), 4);

    let settings = RosterSettings { table: "roster; DROP TABLE x".into(), ..RosterSettings::default() };
    assert!(matches!(Roster::new(settings).query(), Err(ReportError::Config(_))));
}

#[test]
fn filter_from_lists_without_names_includes_everyone() {
    let filter = RosterFilter::from_lists(None, None, false);
    assert!(filter.include_all);
    let (roster, _) = load(filter);
    assert_eq!(roster.len(), 3);
}

#[test]
fn filter_from_lists_splits_names() {
    let filter = RosterFilter::from_lists(Some("Ann, Cid"), Some("Team B"), false);
    assert!(!filter.include_all);
    assert!(filter.agent_names.contains("Cid"));
    assert!(filter.team_names.contains("Team B"));
    let (roster, _) = load(RosterFilter::from_lists(Some("Cid"), None, false));
    assert_eq!(roster.user_ids().collect::<Vec<_>>(), vec!["U3"]);
    let (roster, _) = load(RosterFilter::from_lists(Some("Cid"), None, true));
    assert_eq!(roster.len(), 3);
}
