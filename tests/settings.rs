use grainstat::settings::Settings;
use grainstat::ReportError;

fn write_config(name: &str, contents: &str) -> String {
    let path = std::env::temp_dir().join(name);
    std::fs::write(&path, contents).expect("write config");
    path.to_string_lossy().into_owned()
}

#[test]
fn defaults_cover_every_field() {
    let settings = Settings::default();
    assert_eq!(settings.log_level, "info");
    assert_eq!(settings.roster.table, "LMI_KASPERSKY_ROSTER");
    assert_eq!(settings.roster.parent_id.as_deref(), Some("10982630"));
    assert_eq!(settings.roster.excluded_types.len(), 3);
    assert_eq!(settings.surveys.scoring_change, "2015-01-29 11:30:00");
    assert_eq!(settings.surveys.satisfied_threshold, 0.85);
    assert_eq!(settings.surveys.precision, 4);
    assert!(settings.database.path.is_none());
}

#[test]
fn file_values_override_defaults() {
    let path = write_config(
        "grainstat_settings_override.toml",
        "[surveys]\nprecision = 2\n\n[roster]\norg_unit = \"USA02\"\n",
    );
    let settings = Settings::load(Some(&path)).unwrap();
    assert_eq!(settings.surveys.precision, 2);
    assert_eq!(settings.roster.org_unit, "USA02");
    // untouched keys keep their defaults
    assert_eq!(settings.surveys.satisfied_threshold, 0.85);
    assert_eq!(settings.roster.program_name, "Kaspersky");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn named_file_must_exist() {
    let err = Settings::load(Some("/nonexistent/dir/grainstat.toml")).unwrap_err();
    assert!(matches!(err, ReportError::Config(_)));
}

#[test]
fn missing_seed_script_is_a_config_error() {
    let mut settings = Settings::default();
    settings.database.seed = Some("/nonexistent/dir/seed.sql".into());
    assert!(matches!(settings.connector(), Err(ReportError::Config(_))));
}

#[test]
fn environment_overrides_the_file() {
    let path = write_config(
        "grainstat_settings_environment.toml",
        "[surveys]\ntable = \"File_Surveys\"\n",
    );
    // no other test reads this key
    unsafe { std::env::set_var("GRAINSTAT__SURVEYS__TABLE", "Env_Surveys") };
    let settings = Settings::load(Some(&path));
    unsafe { std::env::remove_var("GRAINSTAT__SURVEYS__TABLE") };
    assert_eq!(settings.unwrap().surveys.table, "Env_Surveys");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn precision_below_two_is_rejected() {
    let path = write_config("grainstat_settings_precision.toml", "[surveys]\nprecision = 1\n");
    let err = Settings::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ReportError::Config(_)));
    let _ = std::fs::remove_file(&path);

    let mut settings = Settings::default();
    assert!(settings.validate().is_ok());
    settings.surveys.precision = 0;
    assert!(settings.validate().is_err());
}
