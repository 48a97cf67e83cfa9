//! Behavior-driven tests for the data directory.
//!
//! The three stores live in headerless CSV files that survive restarts and
//! are created on first use.

use optwatch_core::adapters::MockChainSource;
use optwatch_core::{
    load_settings, CoreError, DataPaths, MonthCode, Notice, SettingKey, SettingValue, Settings,
    Ticker, Workspace,
};
use std::fs;
use tempfile::tempdir;
use time::macros::date;
use time::{Date, Duration};

const TODAY: Date = date!(2026 - 10 - 14);

fn ticker(raw: &str) -> Ticker {
    Ticker::parse(raw).expect("ticker")
}

fn month(days: i64) -> MonthCode {
    MonthCode::new(TODAY + Duration::days(days))
}

// =============================================================================
// First run
// =============================================================================

#[tokio::test]
async fn when_the_data_dir_is_new_every_file_is_created() {
    // Given: An empty directory
    let temp = tempdir().expect("tempdir");
    let paths = DataPaths::new(temp.path().join("data"));
    assert!(paths.prepare().expect("prepare"));

    // When: Settings are loaded and the workspace opened
    let settings = load_settings(&paths).expect("settings");
    let source = MockChainSource::new();
    let (workspace, notices) = Workspace::open(paths.clone(), settings, &source, TODAY)
        .await
        .expect("open");

    // Then: All three files exist and the user is told about the refresh
    assert!(paths.lists.is_file());
    assert!(paths.months.is_file());
    assert!(paths.settings.is_file());
    assert_eq!(notices, vec![Notice::RefreshingMonths, Notice::CredentialMissing]);
    assert!(!workspace.is_dirty());
    assert!(!paths.prepare().expect("prepare again"));
}

// =============================================================================
// Round trips
// =============================================================================

#[tokio::test]
async fn when_the_workspace_is_reopened_lists_and_months_are_restored() {
    // Given: A saved workspace with one list and cached months
    let temp = tempdir().expect("tempdir");
    let paths = DataPaths::new(temp.path());
    let source = MockChainSource::new();
    source.set_months(&ticker("AAPL"), vec![month(37), month(65)]);
    source.set_months(&ticker("F"), vec![month(37)]);

    let (mut workspace, _) = Workspace::open(paths.clone(), Settings::default(), &source, TODAY)
        .await
        .expect("open");
    workspace.lists_mut().create(&["TECH", "AUTOS"]);
    workspace.lists_mut().add("TECH", &["AAPL"]);
    workspace.lists_mut().add("AUTOS", &["F", "AAPL"]);
    assert!(workspace.refresh_months(&source).await.is_empty());
    assert!(workspace.flush_dirty().is_empty());

    // When: Reopening with an offline source
    let offline = MockChainSource::new();
    offline.set_failing(true);
    let (reopened, notices) = Workspace::open(paths, Settings::default(), &offline, TODAY)
        .await
        .expect("reopen");

    // Then: Everything came from disk
    assert_eq!(notices, vec![Notice::CredentialMissing]);
    assert!(offline.calls().contract_months.is_empty());
    assert_eq!(reopened.lists().render("AUTOS").as_deref(), Some("AUTOS: AAPL, F"));
    assert_eq!(
        reopened.months().months(&ticker("AAPL")),
        Some(&[month(37), month(65)][..])
    );
}

#[tokio::test]
async fn when_a_list_is_deleted_its_months_are_compacted_on_reopen() {
    let temp = tempdir().expect("tempdir");
    let paths = DataPaths::new(temp.path());
    fs::write(&paths.lists, "TECH,AAPL\n").expect("lists");
    fs::write(
        &paths.months,
        format!("AAPL,{}\nGONE,{}\n", month(40), month(40)),
    )
    .expect("months");

    let (mut workspace, _) = Workspace::open(paths.clone(), Settings::default(), &MockChainSource::new(), TODAY)
        .await
        .expect("open");

    assert!(workspace.months().is_dirty());
    assert!(workspace.flush_dirty().is_empty());
    let saved = fs::read_to_string(&paths.months).expect("months");
    assert_eq!(saved.trim(), format!("AAPL,{}", month(40)));
}

#[test]
fn when_saving_fails_the_store_stays_dirty() {
    let temp = tempdir().expect("tempdir");
    let paths = DataPaths::new(temp.path().join("missing").join("nested"));
    let mut workspace = Workspace::empty(paths, Settings::default(), TODAY);
    workspace.lists_mut().create(&["TECH"]);

    let notices = workspace.flush_dirty();

    assert_eq!(notices.len(), 1);
    assert!(matches!(notices[0], Notice::SaveFailed { .. }));
    assert!(workspace.lists().is_dirty());
}

// =============================================================================
// Settings
// =============================================================================

#[test]
fn when_a_setting_is_changed_it_is_saved_immediately() {
    let temp = tempdir().expect("tempdir");
    let paths = DataPaths::new(temp.path());
    let mut workspace = Workspace::empty(paths.clone(), load_settings(&paths).expect("defaults"), TODAY);

    let (key, failure) = workspace.set_setting("slogin", "abc123").expect("valid setting");

    assert_eq!(key, SettingKey::Login);
    assert!(failure.is_none());
    let reloaded = load_settings(&paths).expect("reload");
    assert_eq!(reloaded.login(), Some("abc123"));
    assert_eq!(reloaded.get(SettingKey::MinTimeDifference), SettingValue::Integer(5));
}

#[test]
fn when_the_settings_file_holds_a_mistyped_value_startup_fails() {
    let temp = tempdir().expect("tempdir");
    let paths = DataPaths::new(temp.path());
    fs::write(&paths.settings, "MIN_TIME_DIFFERENCE,soon\n").expect("settings");

    let outcome = load_settings(&paths);

    assert!(matches!(outcome, Err(CoreError::Validation(_))));
}
