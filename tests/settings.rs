use omni_launcher::keys::Platform;
use omni_launcher::settings::Settings;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let s = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(s, Settings::default());
    assert_eq!(s.query_debounce_ms, 250);
    assert_eq!(s.tab_close_delay_ms, 50);
    assert_eq!(s.priority_url_patterns, vec!["meet.google.com"]);
}

#[test]
fn partial_file_keeps_other_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"platform": "mac", "result_limit": 10}"#).unwrap();
    let s = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(s.platform(), Platform::Mac);
    assert_eq!(s.result_limit, 10);
    assert_eq!(s.history_max_results, 50);
}

#[test]
fn invalid_values_are_clamped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{"result_limit": 0, "history_scope_max_results": 5, "favicon_path_limit": 99}"#,
    )
    .unwrap();
    let s = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(s.result_limit, 250);
    assert_eq!(s.history_scope_max_results, 30);
    assert_eq!(s.favicon_path_limit, 8);
}

#[test]
fn save_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let s = Settings {
        fuzzy_fallback: true,
        priority_url_patterns: vec!["zoom.us".into()],
        ..Settings::default()
    };
    s.save(path.to_str().unwrap()).unwrap();
    assert_eq!(Settings::load(path.to_str().unwrap()).unwrap(), s);
}

#[test]
fn history_scope_limit_depends_on_remainder() {
    let s = Settings::default();
    assert_eq!(s.history_scope_limit(""), 30);
    assert_eq!(s.history_scope_limit("  "), 30);
    assert_eq!(s.history_scope_limit("rust"), 300);
}
