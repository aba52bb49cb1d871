use osc_watch::core::settings::{CHAT_PRESETS_FILE, SETTINGS_FILE};
use osc_watch::core::{ChatPresets, Settings};
use osc_watch::WatchError;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_settings_round_trip_through_disk() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(SETTINGS_FILE);

    let mut settings = Settings::load_from(&path);
    assert!(settings.default_start);

    settings.default_start = false;
    settings.save_to(&path).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"defaultStart\""));
    assert!(!Settings::load_from(&path).default_start);
}

#[test]
fn test_corrupt_settings_fall_back_to_default() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(SETTINGS_FILE);
    fs::write(&path, "{ not json").unwrap();

    assert!(Settings::load_from(&path).default_start);
}

#[test]
fn test_presets_survive_reload() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(CHAT_PRESETS_FILE);

    let mut presets = ChatPresets::load_from(&path);
    assert!(presets.is_empty());
    presets.add("  AFK  ").unwrap();
    presets.add("brb").unwrap();

    let reloaded = ChatPresets::load_from(&path);
    assert_eq!(reloaded.list(), &["AFK".to_string(), "brb".to_string()]);
}

#[test]
fn test_preset_add_rejects_empty_and_duplicates() {
    let tmp = TempDir::new().unwrap();
    let mut presets = ChatPresets::load_from(tmp.path().join(CHAT_PRESETS_FILE));

    assert!(matches!(presets.add("   "), Err(WatchError::Preset(_))));
    presets.add("hello").unwrap();
    assert!(matches!(presets.add("hello "), Err(WatchError::Preset(_))));
    assert_eq!(presets.len(), 1);
}

#[test]
fn test_preset_reordering_and_removal() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(CHAT_PRESETS_FILE);
    let mut presets = ChatPresets::load_from(&path);
    for message in ["a", "b", "c"] {
        presets.add(message).unwrap();
    }

    assert!(presets.move_up(2).unwrap());
    assert_eq!(presets.list(), &["a", "c", "b"]);
    assert!(presets.move_down(0).unwrap());
    assert_eq!(presets.list(), &["c", "a", "b"]);

    // Edges are no-ops
    assert!(!presets.move_up(0).unwrap());
    assert!(!presets.move_down(2).unwrap());
    assert!(!presets.move_down(10).unwrap());

    assert!(presets.remove("a").unwrap());
    assert!(!presets.remove("missing").unwrap());

    let reloaded = ChatPresets::load_from(&path);
    assert_eq!(reloaded.list(), &["c", "b"]);
}
