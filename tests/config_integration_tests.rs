use standings_core::config::{ConfigManager, StandingsConfig};

#[test]
fn test_shipped_config_matches_defaults() {
    let manager = ConfigManager::load_from_file("config/standings.toml", "production").unwrap();
    assert_eq!(manager.config(), &StandingsConfig::default());
}

#[test]
fn test_test_overlay_shortens_timings() {
    let manager = ConfigManager::load_from_file("config/standings.toml", "test").unwrap();
    let config = manager.config();
    assert_eq!(config.queue.poll_interval_ms, 20);
    assert_eq!(config.queue.job_timeout_ms, 2000);
    assert!(!config.backoff.jitter_enabled);
    assert_eq!(config.queue.concurrency, 3);
    assert_eq!(config.snapshots.max_per_table, 20);
}
