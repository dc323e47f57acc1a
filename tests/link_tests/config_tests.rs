//! Tests for the reconnect policy configuration

use std::time::Duration;

use bytelang::config::Config;

#[test]
fn test_backoff_doubles_and_caps() {
    let config = Config::builder().backoff_ms(100, 500).build();
    assert_eq!(config.backoff(1), Duration::from_millis(100));
    assert_eq!(config.backoff(2), Duration::from_millis(200));
    assert_eq!(config.backoff(3), Duration::from_millis(400));
    assert_eq!(config.backoff(4), Duration::from_millis(500));
    assert_eq!(config.backoff(40), Duration::from_millis(500));
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.baud_rate, 115_200);
    assert_eq!(config.port_filter.as_deref(), Some("USB"));
    assert_eq!(config.port_denylist, vec!["COM1".to_string()]);
    assert_eq!(config.poll_interval(), Duration::from_millis(1));
    assert_eq!(config.max_reconnect_attempts, None);
}
