//! Configuration for the bridge
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Main configuration for a bridge link
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Serial Configuration
    // -------------------------------------------------------------------------
    /// Explicit device path. When unset, the first discovered port is used.
    pub port: Option<String>,

    /// Line speed
    pub baud_rate: u32,

    /// Read timeout (milliseconds). A read that times out is a short read.
    pub read_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Discovery Configuration
    // -------------------------------------------------------------------------
    /// Substring a device name must contain to be picked during discovery
    pub port_filter: Option<String>,

    /// Device names never picked during discovery
    pub port_denylist: Vec<String>,

    /// Delay between closing and reopening the port (milliseconds)
    pub settle_delay_ms: u64,

    // -------------------------------------------------------------------------
    // Poll Loop Configuration
    // -------------------------------------------------------------------------
    /// Pause between two poll cycles (microseconds)
    pub poll_interval_us: u64,

    /// First reconnect backoff (milliseconds)
    pub backoff_initial_ms: u64,

    /// Backoff ceiling (milliseconds)
    pub backoff_max_ms: u64,

    /// Give up after this many failed reconnects. `None` retries forever.
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 115_200,
            read_timeout_ms: 100,
            port_filter: Some("USB".to_string()),
            port_denylist: vec!["COM1".to_string()],
            settle_delay_ms: 2000,
            poll_interval_us: 1000,
            backoff_initial_ms: 250,
            backoff_max_ms: 5000,
            max_reconnect_attempts: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }

    /// Backoff before the given reconnect attempt (1-based), doubling up to the ceiling
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let ms = self
            .backoff_initial_ms
            .saturating_mul(1u64 << shift)
            .min(self.backoff_max_ms);
        Duration::from_millis(ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the device path
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.config.port = Some(port.into());
        self
    }

    /// Set the baud rate
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.config.baud_rate = baud;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the discovery filter. `None` accepts every port.
    pub fn port_filter(mut self, filter: Option<String>) -> Self {
        self.config.port_filter = filter;
        self
    }

    /// Replace the discovery denylist
    pub fn port_denylist(mut self, denylist: Vec<String>) -> Self {
        self.config.port_denylist = denylist;
        self
    }

    /// Set the settle delay (in milliseconds)
    pub fn settle_delay_ms(mut self, ms: u64) -> Self {
        self.config.settle_delay_ms = ms;
        self
    }

    /// Set the pause between poll cycles (in microseconds)
    pub fn poll_interval_us(mut self, us: u64) -> Self {
        self.config.poll_interval_us = us;
        self
    }

    /// Set the reconnect backoff bounds (in milliseconds)
    pub fn backoff_ms(mut self, initial: u64, max: u64) -> Self {
        self.config.backoff_initial_ms = initial;
        self.config.backoff_max_ms = max;
        self
    }

    /// Limit the number of consecutive failed reconnects
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.max_reconnect_attempts = Some(attempts);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
