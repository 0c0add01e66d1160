use std::time::Duration;

use clap::Parser;

use crate::actors::{CoordinatorConfig, OutboxRelayConfig};
use crate::application::AppSettings;
use crate::utils::RetryConfig;

// ============================================================================
// Configuration - command line flags backed by environment variables
// ============================================================================
//
// Optional backends fall back to in-process implementations:
//   DATABASE_URL  unset → in-memory store
//   REDIS_URL     unset → in-memory cache
//   KAFKA_BROKERS unset → logging publisher
//
// ============================================================================

#[derive(Debug, Clone, Parser)]
#[command(name = "commerce_cqrs", about = "Layered CQRS e-commerce backend")]
pub struct Config {
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    pub database_max_connections: u32,

    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    #[arg(long, env = "CACHE_NAMESPACE", default_value = "commerce")]
    pub cache_namespace: String,

    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = 300)]
    pub cache_ttl_secs: u64,

    /// How often the in-memory cache drops expired entries.
    #[arg(long, env = "CACHE_SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub cache_sweep_interval_secs: u64,

    #[arg(long, env = "KAFKA_BROKERS")]
    pub kafka_brokers: Option<String>,

    #[arg(long, env = "OUTBOX_POLL_INTERVAL_MS", default_value_t = 500)]
    pub outbox_poll_interval_ms: u64,

    #[arg(long, env = "OUTBOX_BATCH_SIZE", default_value_t = 100)]
    pub outbox_batch_size: i64,

    #[arg(long, env = "OUTBOX_MAX_ATTEMPTS", default_value_t = 5)]
    pub outbox_max_attempts: i32,

    #[arg(long, env = "DEFAULT_PAGE_SIZE", default_value_t = 20)]
    pub default_page_size: u32,

    #[arg(long, env = "MAX_PAGE_SIZE", default_value_t = 100)]
    pub max_page_size: u32,

    #[arg(long, env = "METRICS_PORT", default_value_t = 9090)]
    pub metrics_port: u16,

    /// Used when RUST_LOG is not set.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Run the end-to-end demo flow after startup.
    #[arg(long, env = "RUN_DEMO", default_value_t = false)]
    pub run_demo: bool,
}

impl Config {
    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            default_page_size: self.default_page_size.max(1),
            max_page_size: self.max_page_size.max(1),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
        }
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs.max(1))
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            relay: OutboxRelayConfig {
                poll_interval: Duration::from_millis(self.outbox_poll_interval_ms),
                batch_size: self.outbox_batch_size,
                max_attempts: self.outbox_max_attempts,
                publish_retry: RetryConfig::default(),
            },
            ..CoordinatorConfig::default()
        }
    }

    /// Filter directive when RUST_LOG is absent.
    pub fn default_log_filter(&self) -> String {
        format!("{},commerce_cqrs=debug", self.log_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["commerce_cqrs"]);
        assert_eq!(config.max_page_size, 100);
        assert_eq!(config.outbox_max_attempts, 5);
        assert!(!config.run_demo);
        assert_eq!(config.cache_sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::parse_from([
            "commerce_cqrs",
            "--max-page-size",
            "0",
            "--cache-ttl-secs",
            "30",
            "--run-demo",
            "--cache-sweep-interval-secs",
            "0",
        ]);
        let settings = config.app_settings();
        assert_eq!(settings.max_page_size, 1);
        assert_eq!(settings.cache_ttl, Duration::from_secs(30));
        assert!(config.run_demo);
        assert_eq!(config.cache_sweep_interval(), Duration::from_secs(1));
    }
}
