use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use vex_core::{StoreConfig, DEFAULT_PARTITIONS};

use crate::env_utils::{parse_bool_env, parse_env};

const BIND_DEFAULT: &str = "0.0.0.0:6379";
const MAX_DIMENSION_DEFAULT: usize = 4096;
const MAX_TOPK_DEFAULT: usize = 10_000;
const MAX_CONNECTIONS_DEFAULT: usize = 10_000;
const IDLE_TIMEOUT_MS_DEFAULT: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    pub(crate) bind: SocketAddr,
    pub(crate) partitions: usize,
    pub(crate) strict_finite: bool,
    pub(crate) max_dimension: usize,
    pub(crate) max_topk: usize,
    pub(crate) max_connections: usize,
    pub(crate) idle_timeout_ms: u64,
    pub(crate) log_format: LogFormat,
}

impl AppConfig {
    pub(crate) fn from_env() -> Result<Self> {
        let bind = parse_env::<SocketAddr>(
            "VEX_BIND",
            BIND_DEFAULT.parse().context("default bind address must parse")?,
            "a valid socket address",
        )?;
        let partitions = parse_env("VEX_PARTITIONS", DEFAULT_PARTITIONS, "a positive integer")?;
        let strict_finite = parse_bool_env("VEX_STRICT_FINITE", true)?;
        let max_dimension =
            parse_env("VEX_MAX_DIMENSION", MAX_DIMENSION_DEFAULT, "a positive integer")?;
        let max_topk = parse_env("VEX_MAX_TOPK", MAX_TOPK_DEFAULT, "a positive integer")?;
        let max_connections =
            parse_env("VEX_MAX_CONNECTIONS", MAX_CONNECTIONS_DEFAULT, "a positive integer")?;
        let idle_timeout_ms =
            parse_env("VEX_IDLE_TIMEOUT_MS", IDLE_TIMEOUT_MS_DEFAULT, "a positive integer")?;
        let log_format = parse_log_format()?;

        if partitions == 0 {
            anyhow::bail!("VEX_PARTITIONS must be > 0");
        }
        if max_dimension == 0 {
            anyhow::bail!("VEX_MAX_DIMENSION must be > 0");
        }
        if max_topk == 0 {
            anyhow::bail!("VEX_MAX_TOPK must be > 0");
        }
        if max_connections == 0 {
            anyhow::bail!("VEX_MAX_CONNECTIONS must be > 0");
        }
        if idle_timeout_ms == 0 {
            anyhow::bail!("VEX_IDLE_TIMEOUT_MS must be > 0");
        }

        Ok(Self {
            bind,
            partitions,
            strict_finite,
            max_dimension,
            max_topk,
            max_connections,
            idle_timeout_ms,
            log_format,
        })
    }

    pub(crate) fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub(crate) fn store_config(&self) -> Result<StoreConfig> {
        StoreConfig::new(self.partitions, self.strict_finite).context("invalid store configuration")
    }
}

fn parse_log_format() -> Result<LogFormat> {
    let Ok(raw) = env::var("VEX_LOG_FORMAT") else {
        return Ok(LogFormat::Text);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "text" | "" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        _ => anyhow::bail!("VEX_LOG_FORMAT must be 'text' or 'json', got '{raw}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    const CONFIG_KEYS: &[&str] = &[
        "VEX_BIND",
        "VEX_PARTITIONS",
        "VEX_STRICT_FINITE",
        "VEX_MAX_DIMENSION",
        "VEX_MAX_TOPK",
        "VEX_MAX_CONNECTIONS",
        "VEX_IDLE_TIMEOUT_MS",
        "VEX_LOG_FORMAT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvGuard {
        saved: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn capture(keys: &[&str]) -> Self {
            let saved = keys
                .iter()
                .map(|key| ((*key).to_string(), env::var(key).ok()))
                .collect();
            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.saved {
                if let Some(value) = value {
                    env::set_var(key, value);
                } else {
                    env::remove_var(key);
                }
            }
        }
    }

    fn with_env<R>(pairs: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
        let _lock = env_lock()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let _guard = EnvGuard::capture(CONFIG_KEYS);

        for key in CONFIG_KEYS {
            env::remove_var(key);
        }
        for (key, value) in pairs {
            env::set_var(key, value);
        }

        f()
    }

    fn expect_error(pairs: &[(&str, &str)]) -> String {
        let error = with_env(pairs, || {
            AppConfig::from_env().expect_err("configuration must be rejected")
        });
        format!("{error:#}")
    }

    #[test]
    fn from_env_uses_expected_defaults() {
        let config = with_env(&[], || {
            AppConfig::from_env().expect("default config must parse")
        });
        assert_eq!(
            config.bind,
            "0.0.0.0:6379"
                .parse::<SocketAddr>()
                .expect("default bind should parse")
        );
        assert_eq!(config.partitions, 32);
        assert!(config.strict_finite);
        assert_eq!(config.max_dimension, 4096);
        assert_eq!(config.max_topk, 10_000);
        assert_eq!(config.max_connections, 10_000);
        assert_eq!(config.idle_timeout(), Duration::from_secs(60));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn from_env_applies_overrides() {
        let config = with_env(
            &[
                ("VEX_BIND", "127.0.0.1:7000"),
                ("VEX_PARTITIONS", "4"),
                ("VEX_STRICT_FINITE", "off"),
                ("VEX_MAX_DIMENSION", "128"),
                ("VEX_MAX_TOPK", "50"),
                ("VEX_MAX_CONNECTIONS", "3"),
                ("VEX_IDLE_TIMEOUT_MS", "250"),
                ("VEX_LOG_FORMAT", "JSON"),
            ],
            || AppConfig::from_env().expect("override config must parse"),
        );
        assert_eq!(
            config.bind,
            "127.0.0.1:7000"
                .parse::<SocketAddr>()
                .expect("override bind should parse")
        );
        assert_eq!(config.partitions, 4);
        assert!(!config.strict_finite);
        assert_eq!(config.max_dimension, 128);
        assert_eq!(config.max_topk, 50);
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.idle_timeout(), Duration::from_millis(250));
        assert_eq!(config.log_format, LogFormat::Json);

        let store_config = config.store_config().expect("store config must build");
        assert_eq!(store_config.partitions, 4);
        assert!(!store_config.strict_finite);
    }

    #[test]
    fn from_env_rejects_zero_limits() {
        for key in [
            "VEX_PARTITIONS",
            "VEX_MAX_DIMENSION",
            "VEX_MAX_TOPK",
            "VEX_MAX_CONNECTIONS",
            "VEX_IDLE_TIMEOUT_MS",
        ] {
            let message = expect_error(&[(key, "0")]);
            assert!(
                message.contains(&format!("{key} must be > 0")),
                "unexpected message for {key}: {message}"
            );
        }
    }

    #[test]
    fn from_env_rejects_non_numeric_values() {
        let message = expect_error(&[("VEX_MAX_TOPK", "many")]);
        assert!(message.contains("VEX_MAX_TOPK must be a positive integer, got 'many'"));

        let message = expect_error(&[("VEX_PARTITIONS", "-1")]);
        assert!(message.contains("VEX_PARTITIONS must be a positive integer"));
    }

    #[test]
    fn from_env_rejects_invalid_bind() {
        let message = expect_error(&[("VEX_BIND", "localhost")]);
        assert!(message.contains("VEX_BIND must be a valid socket address"));
    }

    #[test]
    fn from_env_rejects_invalid_bool() {
        let message = expect_error(&[("VEX_STRICT_FINITE", "not-a-bool")]);
        assert!(message.contains("VEX_STRICT_FINITE must be a boolean"));
    }

    #[test]
    fn from_env_rejects_unknown_log_format() {
        let message = expect_error(&[("VEX_LOG_FORMAT", "yaml")]);
        assert!(message.contains("VEX_LOG_FORMAT must be 'text' or 'json'"));
    }
}
