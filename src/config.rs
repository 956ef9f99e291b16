use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::PowerFlowError;
use crate::orchestrator::PollSettings;
use crate::results::HeaderAliases;
use crate::telemetry::LoggingConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub runner: RunnerConfig,
    pub polling: PollingConfig,
    pub models: ModelsConfig,
    pub headers: HeadersConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_secs: 300,
            enable_cors: false,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub base_url: String,
    pub token: String,
    pub http_timeout_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cloudpss.net/".to_string(),
            token: String::new(),
            http_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 300,
            timeout_secs: 180,
        }
    }
}

impl PollingConfig {
    pub fn settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.interval_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub default_rid: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            default_rid: "model/CloudPSS/IEEE3".to_string(),
        }
    }
}

/// Extra raw label -> alias entries layered over the built-in table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadersConfig {
    pub aliases: HashMap<String, String>,
}

impl HeadersConfig {
    pub fn header_aliases(&self) -> HeaderAliases {
        HeaderAliases::power_flow().with_overrides(self.aliases.clone())
    }
}

impl Config {
    /// Defaults, then `config/default.toml`, then `CLOUDPSS_*`, then `PFB__*` variables.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(
                Env::raw()
                    .only(&["CLOUDPSS_TOKEN", "CLOUDPSS_API_URL"])
                    .map(|key| {
                        if key.as_str().eq_ignore_ascii_case("CLOUDPSS_TOKEN") {
                            "runner.token".into()
                        } else {
                            "runner.base_url".into()
                        }
                    }),
            )
            .merge(Env::prefixed("PFB__").split("__"))
    }

    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let cfg: Config = Self::figment()
            .extract()
            .context("failed to read configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), PowerFlowError> {
        let token = self.runner.token.trim();
        if token.is_empty() || token.starts_with("__SET_VIA_ENV") {
            return Err(PowerFlowError::Configuration(
                "runner token is not set; export CLOUDPSS_TOKEN or PFB__RUNNER__TOKEN".to_string(),
            ));
        }
        if self.polling.interval_ms == 0 {
            return Err(PowerFlowError::Configuration(
                "polling.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.polling.timeout_secs == 0 {
            return Err(PowerFlowError::Configuration(
                "polling.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.server.request_timeout_secs <= self.polling.timeout_secs {
            return Err(PowerFlowError::Configuration(format!(
                "server.request_timeout_secs ({}) must exceed polling.timeout_secs ({})",
                self.server.request_timeout_secs, self.polling.timeout_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file_or_env() {
        Jail::expect_with(|_jail| {
            let cfg: Config = Config::figment().extract()?;
            assert_eq!(cfg.server.port, 5000);
            assert_eq!(cfg.runner.base_url, "https://cloudpss.net/");
            assert_eq!(cfg.models.default_rid, "model/CloudPSS/IEEE3");
            assert_eq!(cfg.polling.settings(), PollSettings::default());
            assert!(cfg.validate().is_err());
            Ok(())
        });
    }

    #[test]
    fn test_legacy_env_variables() {
        Jail::expect_with(|jail| {
            jail.set_env("CLOUDPSS_TOKEN", "tok-abc");
            jail.set_env("CLOUDPSS_API_URL", "https://internal.example/");
            let cfg: Config = Config::figment().extract()?;
            assert_eq!(cfg.runner.token, "tok-abc");
            assert_eq!(cfg.runner.base_url, "https://internal.example/");
            assert!(cfg.validate().is_ok());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_prefixed_env() {
        Jail::expect_with(|jail| {
            std::fs::create_dir_all(jail.directory().join("config")).map_err(|e| e.to_string())?;
            jail.create_file(
                "config/default.toml",
                r#"
                [server]
                port = 8080

                [runner]
                token = "from-file"

                [polling]
                interval_ms = 500

                [headers.aliases]
                "<i>T</i> / degC" = "T(degC)"
                "#,
            )?;
            jail.set_env("PFB__POLLING__TIMEOUT_SECS", "60");
            jail.set_env("PFB__RUNNER__TOKEN", "from-env");

            let cfg: Config = Config::figment().extract()?;
            assert_eq!(cfg.server.port, 8080);
            assert_eq!(cfg.server.host, "127.0.0.1");
            assert_eq!(cfg.runner.token, "from-env");
            assert_eq!(
                cfg.polling.settings(),
                PollSettings {
                    interval: Duration::from_millis(500),
                    timeout: Duration::from_secs(60),
                }
            );
            let aliases = cfg.headers.header_aliases();
            assert_eq!(aliases.get("<i>T</i> / degC"), Some("T(degC)"));
            assert_eq!(aliases.get("<i>V</i><sub>m</sub> / pu"), Some("Vm(pu)"));
            Ok(())
        });
    }

    #[test]
    fn test_validation_rejects_zero_polling() {
        let mut cfg = Config::default();
        cfg.runner.token = "t".into();
        assert!(cfg.validate().is_ok());
        cfg.polling.interval_ms = 0;
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[test]
    fn test_request_timeout_must_exceed_poll_timeout() {
        let mut cfg = Config::default();
        cfg.runner.token = "t".into();
        cfg.polling.timeout_secs = 300;
        cfg.server.request_timeout_secs = 300;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("server.request_timeout_secs (300)"));

        cfg.server.request_timeout_secs = 301;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_placeholder_token_is_rejected() {
        let mut cfg = Config::default();
        cfg.runner.token = "__SET_VIA_ENV__".into();
        assert!(cfg.validate().is_err());
    }
}
