//! Service configuration types and loading logic.

use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use redir_tracing::TracingConfig;
use serde::Deserialize;

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub finder: FinderConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

/// HTTP listen configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

/// Location manager the baseline lookups are sent to.
#[derive(Debug, Clone, Deserialize)]
pub struct FinderConfig {
    pub manager_url: String,

    #[serde(default = "default_finder_timeout")]
    pub timeout_secs: u64,
}

/// Where the locate policy comes from and how targets are classified.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Line-oriented directive file holding `redirlocal.readonlyredirect`
    /// and `oss.localroot`.
    #[serde(default = "default_directive_file")]
    pub directive_file: PathBuf,

    /// Resolve host-name targets so they can be classified.
    #[serde(default = "default_true")]
    pub resolve_hostnames: bool,
}

fn default_listen_address() -> String {
    "0.0.0.0:3094".to_string()
}

fn default_finder_timeout() -> u64 {
    30
}

fn default_directive_file() -> PathBuf {
    PathBuf::from("/etc/xrootd/xrootd.cfg")
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            directive_file: default_directive_file(),
            resolve_hostnames: true,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. `REDIR_MANAGER_URL`
    /// 2. Environment variables (REDIR_ prefix, __ for nesting)
    /// 3. TOML config file
    /// 4. Defaults
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(config_path))
                .merge(Env::prefixed("REDIR_").split("__")),
        )
    }

    fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let mut figment = figment;
        if let Ok(url) = std::env::var("REDIR_MANAGER_URL") {
            figment = figment.merge(Serialized::default("finder.manager_url", url));
        }
        Ok(figment.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            [finder]
            manager_url = "http://manager:3095"
            "#,
        ));
        let config = ServiceConfig::from_figment(figment).unwrap();
        assert_eq!(config.finder.manager_url, "http://manager:3095");
        assert_eq!(config.finder.timeout_secs, 30);
        assert_eq!(config.server.listen_address, "0.0.0.0:3094");
        assert!(config.policy.resolve_hostnames);
        assert_eq!(config.tracing.service_name, "redir-local");
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            [server]
            listen_address = "127.0.0.1:9000"

            [finder]
            manager_url = "http://10.0.0.1:3095"
            timeout_secs = 5

            [policy]
            directive_file = "/opt/site/redir.cfg"
            resolve_hostnames = false

            [tracing]
            log_level = "redir_local=debug"
            format = "json"
            "#,
        ));
        let config = ServiceConfig::from_figment(figment).unwrap();
        assert_eq!(config.server.listen_address, "127.0.0.1:9000");
        assert_eq!(config.finder.timeout_secs, 5);
        assert_eq!(config.policy.directive_file, PathBuf::from("/opt/site/redir.cfg"));
        assert!(!config.policy.resolve_hostnames);
        assert_eq!(config.tracing.format, redir_tracing::LogFormat::Json);
    }

    #[test]
    fn test_manager_url_is_required() {
        let figment = Figment::new().merge(Toml::string("[server]\nlisten_address = \"0.0.0.0:1\"\n"));
        if std::env::var("REDIR_MANAGER_URL").is_err() {
            assert!(ServiceConfig::from_figment(figment).is_err());
        }
    }
}
