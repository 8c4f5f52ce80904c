//! Gateway configuration: environment variables, an optional TOML overlay
//! and start-up validation.

use anyhow::{Context, Result, bail};
use geomirror_upstream::UpstreamConfig;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_DATABASE_PATH: &str = "geomirror.db";

/// Gateway configuration sourced from environment variables and an optional
/// TOML file.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    /// Shared key every mutating request must present in `X-API-KEY`.
    pub api_key: String,
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Default, Deserialize)]
struct GatewayConfigOverride {
    bind_addr: Option<String>,
    database_path: Option<String>,
    api_key: Option<String>,
    upstream: Option<UpstreamConfigOverride>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamConfigOverride {
    base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout_secs: Option<u64>,
    default_layer_id: Option<u64>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("GEOMIRROR_BIND")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .with_context(|| "parse GEOMIRROR_BIND")?;
        let database_path = std::env::var("GEOMIRROR_DATABASE_PATH")
            .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string())
            .into();
        let api_key = std::env::var("GEOMIRROR_API_KEY").unwrap_or_default();

        let mut upstream = UpstreamConfig::default();
        if let Ok(value) = std::env::var("GEOMIRROR_UPSTREAM_URL") {
            upstream.base_url = value;
        }
        if let Ok(value) = std::env::var("GEOMIRROR_UPSTREAM_USERNAME") {
            upstream.username = value;
        }
        if let Ok(value) = std::env::var("GEOMIRROR_UPSTREAM_PASSWORD") {
            upstream.password = value;
        }
        if let Ok(value) = std::env::var("GEOMIRROR_UPSTREAM_TIMEOUT_SECS") {
            upstream.timeout_secs = value
                .parse()
                .with_context(|| "parse GEOMIRROR_UPSTREAM_TIMEOUT_SECS")?;
        }
        if let Ok(value) = std::env::var("GEOMIRROR_LAYER_ID") {
            upstream.default_layer_id = value.parse().with_context(|| "parse GEOMIRROR_LAYER_ID")?;
        }

        Ok(Self {
            bind_addr,
            database_path,
            api_key,
            upstream,
        })
    }

    /// Environment first, then the TOML file named by `GEOMIRROR_CONFIG`
    /// (if set) overrides whatever it specifies.
    pub fn from_env_or_file() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("GEOMIRROR_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read GEOMIRROR_CONFIG: {path}"))?;
            config.apply_toml(&contents)?;
        }
        Ok(config)
    }

    fn apply_toml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: GatewayConfigOverride =
            toml::from_str(contents).with_context(|| "parse gateway config toml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.database_path {
            self.database_path = value.into();
        }
        if let Some(value) = override_cfg.api_key {
            self.api_key = value;
        }
        if let Some(upstream) = override_cfg.upstream {
            if let Some(value) = upstream.base_url {
                self.upstream.base_url = value;
            }
            if let Some(value) = upstream.username {
                self.upstream.username = value;
            }
            if let Some(value) = upstream.password {
                self.upstream.password = value;
            }
            if let Some(value) = upstream.timeout_secs {
                self.upstream.timeout_secs = value;
            }
            if let Some(value) = upstream.default_layer_id {
                self.upstream.default_layer_id = value;
            }
        }
        Ok(())
    }

    /// Rejects configurations the gateway cannot serve with.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            bail!("GEOMIRROR_API_KEY must be set");
        }
        if self.upstream.timeout_secs == 0 {
            bail!("upstream timeout must be at least one second");
        }
        if self.upstream.base_url.is_empty() {
            bail!("upstream base url must be set");
        }
        Ok(())
    }
}
