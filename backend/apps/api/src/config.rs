//! Server configuration from the environment

use anyhow::Context;
use chrono::FixedOffset;
use gate::GateConfig;
use gate::domain::value_objects::UserId;
use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Where the ledger lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Postgres { database_url: String },
    JsonFiles { dir: PathBuf },
}

/// Account lookup client settings
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_concurrent: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Loopback unless `BIND_ADDR` says otherwise
    pub bind_addr: IpAddr,
    pub port: u16,
    pub gate: GateConfig,
    pub storage: StorageConfig,
    pub lookup: LookupConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any variable source; blank values count as unset
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let mut gate = GateConfig::default();
        if let Some(admin) = var("GATE_ADMIN_ID") {
            gate.admin_id = Some(UserId::new(admin).context("GATE_ADMIN_ID is blank")?);
        }
        if let Some(limit) = parse(&var, "GATE_USER_DAILY_LIMIT")? {
            gate.user_daily_limit = limit;
        }
        if let Some(limit) = parse(&var, "GATE_IP_DAILY_LIMIT")? {
            gate.ip_daily_limit = limit;
        }
        if let Some(secs) = parse(&var, "GATE_CHALLENGE_TTL_SECS")? {
            gate.challenge_ttl = Duration::from_secs(secs);
        }
        if let Some(offset) = parse::<FixedOffset>(&var, "GATE_DAY_OFFSET")? {
            gate.day_offset = offset;
        }
        gate.service_token = var("GATE_SERVICE_TOKEN").map(|token| token.trim().to_string());

        let storage = match var("DATABASE_URL") {
            Some(database_url) => StorageConfig::Postgres { database_url },
            None => StorageConfig::JsonFiles {
                dir: PathBuf::from(var("GATE_DATA_DIR").unwrap_or_else(|| "./data".to_string())),
            },
        };

        let lookup = LookupConfig {
            base_url: var("LOOKUP_SERVICE_URL")
                .unwrap_or_else(|| "http://127.0.0.1:3000".to_string()),
            timeout: Duration::from_secs(parse(&var, "LOOKUP_TIMEOUT_SECS")?.unwrap_or(60)),
            max_concurrent: parse(&var, "LOOKUP_MAX_CONCURRENT")?.unwrap_or(1),
        };

        Ok(Self {
            bind_addr: parse(&var, "BIND_ADDR")?.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            port: parse(&var, "PORT")?.unwrap_or(3000),
            gate,
            storage,
            lookup,
        })
    }
}

fn parse<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("invalid {key}={raw}: {e}"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.bind_addr, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.port, 3000);
        assert!(config.gate.service_token.is_none());
        assert_eq!(config.gate.user_daily_limit, 10);
        assert_eq!(config.gate.ip_daily_limit, 20);
        assert!(config.gate.admin_id.is_none());
        assert_eq!(
            config.storage,
            StorageConfig::JsonFiles {
                dir: PathBuf::from("./data")
            }
        );
        assert_eq!(config.lookup.max_concurrent, 1);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("GATE_ADMIN_ID", "123456"),
            ("GATE_USER_DAILY_LIMIT", "5"),
            ("GATE_CHALLENGE_TTL_SECS", "60"),
            ("GATE_DAY_OFFSET", "+07:00"),
            ("DATABASE_URL", "postgres://localhost/gate"),
            ("GATE_SERVICE_TOKEN", " s3cret "),
            ("BIND_ADDR", "0.0.0.0"),
            ("PORT", "8080"),
        ])
        .unwrap();

        assert_eq!(config.gate.admin_id.unwrap().as_str(), "123456");
        assert_eq!(config.gate.user_daily_limit, 5);
        assert_eq!(config.gate.challenge_ttl, Duration::from_secs(60));
        assert_eq!(config.gate.day_offset.local_minus_utc(), 7 * 3600);
        assert!(matches!(config.storage, StorageConfig::Postgres { .. }));
        assert_eq!(config.gate.service_token.as_deref(), Some("s3cret"));
        assert_eq!(config.bind_addr, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_number_is_error() {
        let err = config(&[("GATE_IP_DAILY_LIMIT", "twenty")]).unwrap_err();
        assert!(err.to_string().contains("GATE_IP_DAILY_LIMIT"));
    }

    #[test]
    fn test_blank_is_unset() {
        let config = config(&[
            ("GATE_ADMIN_ID", "  "),
            ("GATE_SERVICE_TOKEN", " "),
            ("DATABASE_URL", ""),
        ])
        .unwrap();

        assert!(config.gate.admin_id.is_none());
        assert!(config.gate.service_token.is_none());
        assert!(matches!(config.storage, StorageConfig::JsonFiles { .. }));
    }
}
