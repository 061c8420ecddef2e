//! Runtime configuration read from the environment

use crate::supabase::SupabaseConfig;
use anyhow::{anyhow, Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_DB_PATH: &str = "data/qamus.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Sqlite {
        db_path: PathBuf,
        seed_path: Option<PathBuf>,
    },
    Supabase(SupabaseConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub backend: BackendConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind = get("QAMUS_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr: SocketAddr = bind
            .parse()
            .with_context(|| format!("QAMUS_BIND is not a socket address: {}", bind))?;

        let supabase_url = get("SUPABASE_URL");
        let backend_name = get("QAMUS_BACKEND").unwrap_or_else(|| {
            if supabase_url.is_some() { "supabase" } else { "sqlite" }.to_string()
        });

        let backend = match backend_name.to_ascii_lowercase().as_str() {
            "sqlite" => BackendConfig::Sqlite {
                db_path: get("QAMUS_DB_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
                seed_path: get("QAMUS_SEED_PATH").map(PathBuf::from),
            },
            "supabase" => BackendConfig::Supabase(SupabaseConfig {
                url: supabase_url.ok_or_else(|| anyhow!("SUPABASE_URL is required for the supabase backend"))?,
                anon_key: get("SUPABASE_ANON_KEY")
                    .ok_or_else(|| anyhow!("SUPABASE_ANON_KEY is required for the supabase backend"))?,
                service_role_key: get("SUPABASE_SERVICE_ROLE_KEY"),
            }),
            other => return Err(anyhow!("Unknown QAMUS_BACKEND '{}' (expected sqlite or supabase)", other)),
        };

        Ok(Self { bind_addr, backend })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_to_local_sqlite() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND.parse().unwrap());
        assert_eq!(
            config.backend,
            BackendConfig::Sqlite {
                db_path: PathBuf::from(DEFAULT_DB_PATH),
                seed_path: None,
            }
        );
    }

    #[test]
    fn test_supabase_selected_by_url() {
        let config = config(&[
            ("SUPABASE_URL", "https://example.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ])
        .unwrap();
        match config.backend {
            BackendConfig::Supabase(sb) => {
                assert_eq!(sb.url, "https://example.supabase.co");
                assert!(sb.service_role_key.is_none());
            }
            other => panic!("expected supabase backend, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_key_and_unknown_backend_rejected() {
        assert!(config(&[("SUPABASE_URL", "https://example.supabase.co")]).is_err());
        assert!(config(&[("QAMUS_BACKEND", "postgres")]).is_err());
        assert!(config(&[("QAMUS_BIND", "localhost")]).is_err());
    }
}
