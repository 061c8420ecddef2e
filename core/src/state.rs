//! Application state management

use crate::auth::AuthService;
use crate::config::{BackendConfig, Config};
use crate::repository::WordRepository;
use crate::seed::SeedData;
use crate::service::WordService;
use crate::sqlite::SqliteWordRepository;
use crate::supabase::SupabaseClient;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Services shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub words: WordService,
    /// Only the hosted backend offers accounts.
    pub auth: Option<AuthService>,
}

impl AppState {
    /// Open the configured backend
    pub fn new(config: &Config) -> Result<Self> {
        match &config.backend {
            BackendConfig::Sqlite { db_path, seed_path } => {
                let repo = SqliteWordRepository::open(db_path)?;
                if let Some(seed_path) = seed_path {
                    let seed = SeedData::from_json_file(seed_path)?;
                    repo.import(&seed)?;
                    info!(path = ?seed_path, words = seed.words.len(), "imported seed document");
                }
                info!(path = ?db_path, "using sqlite word store");
                Ok(Self::from_repository(Arc::new(repo)))
            }
            BackendConfig::Supabase(supabase) => {
                let client = Arc::new(SupabaseClient::new(supabase)?);
                info!(url = %supabase.url, "using supabase backend");
                Ok(Self {
                    words: WordService::new(client.clone()),
                    auth: Some(AuthService::new(client)),
                })
            }
        }
    }

    /// State over a bare word store, with accounts disabled.
    pub fn from_repository(repo: Arc<dyn WordRepository>) -> Self {
        Self {
            words: WordService::new(repo),
            auth: None,
        }
    }
}
