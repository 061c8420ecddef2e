//! Qamus - Arabic Vocabulary Dictionary
//!
//! Backend library providing word search, word details and account operations.

pub mod error;
pub mod models;
pub mod validation;
pub mod repository;
pub mod seed;
pub mod memory;
pub mod sqlite;
pub mod supabase;
pub mod auth;
pub mod search;
pub mod detail;
pub mod sequence;
pub mod service;
pub mod config;
pub mod state;

pub use error::{FieldViolation, QamusError};
pub use models::{
    Definition, Dialect, FormView, Frequency, PageResult, Pagination, WordDetail, WordFormRecord,
    WordFormSummary, WordRecord, WordSummary,
};
pub use validation::{parse_int_param, SearchCriteria, WordsQueryParams};
pub use repository::{RepositoryError, SortField, WordQuery, WordRepository};
pub use seed::SeedData;
pub use memory::InMemoryWordRepository;
pub use sqlite::SqliteWordRepository;
pub use supabase::{SupabaseClient, SupabaseConfig};
pub use auth::{AuthCommand, AuthProvider, AuthResponse, AuthService, UserInfo};
pub use search::{classify_search_text, search_words, SearchText};
pub use detail::word_details;
pub use sequence::{SearchSequencer, SearchTicket};
pub use service::WordService;
pub use config::{BackendConfig, Config};
pub use state::AppState;
