//! Data-access capability consumed by the word services

use crate::models::{Frequency, WordRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The store reported a failure (connection, SQL, HTTP status).
    #[error("{0}")]
    Backend(String),

    /// The store answered with rows that do not fit the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..) => RepositoryError::Decode(e.to_string()),
            _ => RepositoryError::Backend(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for RepositoryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RepositoryError::Decode(e.to_string())
        } else {
            RepositoryError::Backend(e.to_string())
        }
    }
}

/// Word columns a search may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    EnglishTerm,
    PrimaryArabicScript,
    PartOfSpeech,
    GeneralFrequencyTag,
    Id,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::EnglishTerm => "english_term",
            SortField::PrimaryArabicScript => "primary_arabic_script",
            SortField::PartOfSpeech => "part_of_speech",
            SortField::GeneralFrequencyTag => "general_frequency_tag",
            SortField::Id => "id",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "english_term" => Ok(SortField::EnglishTerm),
            "primary_arabic_script" => Ok(SortField::PrimaryArabicScript),
            "part_of_speech" => Ok(SortField::PartOfSpeech),
            "general_frequency_tag" => Ok(SortField::GeneralFrequencyTag),
            "id" => Ok(SortField::Id),
            other => Err(format!("unknown sort column '{}'", other)),
        }
    }
}

/// A filtered, sorted, paginated word query.
///
/// Prefix filters are case-insensitive, the remaining filters are exact, and
/// every supplied filter must hold. Only words with at least one form carrying
/// at least one dialect are eligible, and only such forms are returned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordQuery {
    pub english_prefix: Option<String>,
    pub arabic_prefix: Option<String>,
    pub part_of_speech: Option<String>,
    pub frequency: Option<Frequency>,
    pub sort: SortField,
    pub offset: u64,
    pub limit: u64,
}

#[async_trait]
pub trait WordRepository: Send + Sync {
    /// Run a word query, returning one page of rows and the total number of matches.
    async fn query_words(&self, query: &WordQuery) -> Result<(Vec<WordRecord>, u64), RepositoryError>;

    /// Fetch a single word with its forms and dialects by primary key.
    async fn fetch_word(&self, id: &str) -> Result<Option<WordRecord>, RepositoryError>;

    /// Short name used in logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// Escape `%`, `_` and `\` so user text is matched literally by `LIKE ... ESCAPE '\'`.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive prefix test used by in-process stores.
pub fn has_prefix_ignore_case(candidate: &str, prefix: &str) -> bool {
    candidate.to_lowercase().starts_with(&prefix.to_lowercase())
}
