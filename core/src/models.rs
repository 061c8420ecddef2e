//! Word, form and dialect types
//!
//! `*Record` types mirror the nested join returned by a data-access
//! collaborator (words → word_forms → word_form_dialects → dialects).
//! The remaining types are the view models handed to callers.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse usage-frequency classification of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    VeryFrequent,
    Frequent,
    Common,
    Uncommon,
    Rare,
    #[default]
    NotDefined,
}

impl Frequency {
    pub const ALL: [Frequency; 6] = [
        Frequency::VeryFrequent,
        Frequency::Frequent,
        Frequency::Common,
        Frequency::Uncommon,
        Frequency::Rare,
        Frequency::NotDefined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::VeryFrequent => "VERY_FREQUENT",
            Frequency::Frequent => "FREQUENT",
            Frequency::Common => "COMMON",
            Frequency::Uncommon => "UNCOMMON",
            Frequency::Rare => "RARE",
            Frequency::NotDefined => "NOT_DEFINED",
        }
    }

    /// Position in the declared tag order, most frequent first.
    pub fn rank(&self) -> usize {
        Frequency::ALL.iter().position(|tag| tag == self).unwrap_or(Frequency::ALL.len())
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFrequency(pub String);

impl fmt::Display for UnknownFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown frequency tag '{}'", self.0)
    }
}

impl std::error::Error for UnknownFrequency {}

impl FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| UnknownFrequency(s.to_string()))
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: UnknownFrequency| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dialect {
    pub id: String,
    pub name: String,
    pub country_code: String,
}

/// Join row between a word form and one of its dialects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDialectRecord {
    pub dialects: Dialect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFormRecord {
    pub id: String,
    #[serde(default)]
    pub word_id: Option<String>,
    pub transliteration: String,
    #[serde(default)]
    pub arabic_script_variant: Option<String>,
    pub conjugation_details: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub word_form_dialects: Vec<FormDialectRecord>,
}

impl WordFormRecord {
    pub fn dialects(&self) -> impl Iterator<Item = &Dialect> {
        self.word_form_dialects.iter().map(|link| &link.dialects)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    pub id: String,
    pub primary_arabic_script: String,
    pub english_term: String,
    pub part_of_speech: String,
    #[serde(default)]
    pub english_definition: Option<String>,
    #[serde(default)]
    pub general_frequency_tag: Frequency,
    #[serde(default)]
    pub word_forms: Vec<WordFormRecord>,
}

// === View models ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFormSummary {
    pub id: String,
    pub transliteration: String,
    pub conjugation_details: String,
    pub audio_url: Option<String>,
}

impl From<&WordFormRecord> for WordFormSummary {
    fn from(form: &WordFormRecord) -> Self {
        Self {
            id: form.id.clone(),
            transliteration: form.transliteration.clone(),
            conjugation_details: form.conjugation_details.clone(),
            audio_url: form.audio_url.clone(),
        }
    }
}

/// A word as listed in search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordSummary {
    pub id: String,
    pub primary_arabic_script: String,
    pub english_term: String,
    pub part_of_speech: String,
    pub english_definition: Option<String>,
    pub general_frequency_tag: Frequency,
    pub word_forms: Vec<WordFormSummary>,
    pub dialects: Vec<Dialect>,
}

/// One word form flattened for the detail view, carrying a single dialect code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormView {
    pub id: String,
    pub arabic_script: String,
    pub transliteration: String,
    pub conjugation: String,
    pub dialect: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub id: u32,
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordDetail {
    pub id: String,
    pub primary_arabic_script: String,
    pub english_term: String,
    pub part_of_speech: String,
    pub english_definition: Option<String>,
    pub general_frequency_tag: Frequency,
    pub word_forms: Vec<WordFormSummary>,
    pub dialects: Vec<Dialect>,
    pub forms: Vec<FormView>,
    pub frequency_tags: Vec<Frequency>,
    pub usage_regions: Vec<String>,
    pub definitions: Vec<Definition>,
    pub educational_notes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PageResult<T> {
    pub fn empty(page: u32, limit: u32) -> Self {
        Self {
            data: Vec::new(),
            pagination: Pagination {
                page,
                limit,
                total: 0,
            },
        }
    }
}
