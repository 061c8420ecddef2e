//! Word search: criteria → repository query → page of summaries

use crate::error::QamusError;
use crate::models::{Dialect, PageResult, Pagination, WordFormSummary, WordRecord, WordSummary};
use crate::repository::{RepositoryError, WordQuery, WordRepository};
use crate::validation::{SearchCriteria, WordsQueryParams};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Shortest search text worth sending while the user is typing.
pub const MIN_SEARCH_CHARS: usize = 2;

/// How a piece of search-box text should be handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchText {
    /// Box cleared: show the initial, unfiltered page again.
    Reset,
    /// Not enough characters yet; issue nothing.
    TooShort,
    Arabic(String),
    English(String),
}

fn is_arabic_char(c: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&c)
}

pub fn classify_search_text(text: &str) -> SearchText {
    if text.is_empty() {
        return SearchText::Reset;
    }
    if text.chars().count() < MIN_SEARCH_CHARS {
        return SearchText::TooShort;
    }
    if text.chars().any(is_arabic_char) {
        SearchText::Arabic(text.to_string())
    } else {
        SearchText::English(text.to_string())
    }
}

impl SearchText {
    /// Search parameters for this text, or `None` when nothing should be sent.
    pub fn to_params(&self) -> Option<WordsQueryParams> {
        match self {
            SearchText::Reset => Some(WordsQueryParams::default()),
            SearchText::TooShort => None,
            SearchText::Arabic(text) => Some(WordsQueryParams {
                arabic: Some(text.clone()),
                ..WordsQueryParams::default()
            }),
            SearchText::English(text) => Some(WordsQueryParams {
                english: Some(text.clone()),
                ..WordsQueryParams::default()
            }),
        }
    }
}

pub fn build_query(criteria: &SearchCriteria) -> WordQuery {
    WordQuery {
        english_prefix: criteria.english.clone(),
        arabic_prefix: criteria.arabic.clone(),
        part_of_speech: criteria.part_of_speech.clone(),
        frequency: criteria.frequency,
        sort: criteria.sort_by,
        offset: criteria.offset(),
        limit: u64::from(criteria.limit),
    }
}

/// Distinct dialects across a word's forms, keyed by id, in first-seen order.
pub fn distinct_dialects_by_id(word: &WordRecord) -> Vec<Dialect> {
    let mut seen = HashSet::new();
    word.word_forms
        .iter()
        .flat_map(|form| form.dialects())
        .filter(|d| seen.insert(d.id.as_str()))
        .cloned()
        .collect()
}

pub fn summarize(word: &WordRecord) -> WordSummary {
    WordSummary {
        id: word.id.clone(),
        primary_arabic_script: word.primary_arabic_script.clone(),
        english_term: word.english_term.clone(),
        part_of_speech: word.part_of_speech.clone(),
        english_definition: word.english_definition.clone(),
        general_frequency_tag: word.general_frequency_tag,
        word_forms: word.word_forms.iter().map(WordFormSummary::from).collect(),
        dialects: distinct_dialects_by_id(word),
    }
}

pub(crate) fn fetch_error(what: &str, e: RepositoryError) -> QamusError {
    warn!(error = %e, "{} failed", what);
    match e {
        RepositoryError::Backend(message) => QamusError::FetchFailed(format!("{}: {}", what, message)),
        RepositoryError::Decode(message) => QamusError::Unexpected(message),
    }
}

/// Validate `params` and run one page of the word search.
///
/// With no filter at all the result is an empty page and the repository is
/// never consulted, so an idle search box never lists the whole dictionary.
pub async fn search_words(
    repo: &dyn WordRepository,
    params: &WordsQueryParams,
) -> Result<PageResult<WordSummary>, QamusError> {
    let criteria = params.validate()?;

    if !criteria.has_filters() {
        return Ok(PageResult::empty(criteria.page, criteria.limit));
    }

    let query = build_query(&criteria);
    debug!(?query, backend = repo.backend_name(), "searching words");

    let (rows, total) = repo
        .query_words(&query)
        .await
        .map_err(|e| fetch_error("words", e))?;

    Ok(PageResult {
        data: rows.iter().map(summarize).collect(),
        pagination: Pagination {
            page: criteria.page,
            limit: criteria.limit,
            total,
        },
    })
}
