//! In-memory word store, used as a substitute backend in tests and demos

use crate::models::WordRecord;
use crate::repository::{has_prefix_ignore_case, RepositoryError, SortField, WordQuery, WordRepository};
use crate::seed::SeedData;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

pub struct InMemoryWordRepository {
    words: Vec<WordRecord>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl InMemoryWordRepository {
    pub fn from_seed(seed: &SeedData) -> Self {
        Self {
            words: seed.inner_joined(),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with `message` as a backend error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            words: Vec::new(),
            failure: Some(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of queries issued against this store.
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    fn begin_call(&self) -> Result<(), RepositoryError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        match &self.failure {
            Some(message) => Err(RepositoryError::Backend(message.clone())),
            None => Ok(()),
        }
    }

    fn matches(word: &WordRecord, query: &WordQuery) -> bool {
        if let Some(prefix) = &query.english_prefix {
            if !has_prefix_ignore_case(&word.english_term, prefix) {
                return false;
            }
        }
        if let Some(prefix) = &query.arabic_prefix {
            if !has_prefix_ignore_case(&word.primary_arabic_script, prefix) {
                return false;
            }
        }
        if let Some(pos) = &query.part_of_speech {
            if &word.part_of_speech != pos {
                return false;
            }
        }
        if let Some(frequency) = query.frequency {
            if word.general_frequency_tag != frequency {
                return false;
            }
        }
        true
    }

    fn compare(a: &WordRecord, b: &WordRecord, sort: SortField) -> Ordering {
        let primary = match sort {
            SortField::EnglishTerm => a.english_term.cmp(&b.english_term),
            SortField::PrimaryArabicScript => a.primary_arabic_script.cmp(&b.primary_arabic_script),
            SortField::PartOfSpeech => a.part_of_speech.cmp(&b.part_of_speech),
            SortField::GeneralFrequencyTag => a
                .general_frequency_tag
                .rank()
                .cmp(&b.general_frequency_tag.rank()),
            SortField::Id => Ordering::Equal,
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

#[async_trait]
impl WordRepository for InMemoryWordRepository {
    async fn query_words(&self, query: &WordQuery) -> Result<(Vec<WordRecord>, u64), RepositoryError> {
        self.begin_call()?;

        let mut matched: Vec<&WordRecord> =
            self.words.iter().filter(|w| Self::matches(w, query)).collect();
        matched.sort_by(|a, b| Self::compare(a, b, query.sort));

        let total = matched.len() as u64;
        let page = matched
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn fetch_word(&self, id: &str) -> Result<Option<WordRecord>, RepositoryError> {
        self.begin_call()?;
        Ok(self.words.iter().find(|w| w.id == id).cloned())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
