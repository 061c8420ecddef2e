//! Word lookup service handed to callers

use crate::detail::word_details;
use crate::error::QamusError;
use crate::models::{PageResult, WordDetail, WordSummary};
use crate::repository::WordRepository;
use crate::search::{classify_search_text, search_words};
use crate::sequence::SearchSequencer;
use crate::validation::WordsQueryParams;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct WordService {
    repo: Arc<dyn WordRepository>,
    sequencer: Arc<SearchSequencer>,
}

impl WordService {
    pub fn new(repo: Arc<dyn WordRepository>) -> Self {
        Self {
            repo,
            sequencer: Arc::new(SearchSequencer::new()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.repo.backend_name()
    }

    pub async fn search(&self, params: &WordsQueryParams) -> Result<PageResult<WordSummary>, QamusError> {
        search_words(self.repo.as_ref(), params).await
    }

    /// Search, dropping the result with `Ok(None)` if a newer search began meanwhile.
    pub async fn search_latest(
        &self,
        params: &WordsQueryParams,
    ) -> Result<Option<PageResult<WordSummary>>, QamusError> {
        let ticket = self.sequencer.begin();
        let result = self.search(params).await;
        if !self.sequencer.is_current(ticket) {
            debug!(generation = ticket.generation(), "discarding superseded search");
            return Ok(None);
        }
        result.map(Some)
    }

    /// Search-as-you-type: `Ok(None)` when the text is too short to send.
    pub async fn search_text(&self, text: &str) -> Result<Option<PageResult<WordSummary>>, QamusError> {
        match classify_search_text(text).to_params() {
            Some(params) => self.search(&params).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn get_details(&self, id: &str) -> Result<WordDetail, QamusError> {
        word_details(self.repo.as_ref(), id).await
    }
}
