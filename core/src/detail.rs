//! Word detail: one word with its forms reshaped for the detail view

use crate::error::QamusError;
use crate::models::{Definition, Dialect, FormView, WordDetail, WordFormRecord, WordFormSummary, WordRecord};
use crate::repository::WordRepository;
use crate::search::fetch_error;
use tracing::debug;

/// Dialect assumed for a form that carries none.
pub const DEFAULT_FORM_DIALECT: &str = "lb";

/// Usage regions reported when no form names a country.
pub const DEFAULT_USAGE_REGIONS: [&str; 3] = ["lb", "sa", "eg"];

/// A form may carry several dialects; the view keeps only the first.
fn form_view(form: &WordFormRecord) -> FormView {
    let dialect = form
        .dialects()
        .next()
        .map(|d| d.country_code.clone())
        .unwrap_or_else(|| DEFAULT_FORM_DIALECT.to_string());

    FormView {
        id: form.id.clone(),
        arabic_script: form.arabic_script_variant.clone().unwrap_or_default(),
        transliteration: form.transliteration.clone(),
        conjugation: form.conjugation_details.clone(),
        dialect,
        audio_url: form.audio_url.clone(),
    }
}

fn usage_regions(word: &WordRecord) -> Vec<String> {
    let mut regions: Vec<String> = Vec::new();
    for dialect in word.word_forms.iter().flat_map(|f| f.dialects()) {
        if !regions.contains(&dialect.country_code) {
            regions.push(dialect.country_code.clone());
        }
    }
    if regions.is_empty() {
        return DEFAULT_USAGE_REGIONS.iter().map(|c| c.to_string()).collect();
    }
    regions
}

/// Distinct dialects where two rows collapse only if every field matches.
fn distinct_dialects_exact(word: &WordRecord) -> Vec<Dialect> {
    let mut dialects: Vec<Dialect> = Vec::new();
    for dialect in word.word_forms.iter().flat_map(|f| f.dialects()) {
        if !dialects.contains(dialect) {
            dialects.push(dialect.clone());
        }
    }
    dialects
}

pub fn assemble(word: WordRecord) -> WordDetail {
    let forms = word.word_forms.iter().map(form_view).collect();
    let usage_regions = usage_regions(&word);
    let dialects = distinct_dialects_exact(&word);

    let definitions = vec![Definition {
        id: 1,
        definition: word.english_definition.clone().unwrap_or_default(),
        example: None,
        usage_notes: None,
    }];

    WordDetail {
        word_forms: word.word_forms.iter().map(WordFormSummary::from).collect(),
        frequency_tags: vec![word.general_frequency_tag],
        id: word.id,
        primary_arabic_script: word.primary_arabic_script,
        english_term: word.english_term,
        part_of_speech: word.part_of_speech,
        english_definition: word.english_definition,
        general_frequency_tag: word.general_frequency_tag,
        dialects,
        forms,
        usage_regions,
        definitions,
        educational_notes: Vec::new(),
    }
}

/// Fetch one word and assemble its detail view.
pub async fn word_details(repo: &dyn WordRepository, id: &str) -> Result<WordDetail, QamusError> {
    let word = repo
        .fetch_word(id)
        .await
        .map_err(|e| fetch_error("word details", e))?
        .ok_or_else(|| QamusError::NotFound("Word not found".to_string()))?;

    debug!(word_id = id, forms = word.word_forms.len(), "assembling word detail");
    Ok(assemble(word))
}
