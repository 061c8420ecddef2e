//! JSON seed documents used to populate local word stores

use crate::models::{Dialect, FormDialectRecord, Frequency, WordFormRecord, WordRecord};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub dialects: Vec<Dialect>,
    #[serde(default)]
    pub words: Vec<SeedWord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedWord {
    pub id: String,
    pub primary_arabic_script: String,
    pub english_term: String,
    pub part_of_speech: String,
    #[serde(default)]
    pub english_definition: Option<String>,
    #[serde(default)]
    pub general_frequency_tag: Frequency,
    #[serde(default)]
    pub word_forms: Vec<SeedForm>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedForm {
    pub id: String,
    pub transliteration: String,
    #[serde(default)]
    pub arabic_script_variant: Option<String>,
    pub conjugation_details: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub dialect_ids: Vec<String>,
}

impl SeedData {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse seed document")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed document at {:?}", path))?;
        Self::from_json_str(&content)
    }

    /// Build the nested join for every word, keeping only forms that resolve
    /// to at least one known dialect and only words that keep a form.
    pub fn inner_joined(&self) -> Vec<WordRecord> {
        let dialects: HashMap<&str, &Dialect> =
            self.dialects.iter().map(|d| (d.id.as_str(), d)).collect();

        self.words
            .iter()
            .filter_map(|word| {
                let forms: Vec<WordFormRecord> = word
                    .word_forms
                    .iter()
                    .filter_map(|form| {
                        let links: Vec<FormDialectRecord> = form
                            .dialect_ids
                            .iter()
                            .filter_map(|id| dialects.get(id.as_str()))
                            .map(|d| FormDialectRecord {
                                dialects: (*d).clone(),
                            })
                            .collect();
                        if links.is_empty() {
                            return None;
                        }
                        Some(WordFormRecord {
                            id: form.id.clone(),
                            word_id: Some(word.id.clone()),
                            transliteration: form.transliteration.clone(),
                            arabic_script_variant: form.arabic_script_variant.clone(),
                            conjugation_details: form.conjugation_details.clone(),
                            audio_url: form.audio_url.clone(),
                            word_form_dialects: links,
                        })
                    })
                    .collect();

                if forms.is_empty() {
                    return None;
                }

                Some(WordRecord {
                    id: word.id.clone(),
                    primary_arabic_script: word.primary_arabic_script.clone(),
                    english_term: word.english_term.clone(),
                    part_of_speech: word.part_of_speech.clone(),
                    english_definition: word.english_definition.clone(),
                    general_frequency_tag: word.general_frequency_tag,
                    word_forms: forms,
                })
            })
            .collect()
    }
}

/// Small dictionary shared by the store and service tests.
#[cfg(test)]
pub(crate) fn sample() -> SeedData {
    SeedData::from_json_str(
        r#"{
        "dialects": [
            { "id": "d1", "name": "Lebanese", "country_code": "lb" },
            { "id": "d2", "name": "Saudi", "country_code": "sa" },
            { "id": "d3", "name": "Egyptian", "country_code": "eg" }
        ],
        "words": [
            {
                "id": "w-zaman", "primary_arabic_script": "زمن", "english_term": "zaman",
                "part_of_speech": "noun", "english_definition": "time",
                "general_frequency_tag": "COMMON",
                "word_forms": [
                    { "id": "f-zaman", "transliteration": "zaman", "conjugation_details": "singular", "dialect_ids": ["d3"] }
                ]
            },
            {
                "id": "w-kitaba", "primary_arabic_script": "كتابة", "english_term": "kitaba",
                "part_of_speech": "noun", "english_definition": null,
                "general_frequency_tag": "FREQUENT",
                "word_forms": [
                    { "id": "f-kitaba", "transliteration": "kitaaba", "conjugation_details": "verbal noun", "dialect_ids": ["d2", "d1"] }
                ]
            },
            {
                "id": "w-kitab", "primary_arabic_script": "كتاب", "english_term": "Kitab",
                "part_of_speech": "noun", "english_definition": "book",
                "general_frequency_tag": "VERY_FREQUENT",
                "word_forms": [
                    { "id": "f-kitab-1", "transliteration": "kitaab", "arabic_script_variant": "كِتاب",
                      "conjugation_details": "singular", "audio_url": "https://cdn.example/kitab.mp3", "dialect_ids": ["d1"] },
                    { "id": "f-kitab-2", "transliteration": "kutub", "conjugation_details": "plural", "dialect_ids": ["d1", "d3"] }
                ]
            },
            {
                "id": "w-katab", "primary_arabic_script": "كتب", "english_term": "write",
                "part_of_speech": "verb", "english_definition": "to write",
                "general_frequency_tag": "VERY_FREQUENT",
                "word_forms": [
                    { "id": "f-katab", "transliteration": "katab", "conjugation_details": "past, 3rd masc.", "dialect_ids": ["d1"] },
                    { "id": "f-katab-untagged", "transliteration": "yiktob", "conjugation_details": "present", "dialect_ids": [] }
                ]
            },
            {
                "id": "w-kitar", "primary_arabic_script": "قطار", "english_term": "kitar",
                "part_of_speech": "noun", "english_definition": "train",
                "general_frequency_tag": "RARE",
                "word_forms": [
                    { "id": "f-kitar", "transliteration": "qitaar", "conjugation_details": "singular", "dialect_ids": [] }
                ]
            }
        ]
    }"#,
    )
    .expect("sample seed parses")
}
