//! SQLite-backed word store

use crate::models::{Dialect, FormDialectRecord, Frequency, WordFormRecord, WordRecord};
use crate::repository::{escape_like, RepositoryError, SortField, WordQuery, WordRepository};
use crate::seed::SeedData;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

const WORD_COLUMNS: &str = "w.id, w.primary_arabic_script, w.english_term, w.part_of_speech, w.english_definition, w.general_frequency_tag";

/// Words qualify only through a form linked to an existing dialect.
const HAS_TAGGED_FORM: &str = "EXISTS (
    SELECT 1 FROM word_forms f
    JOIN word_form_dialects wfd ON wfd.word_form_id = f.id
    JOIN dialects d ON d.id = wfd.dialect_id
    WHERE f.word_id = w.id)";

/// Words per form-loading statement, well under SQLite's bound-variable limit.
const FORM_BATCH: usize = 500;

/// ORDER BY expression for a sort column; frequency tags sort in declared order.
fn order_expr(sort: SortField) -> String {
    match sort {
        SortField::GeneralFrequencyTag => {
            let arms: String = Frequency::ALL
                .iter()
                .map(|tag| format!(" WHEN '{}' THEN {}", tag.as_str(), tag.rank()))
                .collect();
            format!("CASE w.general_frequency_tag{} END", arms)
        }
        other => format!("w.{}", other.column()),
    }
}

pub struct SqliteWordRepository {
    conn: Mutex<Connection>,
}

impl SqliteWordRepository {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open word database at {:?}", path))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS dialects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                country_code TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS words (
                id TEXT PRIMARY KEY,
                primary_arabic_script TEXT NOT NULL,
                english_term TEXT NOT NULL,
                part_of_speech TEXT NOT NULL,
                english_definition TEXT,
                general_frequency_tag TEXT NOT NULL DEFAULT 'NOT_DEFINED'
                    CHECK (general_frequency_tag IN
                        ('VERY_FREQUENT', 'FREQUENT', 'COMMON', 'UNCOMMON', 'RARE', 'NOT_DEFINED'))
            );

            CREATE TABLE IF NOT EXISTS word_forms (
                id TEXT PRIMARY KEY,
                word_id TEXT NOT NULL REFERENCES words(id) ON DELETE CASCADE,
                transliteration TEXT NOT NULL,
                arabic_script_variant TEXT,
                conjugation_details TEXT NOT NULL,
                audio_url TEXT
            );

            CREATE TABLE IF NOT EXISTS word_form_dialects (
                word_form_id TEXT NOT NULL REFERENCES word_forms(id) ON DELETE CASCADE,
                dialect_id TEXT NOT NULL REFERENCES dialects(id) ON DELETE CASCADE,
                PRIMARY KEY (word_form_id, dialect_id)
            );

            CREATE INDEX IF NOT EXISTS idx_words_english_term ON words(english_term);
            CREATE INDEX IF NOT EXISTS idx_words_arabic ON words(primary_arabic_script);
            CREATE INDEX IF NOT EXISTS idx_word_forms_word_id ON word_forms(word_id);
            "#,
        )?;
        Ok(())
    }

    /// Insert or replace every row of a seed document in one transaction.
    pub fn import(&self, seed: &SeedData) -> Result<()> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("word database lock poisoned"))?;
        let tx = conn.transaction()?;

        for dialect in &seed.dialects {
            tx.execute(
                "INSERT OR REPLACE INTO dialects (id, name, country_code) VALUES (?1, ?2, ?3)",
                params![dialect.id, dialect.name, dialect.country_code],
            )?;
        }

        for word in &seed.words {
            tx.execute(
                "INSERT OR REPLACE INTO words
                 (id, primary_arabic_script, english_term, part_of_speech, english_definition, general_frequency_tag)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    word.id,
                    word.primary_arabic_script,
                    word.english_term,
                    word.part_of_speech,
                    word.english_definition,
                    word.general_frequency_tag,
                ],
            )?;

            for form in &word.word_forms {
                tx.execute(
                    "INSERT OR REPLACE INTO word_forms
                     (id, word_id, transliteration, arabic_script_variant, conjugation_details, audio_url)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        form.id,
                        word.id,
                        form.transliteration,
                        form.arabic_script_variant,
                        form.conjugation_details,
                        form.audio_url,
                    ],
                )?;

                for dialect_id in &form.dialect_ids {
                    tx.execute(
                        "INSERT OR IGNORE INTO word_form_dialects (word_form_id, dialect_id) VALUES (?1, ?2)",
                        params![form.id, dialect_id],
                    )
                    .with_context(|| format!("Form {} references unknown dialect {}", form.id, dialect_id))?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn row_to_word(row: &Row) -> rusqlite::Result<WordRecord> {
        Ok(WordRecord {
            id: row.get(0)?,
            primary_arabic_script: row.get(1)?,
            english_term: row.get(2)?,
            part_of_speech: row.get(3)?,
            english_definition: row.get(4)?,
            general_frequency_tag: row.get(5)?,
            word_forms: Vec::new(),
        })
    }

    /// Attach dialect-tagged forms to each word, in insertion order.
    fn load_forms(conn: &Connection, words: &mut [WordRecord]) -> Result<(), RepositoryError> {
        if words.is_empty() {
            return Ok(());
        }

        let index: HashMap<String, usize> = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.id.clone(), i))
            .collect();

        let ids: Vec<String> = words.iter().map(|w| w.id.clone()).collect();
        for batch in ids.chunks(FORM_BATCH) {
            for (form, dialect) in Self::query_forms(conn, batch)? {
                let Some(&word_idx) = form.word_id.as_ref().and_then(|id| index.get(id)) else {
                    continue;
                };
                let forms = &mut words[word_idx].word_forms;
                let link = FormDialectRecord { dialects: dialect };
                match forms.iter_mut().find(|f| f.id == form.id) {
                    Some(existing) => existing.word_form_dialects.push(link),
                    None => {
                        let mut form = form;
                        form.word_form_dialects.push(link);
                        forms.push(form);
                    }
                }
            }
        }

        Ok(())
    }

    /// One row per (form, dialect) link for the given word ids.
    fn query_forms(conn: &Connection, word_ids: &[String]) -> Result<Vec<(WordFormRecord, Dialect)>, RepositoryError> {
        let placeholders: String = word_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT f.id, f.word_id, f.transliteration, f.arabic_script_variant, f.conjugation_details, f.audio_url,
                    d.id, d.name, d.country_code
             FROM word_forms f
             JOIN word_form_dialects wfd ON wfd.word_form_id = f.id
             JOIN dialects d ON d.id = wfd.dialect_id
             WHERE f.word_id IN ({})
             ORDER BY f.rowid, wfd.rowid",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(word_ids.iter()),
            |row| {
                let form = WordFormRecord {
                    id: row.get(0)?,
                    word_id: row.get(1)?,
                    transliteration: row.get(2)?,
                    arabic_script_variant: row.get(3)?,
                    conjugation_details: row.get(4)?,
                    audio_url: row.get(5)?,
                    word_form_dialects: Vec::new(),
                };
                let dialect = Dialect {
                    id: row.get(6)?,
                    name: row.get(7)?,
                    country_code: row.get(8)?,
                };
                Ok((form, dialect))
            },
        )?;

        let links = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }

    fn run_query(conn: &Connection, query: &WordQuery) -> Result<(Vec<WordRecord>, u64), RepositoryError> {
        let mut sql_where = format!("WHERE {}", HAS_TAGGED_FORM);
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(prefix) = &query.english_prefix {
            params.push(Box::new(format!("{}%", escape_like(prefix))));
            sql_where.push_str(&format!(" AND w.english_term LIKE ?{} ESCAPE '\\'", params.len()));
        }
        if let Some(prefix) = &query.arabic_prefix {
            params.push(Box::new(format!("{}%", escape_like(prefix))));
            sql_where.push_str(&format!(" AND w.primary_arabic_script LIKE ?{} ESCAPE '\\'", params.len()));
        }
        if let Some(pos) = &query.part_of_speech {
            params.push(Box::new(pos.clone()));
            sql_where.push_str(&format!(" AND w.part_of_speech = ?{}", params.len()));
        }
        if let Some(frequency) = query.frequency {
            params.push(Box::new(frequency));
            sql_where.push_str(&format!(" AND w.general_frequency_tag = ?{}", params.len()));
        }

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM words w {}", sql_where),
            rusqlite::params_from_iter(params.iter()),
            |row| row.get(0),
        )?;

        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        params.push(Box::new(limit));
        params.push(Box::new(offset));

        // Sort column comes from a closed enum, never from caller text.
        let sql = format!(
            "SELECT {} FROM words w {} ORDER BY {} ASC, w.id ASC LIMIT ?{} OFFSET ?{}",
            WORD_COLUMNS,
            sql_where,
            order_expr(query.sort),
            params.len() - 1,
            params.len()
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut words = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), Self::row_to_word)?
            .collect::<Result<Vec<_>, _>>()?;

        Self::load_forms(conn, &mut words)?;

        Ok((words, total.max(0) as u64))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Backend("word database lock poisoned".to_string()))
    }
}

#[async_trait]
impl WordRepository for SqliteWordRepository {
    async fn query_words(&self, query: &WordQuery) -> Result<(Vec<WordRecord>, u64), RepositoryError> {
        let conn = self.lock()?;
        let result = Self::run_query(&conn, query)?;
        debug!(rows = result.0.len(), total = result.1, "sqlite word query");
        Ok(result)
    }

    async fn fetch_word(&self, id: &str) -> Result<Option<WordRecord>, RepositoryError> {
        let conn = self.lock()?;
        let word = conn
            .query_row(
                &format!("SELECT {} FROM words w WHERE w.id = ?1 AND {}", WORD_COLUMNS, HAS_TAGGED_FORM),
                params![id],
                Self::row_to_word,
            )
            .optional()?;

        let Some(word) = word else {
            return Ok(None);
        };
        let mut words = [word];
        Self::load_forms(&conn, &mut words)?;
        let [word] = words;
        Ok(Some(word))
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frequency;
    use crate::seed::sample;

    fn repo() -> SqliteWordRepository {
        let repo = SqliteWordRepository::open_in_memory().unwrap();
        repo.import(&sample()).unwrap();
        repo
    }

    fn query() -> WordQuery {
        WordQuery {
            limit: 10,
            ..WordQuery::default()
        }
    }

    #[tokio::test]
    async fn test_english_prefix_sorted_ascending() {
        let (rows, total) = repo()
            .query_words(&WordQuery {
                english_prefix: Some("kita".into()),
                ..query()
            })
            .await
            .unwrap();
        let terms: Vec<_> = rows.iter().map(|w| w.english_term.as_str()).collect();
        assert_eq!(terms, vec!["Kitab", "kitaba"]);
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_prefix_is_not_substring() {
        let (rows, total) = repo()
            .query_words(&WordQuery {
                english_prefix: Some("itab".into()),
                ..query()
            })
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_like_wildcards_in_input_are_literal() {
        let (rows, _) = repo()
            .query_words(&WordQuery {
                english_prefix: Some("k_t".into()),
                ..query()
            })
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_frequency_and_arabic_filters() {
        let (rows, total) = repo()
            .query_words(&WordQuery {
                arabic_prefix: Some("كت".into()),
                frequency: Some(Frequency::VeryFrequent),
                sort: crate::repository::SortField::PartOfSpeech,
                ..query()
            })
            .await
            .unwrap();
        assert_eq!(total, 2);
        let ids: Vec<_> = rows.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["w-kitab", "w-katab"]);
    }

    #[tokio::test]
    async fn test_pagination_window() {
        let (rows, total) = repo()
            .query_words(&WordQuery {
                part_of_speech: Some("noun".into()),
                offset: 2,
                limit: 10,
                ..query()
            })
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].english_term, "zaman");
    }

    #[tokio::test]
    async fn test_forms_and_dialects_nested_in_order() {
        let word = repo().fetch_word("w-kitab").await.unwrap().unwrap();
        assert_eq!(word.english_definition.as_deref(), Some("book"));
        let form_ids: Vec<_> = word.word_forms.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(form_ids, vec!["f-kitab-1", "f-kitab-2"]);
        let codes: Vec<_> = word.word_forms[1].dialects().map(|d| d.country_code.as_str()).collect();
        assert_eq!(codes, vec!["lb", "eg"]);
        assert_eq!(word.word_forms[0].arabic_script_variant.as_deref(), Some("كِتاب"));
    }

    #[tokio::test]
    async fn test_untagged_forms_and_words_excluded() {
        let repo = repo();
        let katab = repo.fetch_word("w-katab").await.unwrap().unwrap();
        assert_eq!(katab.word_forms.len(), 1);

        assert!(repo.fetch_word("w-kitar").await.unwrap().is_none());
        assert!(repo.fetch_word("no-such-word").await.unwrap().is_none());

        let (rows, total) = repo
            .query_words(&WordQuery {
                english_prefix: Some("kitar".into()),
                ..query()
            })
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_import_rejects_unknown_dialect() {
        let repo = SqliteWordRepository::open_in_memory().unwrap();
        let mut seed = sample();
        seed.words[0].word_forms[0].dialect_ids.push("d-missing".into());
        assert!(repo.import(&seed).is_err());
    }

    #[tokio::test]
    async fn test_frequency_sort_uses_tag_order() {
        let (rows, _) = repo()
            .query_words(&WordQuery {
                part_of_speech: Some("noun".into()),
                sort: SortField::GeneralFrequencyTag,
                ..query()
            })
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["w-kitab", "w-kitaba", "w-zaman"]);
    }

    #[tokio::test]
    async fn test_large_page_loads_forms_in_batches() {
        let mut seed = sample();
        let template = seed.words[0].clone();
        for i in 0..(FORM_BATCH * 2 + 7) {
            let mut word = template.clone();
            word.id = format!("w-bulk-{:04}", i);
            word.english_term = format!("bulk{:04}", i);
            word.word_forms[0].id = format!("f-bulk-{:04}", i);
            seed.words.push(word);
        }
        let repo = SqliteWordRepository::open_in_memory().unwrap();
        repo.import(&seed).unwrap();

        let (rows, total) = repo
            .query_words(&WordQuery {
                english_prefix: Some("bulk".into()),
                limit: 40_000,
                ..query()
            })
            .await
            .unwrap();
        assert_eq!(total, (FORM_BATCH * 2 + 7) as u64);
        assert_eq!(rows.len(), FORM_BATCH * 2 + 7);
        assert!(rows.iter().all(|w| w.word_forms.len() == 1));
    }
}
