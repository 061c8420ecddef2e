//! Word tables read through PostgREST

use super::{failure_message, SupabaseClient};
use crate::models::WordRecord;
use crate::repository::{escape_like, RepositoryError, WordQuery, WordRepository};
use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use tracing::{debug, warn};

/// Nested inner-join select: words without a dialect-tagged form are dropped by the backend.
pub(crate) const WORD_SELECT: &str =
    "*,word_forms!inner(*,word_form_dialects!inner(dialects!inner(id,name,country_code)))";

/// Total row count from a `Content-Range` header such as `0-9/42` or `*/0`.
pub(crate) fn content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.parse().ok()
}

pub(crate) fn word_query_params(query: &WordQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("select", WORD_SELECT.to_string())];
    if let Some(prefix) = &query.english_prefix {
        params.push(("english_term", format!("ilike.{}*", escape_like(prefix))));
    }
    if let Some(prefix) = &query.arabic_prefix {
        params.push(("primary_arabic_script", format!("ilike.{}*", escape_like(prefix))));
    }
    if let Some(pos) = &query.part_of_speech {
        params.push(("part_of_speech", format!("eq.{}", pos)));
    }
    if let Some(frequency) = query.frequency {
        params.push(("general_frequency_tag", format!("eq.{}", frequency)));
    }
    params.push(("order", format!("{}.asc,id.asc", query.sort.column())));
    params.push(("offset", query.offset.to_string()));
    params.push(("limit", query.limit.to_string()));
    params
}

#[async_trait]
impl WordRepository for SupabaseClient {
    async fn query_words(&self, query: &WordQuery) -> Result<(Vec<WordRecord>, u64), RepositoryError> {
        let response = self
            .keyed(self.http.get(self.rest_url("words")), None)
            .header("Prefer", "count=exact")
            .query(&word_query_params(query))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = failure_message(response).await;
            warn!(%message, "word query rejected by backend");
            return Err(RepositoryError::Backend(message));
        }

        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total);
        let rows: Vec<WordRecord> = response.json().await?;
        let total = total.unwrap_or(rows.len() as u64);

        debug!(rows = rows.len(), total, "postgrest word query");
        Ok((rows, total))
    }

    async fn fetch_word(&self, id: &str) -> Result<Option<WordRecord>, RepositoryError> {
        let response = self
            .keyed(self.http.get(self.rest_url("words")), None)
            .query(&[
                ("select", WORD_SELECT.to_string()),
                ("id", format!("eq.{}", id)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let message = failure_message(response).await;
            warn!(%message, word_id = id, "word lookup rejected by backend");
            return Err(RepositoryError::Backend(message));
        }

        let rows: Vec<WordRecord> = response.json().await?;
        Ok(rows.into_iter().next())
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frequency;
    use crate::repository::SortField;
    use crate::supabase::SupabaseConfig;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig {
            url: server.uri(),
            anon_key: "anon-key".into(),
            service_role_key: None,
        })
        .unwrap()
    }

    fn kitab_row() -> serde_json::Value {
        serde_json::json!({
            "id": "w1",
            "primary_arabic_script": "كتاب",
            "english_term": "kitab",
            "part_of_speech": "noun",
            "english_definition": "book",
            "general_frequency_tag": "COMMON",
            "created_at": "2025-01-01T00:00:00+00:00",
            "updated_at": "2025-01-01T00:00:00+00:00",
            "word_forms": [{
                "id": "f1", "word_id": "w1", "transliteration": "kitaab",
                "arabic_script_variant": null, "conjugation_details": "singular", "audio_url": null,
                "created_at": "2025-01-01T00:00:00+00:00", "updated_at": "2025-01-01T00:00:00+00:00",
                "word_form_dialects": [
                    { "dialects": { "id": "d1", "name": "Lebanese", "country_code": "lb" } }
                ]
            }]
        })
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(content_range_total("0-9/42"), Some(42));
        assert_eq!(content_range_total("*/0"), Some(0));
        assert_eq!(content_range_total("0-9/*"), None);
        assert_eq!(content_range_total("garbage"), None);
    }

    #[test]
    fn test_query_params_for_all_filters() {
        let params = word_query_params(&WordQuery {
            english_prefix: Some("ki_t".into()),
            arabic_prefix: None,
            part_of_speech: Some("noun".into()),
            frequency: Some(Frequency::Rare),
            sort: SortField::PrimaryArabicScript,
            offset: 10,
            limit: 10,
        });
        assert_eq!(
            params,
            vec![
                ("select", WORD_SELECT.to_string()),
                ("english_term", "ilike.ki\\_t*".to_string()),
                ("part_of_speech", "eq.noun".to_string()),
                ("general_frequency_tag", "eq.RARE".to_string()),
                ("order", "primary_arabic_script.asc,id.asc".to_string()),
                ("offset", "10".to_string()),
                ("limit", "10".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_query_words_reads_rows_and_exact_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/words"))
            .and(query_param("english_term", "ilike.kita*"))
            .and(query_param("offset", "10"))
            .and(header("apikey", "anon-key"))
            .and(header("prefer", "count=exact"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-range", "10-10/11")
                    .set_body_json(serde_json::json!([kitab_row()])),
            )
            .mount(&server)
            .await;

        let (rows, total) = client(&server)
            .query_words(&WordQuery {
                english_prefix: Some("kita".into()),
                offset: 10,
                limit: 10,
                ..WordQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 11);
        assert_eq!(rows[0].word_forms[0].word_form_dialects[0].dialects.id, "d1");
    }

    #[tokio::test]
    async fn test_backend_error_message_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/words"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": "PGRST100",
                "message": "failed to parse order"
            })))
            .mount(&server)
            .await;

        let err = client(&server).query_words(&WordQuery::default()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Backend(ref m) if m == "failed to parse order"));
    }

    #[tokio::test]
    async fn test_fetch_word_empty_array_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/words"))
            .and(query_param("id", "eq.missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/words"))
            .and(query_param("id", "eq.w1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([kitab_row()])))
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(client.fetch_word("missing").await.unwrap().is_none());
        let word = client.fetch_word("w1").await.unwrap().unwrap();
        assert_eq!(word.english_term, "kitab");
    }

    #[tokio::test]
    async fn test_malformed_rows_are_decode_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/words"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": 7 }])))
            .mount(&server)
            .await;

        let err = client(&server).fetch_word("w1").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Decode(_)));
    }
}
