//! Boundary validation for search parameters and account commands

use crate::error::{FieldViolation, QamusError};
use crate::models::Frequency;
use crate::repository::SortField;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MIN_PASSWORD_LEN: usize = 8;
const PASSWORD_SPECIALS: &str = "!@#$%^&*";
/// PostgREST reads `*` in a pattern as `%`, so it is refused in prefix text.
const PATTERN_WILDCARD: char = '*';

/// Unvalidated word search parameters as supplied by a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordsQueryParams {
    pub english: Option<String>,
    pub arabic: Option<String>,
    pub part_of_speech: Option<String>,
    pub frequency: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
}

/// Search parameters that passed validation, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub english: Option<String>,
    pub arabic: Option<String>,
    pub part_of_speech: Option<String>,
    pub frequency: Option<Frequency>,
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortField,
}

impl SearchCriteria {
    /// True when at least one filter narrows the dictionary.
    pub fn has_filters(&self) -> bool {
        self.english.is_some()
            || self.arabic.is_some()
            || self.part_of_speech.is_some()
            || self.frequency.is_some()
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}

fn prefix_text(field: &str, value: &Option<String>, violations: &mut Vec<FieldViolation>) -> Option<String> {
    let text = non_empty(value)?;
    if text.contains(PATTERN_WILDCARD) {
        violations.push(FieldViolation::new(field, "must not contain '*'"));
        return None;
    }
    Some(text)
}

fn positive(field: &str, value: Option<i64>, default: u32, violations: &mut Vec<FieldViolation>) -> u32 {
    match value {
        None => default,
        Some(n) if n > 0 => match u32::try_from(n) {
            Ok(n) => n,
            Err(_) => {
                violations.push(FieldViolation::new(field, "must not exceed 4294967295"));
                default
            }
        },
        Some(_) => {
            violations.push(FieldViolation::new(field, "must be a positive integer"));
            default
        }
    }
}

impl WordsQueryParams {
    pub fn validate(&self) -> Result<SearchCriteria, QamusError> {
        let mut violations = Vec::new();

        let english = prefix_text("english", &self.english, &mut violations);
        let arabic = prefix_text("arabic", &self.arabic, &mut violations);

        let frequency = match &self.frequency {
            Some(tag) => match tag.parse::<Frequency>() {
                Ok(f) => Some(f),
                Err(_) => {
                    let allowed: Vec<_> = Frequency::ALL.iter().map(|f| f.as_str()).collect();
                    violations.push(FieldViolation::new(
                        "frequency",
                        format!("must be one of {}", allowed.join(", ")),
                    ));
                    None
                }
            },
            None => None,
        };

        let page = positive("page", self.page, DEFAULT_PAGE, &mut violations);
        let limit = positive("limit", self.limit, DEFAULT_LIMIT, &mut violations);

        let sort_by = match self.sort_by.as_deref().filter(|s| !s.is_empty()) {
            Some(column) => match column.parse::<SortField>() {
                Ok(field) => field,
                Err(_) => {
                    violations.push(FieldViolation::new(
                        "sort_by",
                        format!("cannot sort by '{}'", column),
                    ));
                    SortField::default()
                }
            },
            None => SortField::default(),
        };

        if !violations.is_empty() {
            return Err(QamusError::InvalidParameters(violations));
        }

        Ok(SearchCriteria {
            english,
            arabic,
            part_of_speech: non_empty(&self.part_of_speech),
            frequency,
            page,
            limit,
            sort_by,
        })
    }
}

/// Parse a textual integer parameter, recording a violation when it is malformed.
pub fn parse_int_param(field: &str, raw: Option<&str>, violations: &mut Vec<FieldViolation>) -> Option<i64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            violations.push(FieldViolation::new(field, "must be a positive integer"));
            None
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

pub fn check_email(email: &str, violations: &mut Vec<FieldViolation>) {
    if !email_regex().is_match(email) {
        violations.push(FieldViolation::new("email", "Invalid email format"));
    }
}

pub fn check_password_strength(password: &str, violations: &mut Vec<FieldViolation>) {
    let mut fail = |message: &str| violations.push(FieldViolation::new("password", message));

    if password.chars().count() < MIN_PASSWORD_LEN {
        fail("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        fail("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        fail("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        fail("Password must contain at least one number");
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        fail("Password must contain at least one special character (!@#$%^&*)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> WordsQueryParams {
        WordsQueryParams::default()
    }

    #[test]
    fn test_defaults_applied() {
        let criteria = params().validate().unwrap();
        assert_eq!(criteria.page, 1);
        assert_eq!(criteria.limit, 10);
        assert_eq!(criteria.sort_by, SortField::EnglishTerm);
        assert!(!criteria.has_filters());
    }

    #[test]
    fn test_empty_text_filters_count_as_absent() {
        let criteria = WordsQueryParams {
            english: Some(String::new()),
            arabic: Some(String::new()),
            part_of_speech: Some(String::new()),
            ..params()
        }
        .validate()
        .unwrap();
        assert!(!criteria.has_filters());
    }

    #[test]
    fn test_wildcard_in_prefix_rejected() {
        let err = WordsQueryParams {
            english: Some("*tab".into()),
            arabic: Some("كت*".into()),
            ..params()
        }
        .validate()
        .unwrap_err();
        let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["english", "arabic"]);
    }

    #[test]
    fn test_unknown_frequency_rejected() {
        for tag in ["", "SOMETIMES", "common", "VERY FREQUENT"] {
            let err = WordsQueryParams {
                frequency: Some(tag.to_string()),
                ..params()
            }
            .validate()
            .unwrap_err();
            assert_eq!(err.status(), 400);
            assert_eq!(err.violations()[0].field, "frequency");
        }
    }

    #[test]
    fn test_non_positive_pagination_collects_every_field() {
        let err = WordsQueryParams {
            page: Some(0),
            limit: Some(-5),
            sort_by: Some("rowid; DROP TABLE words".to_string()),
            ..params()
        }
        .validate()
        .unwrap_err();
        let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["page", "limit", "sort_by"]);
    }

    #[test]
    fn test_offset_window() {
        let criteria = WordsQueryParams {
            english: Some("kita".into()),
            page: Some(2),
            limit: Some(10),
            ..params()
        }
        .validate()
        .unwrap();
        assert_eq!(criteria.offset(), 10);
        assert_eq!(criteria.limit, 10);
    }

    #[test]
    fn test_parse_int_param() {
        let mut violations = Vec::new();
        assert_eq!(parse_int_param("page", Some("3"), &mut violations), Some(3));
        assert_eq!(parse_int_param("page", None, &mut violations), None);
        assert_eq!(parse_int_param("limit", Some("ten"), &mut violations), None);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "limit");
    }

    #[test]
    fn test_email_format() {
        let mut violations = Vec::new();
        check_email("user@example.com", &mut violations);
        assert!(violations.is_empty());
        check_email("user@example", &mut violations);
        check_email("us er@example.com", &mut violations);
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_password_rules() {
        let mut violations = Vec::new();
        check_password_strength("Str0ng!pass", &mut violations);
        assert!(violations.is_empty());

        check_password_strength("weak", &mut violations);
        // too short, no uppercase, no digit, no special
        assert_eq!(violations.len(), 4);
        assert!(violations.iter().all(|v| v.field == "password"));
    }
}
