//! Field rules applied to a book before it reaches the repository.

use bookstore_http::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use super::models::{Book, NewBook};

/// 10 or 13 ASCII digits, no separators. Checksums are not verified.
static ISBN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10}([0-9]{3})?$").expect("ISBN pattern compiles"));

const REQUIRED: &str = "required";
const ISBN: &str = "isbn";

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub error: &'static str,
}

/// Every rule that failed, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|error| error.field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, field: &'static str, error: &'static str) {
        self.0.push(FieldError { field, error });
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|error| format!("{}: {}", error.field, error.error))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let details = errors
            .0
            .iter()
            .map(|error| json!({ "field": error.field, "error": error.error }))
            .collect();
        AppError::validation(details, "Validation failed")
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for NewBook {
    fn validate(&self) -> Result<(), ValidationErrors> {
        check(&self.title, &self.author, &self.isbn)
    }
}

impl Validate for Book {
    fn validate(&self) -> Result<(), ValidationErrors> {
        check(&self.title, &self.author, &self.isbn)
    }
}

pub fn is_valid_isbn(value: &str) -> bool {
    ISBN_PATTERN.is_match(value)
}

fn check(title: &str, author: &str, isbn: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if title.is_empty() {
        errors.push("title", REQUIRED);
    }
    if author.is_empty() {
        errors.push("author", REQUIRED);
    }
    // An empty ISBN reports only the required rule
    if isbn.is_empty() {
        errors.push("isbn", REQUIRED);
    } else if !is_valid_isbn(isbn) {
        errors.push("isbn", ISBN);
    }

    errors.into_result()
}
