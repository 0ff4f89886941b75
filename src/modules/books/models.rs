use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

/// A stored book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Book {
    /// Unique identifier assigned by the store
    #[schema(example = 1)]
    pub id: i64,
    /// Title of the book
    #[schema(example = "Designing Your Life")]
    pub title: String,
    /// Author of the book
    #[schema(example = "Bill Burnett and Dave Evans")]
    pub author: String,
    /// 10 or 13 digit ISBN without separators
    #[schema(example = "9781101875322")]
    pub isbn: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Soft-deletion marker; never exposed
    #[serde(skip)]
    pub deleted_at: Option<OffsetDateTime>,
}

impl Book {
    /// Whether the record is visible to reads.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Bind an update body onto this record. Fields absent from the body
    /// keep their stored values.
    pub fn apply(&mut self, changes: BookChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(author) = changes.author {
            self.author = author;
        }
        if let Some(isbn) = changes.isbn {
            self.isbn = isbn;
        }
    }
}

/// Request body for creating a book. Absent fields bind as empty strings
/// and are rejected by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct NewBook {
    #[schema(example = "Designing Your Life")]
    pub title: String,
    #[schema(example = "Bill Burnett and Dave Evans")]
    pub author: String,
    #[schema(example = "9781101875322")]
    pub isbn: String,
}

/// Request body for updating a book.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
}
