use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::modules::books::models::{Book, BookSummary};

/// Persisted author row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// Author field values submitted on create, or merged on update
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthorDraft {
    #[serde(default)]
    #[garde(length(chars, min = 1, max = 255))]
    pub first_name: String,
    #[serde(default)]
    #[garde(length(chars, min = 1, max = 255))]
    pub last_name: String,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl AuthorPatch {
    pub fn apply_to(self, current: &Author) -> AuthorDraft {
        AuthorDraft {
            first_name: self
                .first_name
                .unwrap_or_else(|| current.first_name.clone()),
            last_name: self.last_name.unwrap_or_else(|| current.last_name.clone()),
        }
    }
}

/// Author as exposed by the API, with the books it owns
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub books: Vec<BookSummary>,
}

impl AuthorView {
    pub fn project(author: Author, books: Vec<Book>) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
            books: books.into_iter().map(BookSummary::from).collect(),
        }
    }
}

/// Author fields embedded in a book view
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl From<Author> for AuthorSummary {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
        }
    }
}
