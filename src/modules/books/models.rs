use garde::Validate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::modules::authors::models::{Author, AuthorSummary};

/// Persisted book row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub cover_text: Option<String>,
    pub author_id: Option<i64>,
}

/// Book field values submitted on create, or merged on update.
///
/// The author reference travels separately as `idAuthor`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    #[serde(default)]
    #[garde(length(chars, min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    #[garde(length(chars, max = 2000))]
    pub cover_text: Option<String>,
}

/// Partial update; absent fields keep their stored value, `"coverText": null` clears it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub cover_text: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl BookPatch {
    pub fn apply_to(self, current: &Book) -> BookDraft {
        BookDraft {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            cover_text: self
                .cover_text
                .unwrap_or_else(|| current.cover_text.clone()),
        }
    }
}

/// Book as exposed by the API ("getBook" view)
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub id: i64,
    pub title: String,
    pub cover_text: Option<String>,
    pub author: Option<AuthorSummary>,
}

impl BookView {
    pub fn project(book: Book, author: Option<Author>) -> Self {
        Self {
            id: book.id,
            title: book.title,
            cover_text: book.cover_text,
            author: author.map(AuthorSummary::from),
        }
    }
}

/// Book fields embedded in an author view
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: i64,
    pub title: String,
    pub cover_text: Option<String>,
}

impl From<Book> for BookSummary {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            cover_text: book.cover_text,
        }
    }
}
