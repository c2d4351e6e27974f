//! Persistence gateway for books.

use std::collections::HashMap;

use sqlx::SqliteConnection;

use super::models::{Book, BookDraft};
use crate::modules::authors::models::Author;

const COLUMNS: &str = "id, title, cover_text, author_id";

/// Book joined with its (optional) author
#[derive(Debug, sqlx::FromRow)]
struct BookWithAuthorRow {
    id: i64,
    title: String,
    cover_text: Option<String>,
    author_id: Option<i64>,
    author_first_name: Option<String>,
    author_last_name: Option<String>,
}

impl BookWithAuthorRow {
    fn split(self) -> (Book, Option<Author>) {
        let author = match (self.author_id, self.author_first_name, self.author_last_name) {
            (Some(id), Some(first_name), Some(last_name)) => Some(Author {
                id,
                first_name,
                last_name,
            }),
            _ => None,
        };
        let book = Book {
            id: self.id,
            title: self.title,
            cover_text: self.cover_text,
            author_id: self.author_id,
        };
        (book, author)
    }
}

const JOINED_SELECT: &str = "SELECT b.id, b.title, b.cover_text, b.author_id, \
     a.first_name AS author_first_name, a.last_name AS author_last_name \
     FROM books b LEFT JOIN authors a ON a.id = b.author_id";

pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM books WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_with_author(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<(Book, Option<Author>)>, sqlx::Error> {
    let row = sqlx::query_as::<_, BookWithAuthorRow>(&format!("{JOINED_SELECT} WHERE b.id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(BookWithAuthorRow::split))
}

pub async fn find_all_with_author(
    conn: &mut SqliteConnection,
) -> Result<Vec<(Book, Option<Author>)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BookWithAuthorRow>(&format!("{JOINED_SELECT} ORDER BY b.id"))
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().map(BookWithAuthorRow::split).collect())
}

pub async fn find_by_author(
    conn: &mut SqliteConnection,
    author_id: i64,
) -> Result<Vec<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>(&format!(
        "SELECT {COLUMNS} FROM books WHERE author_id = ? ORDER BY id"
    ))
    .bind(author_id)
    .fetch_all(conn)
    .await
}

/// Every attached book keyed by author id, each list ordered by book id
pub async fn group_by_author(
    conn: &mut SqliteConnection,
) -> Result<HashMap<i64, Vec<Book>>, sqlx::Error> {
    let books = sqlx::query_as::<_, Book>(&format!(
        "SELECT {COLUMNS} FROM books WHERE author_id IS NOT NULL ORDER BY id"
    ))
    .fetch_all(conn)
    .await?;

    let mut grouped: HashMap<i64, Vec<Book>> = HashMap::new();
    for book in books {
        if let Some(author_id) = book.author_id {
            grouped.entry(author_id).or_default().push(book);
        }
    }
    Ok(grouped)
}

/// Persist a new book and return it with its generated id
pub async fn insert(
    conn: &mut SqliteConnection,
    draft: &BookDraft,
    author_id: Option<i64>,
) -> Result<Book, sqlx::Error> {
    sqlx::query_as::<_, Book>(&format!(
        "INSERT INTO books (title, cover_text, author_id) VALUES (?, ?, ?) RETURNING {COLUMNS}"
    ))
    .bind(&draft.title)
    .bind(&draft.cover_text)
    .bind(author_id)
    .fetch_one(conn)
    .await
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    draft: &BookDraft,
    author_id: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE books SET title = ?, cover_text = ?, author_id = ? WHERE id = ?")
        .bind(&draft.title)
        .bind(&draft.cover_text)
        .bind(author_id)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn remove(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(conn)
        .await
}

/// Remove every book and restart id generation
pub async fn purge(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let removed = sqlx::query("DELETE FROM books")
        .execute(&mut *conn)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'books'")
        .execute(conn)
        .await?;
    Ok(removed)
}
