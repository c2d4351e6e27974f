//! Persistence gateway for authors.

use sqlx::SqliteConnection;

use super::models::{Author, AuthorDraft};

const COLUMNS: &str = "id, first_name, last_name";

pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Author>, sqlx::Error> {
    sqlx::query_as::<_, Author>(&format!("SELECT {COLUMNS} FROM authors WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_all(conn: &mut SqliteConnection) -> Result<Vec<Author>, sqlx::Error> {
    sqlx::query_as::<_, Author>(&format!("SELECT {COLUMNS} FROM authors ORDER BY id"))
        .fetch_all(conn)
        .await
}

/// Persist a new author and return it with its generated id
pub async fn insert(conn: &mut SqliteConnection, draft: &AuthorDraft) -> Result<Author, sqlx::Error> {
    sqlx::query_as::<_, Author>(&format!(
        "INSERT INTO authors (first_name, last_name) VALUES (?, ?) RETURNING {COLUMNS}"
    ))
    .bind(&draft.first_name)
    .bind(&draft.last_name)
    .fetch_one(conn)
    .await
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    draft: &AuthorDraft,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE authors SET first_name = ?, last_name = ? WHERE id = ?")
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Delete an author; its books go with it through the foreign key cascade
pub async fn remove(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM authors WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM authors")
        .fetch_one(conn)
        .await
}

/// Remove every author and restart id generation
pub async fn purge(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let removed = sqlx::query("DELETE FROM authors")
        .execute(&mut *conn)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'authors'")
        .execute(conn)
        .await?;
    Ok(removed)
}
