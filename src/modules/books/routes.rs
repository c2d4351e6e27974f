use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use garde::Validate;
use serde_json::Value;
use shelf_db::Db;
use shelf_http::{AppError, EntityId, JsonObject, RawBody};
use shelf_kernel::api_path;
use sqlx::SqliteConnection;

use super::models::{Book, BookDraft, BookPatch, BookView};
use super::{repository, MODULE_NAME};
use crate::modules::authors::{self, models::Author};
use crate::utils;

/// Payload key carrying the author reference
pub const AUTHOR_ID_FIELD: &str = "idAuthor";

pub fn router() -> Router<Db> {
    Router::new()
        .route(&api_path(MODULE_NAME, "/"), get(list_books))
        .route(&api_path(MODULE_NAME, ""), post(create_book))
        .route(
            &api_path(MODULE_NAME, "/{id}"),
            get(get_book).put(update_book),
        )
        .route(&api_path(MODULE_NAME, "/{id}/delete"), delete(delete_book))
}

async fn find_or_404(conn: &mut SqliteConnection, id: i64) -> Result<Book, AppError> {
    repository::find(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Book object not found"))
}

/// Integer id from an `idAuthor` value; numeric strings are accepted too
fn author_id_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Resolve the author a payload points at.
///
/// An unknown or unusable reference leaves the book without author instead of
/// failing the request; the mismatch is logged.
async fn resolve_author(
    conn: &mut SqliteConnection,
    payload: &JsonObject,
) -> Result<Option<Author>, AppError> {
    let raw = payload.get(AUTHOR_ID_FIELD).unwrap_or(&Value::Null);

    let author = match author_id_of(raw) {
        Some(author_id) => authors::repository::find(conn, author_id).await?,
        None => None,
    };

    if author.is_none() {
        tracing::warn!(
            module = MODULE_NAME,
            id_author = %raw,
            "idAuthor does not match any author; book stored without author"
        );
    }

    Ok(author)
}

async fn list_books(State(db): State<Db>) -> Result<Json<Vec<BookView>>, AppError> {
    let mut session = db.session().await?;
    let books = repository::find_all_with_author(session.conn()).await?;

    Ok(Json(
        books
            .into_iter()
            .map(|(book, author)| BookView::project(book, author))
            .collect(),
    ))
}

async fn get_book(
    State(db): State<Db>,
    EntityId(id): EntityId,
) -> Result<Json<BookView>, AppError> {
    let mut session = db.session().await?;
    let (book, author) = repository::find_with_author(session.conn(), id)
        .await?
        .ok_or_else(|| AppError::not_found("Book object not found"))?;

    Ok(Json(BookView::project(book, author)))
}

async fn create_book(
    State(db): State<Db>,
    payload: JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let draft: BookDraft = payload.decode()?;

    let mut session = db.session().await?;
    let author = resolve_author(session.conn(), &payload).await?;
    draft.validate()?;

    let book = repository::insert(session.conn(), &draft, author.as_ref().map(|a| a.id)).await?;
    session.flush().await?;

    tracing::info!(
        module = MODULE_NAME,
        book_id = book.id,
        author_id = ?book.author_id,
        "book created"
    );

    let location = utils::resource_path(MODULE_NAME, book.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(BookView::project(book, author)),
    ))
}

async fn update_book(
    State(db): State<Db>,
    EntityId(id): EntityId,
    RawBody(body): RawBody,
) -> Result<StatusCode, AppError> {
    let mut session = db.session().await?;
    let current = find_or_404(session.conn(), id).await?;

    let payload = JsonObject::parse(&body)?;
    let patch: BookPatch = payload.decode()?;

    let author_id = if payload.contains(AUTHOR_ID_FIELD) {
        resolve_author(session.conn(), &payload)
            .await?
            .map(|author| author.id)
    } else {
        current.author_id
    };

    let draft = patch.apply_to(&current);
    draft.validate()?;

    repository::update(session.conn(), id, &draft, author_id).await?;
    session.flush().await?;

    tracing::info!(module = MODULE_NAME, book_id = id, author_id = ?author_id, "book updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_book(
    State(db): State<Db>,
    EntityId(id): EntityId,
) -> Result<StatusCode, AppError> {
    let mut session = db.session().await?;
    find_or_404(session.conn(), id).await?;

    repository::remove(session.conn(), id).await?;
    session.flush().await?;

    tracing::info!(module = MODULE_NAME, book_id = id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}
