use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use garde::Validate;
use shelf_db::Db;
use shelf_http::{AppError, EntityId, JsonObject, RawBody};
use shelf_kernel::api_path;
use sqlx::SqliteConnection;

use super::models::{Author, AuthorDraft, AuthorPatch, AuthorView};
use super::{repository, MODULE_NAME};
use crate::modules::books;
use crate::utils;

pub fn router() -> Router<Db> {
    Router::new()
        .route(&api_path(MODULE_NAME, "/"), get(list_authors))
        .route(&api_path(MODULE_NAME, ""), post(create_author))
        .route(
            &api_path(MODULE_NAME, "/{id}"),
            get(get_author).put(update_author).delete(delete_author),
        )
}

/// Lookup-or-fail shared by every handler addressing one author
async fn find_or_404(conn: &mut SqliteConnection, id: i64) -> Result<Author, AppError> {
    repository::find(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Author object not found"))
}

async fn list_authors(State(db): State<Db>) -> Result<Json<Vec<AuthorView>>, AppError> {
    let mut session = db.session().await?;
    let authors = repository::find_all(session.conn()).await?;
    let mut books = books::repository::group_by_author(session.conn()).await?;

    let views = authors
        .into_iter()
        .map(|author| {
            let owned = books.remove(&author.id).unwrap_or_default();
            AuthorView::project(author, owned)
        })
        .collect();

    Ok(Json(views))
}

async fn get_author(
    State(db): State<Db>,
    EntityId(id): EntityId,
) -> Result<Json<AuthorView>, AppError> {
    let mut session = db.session().await?;
    let author = find_or_404(session.conn(), id).await?;
    let books = books::repository::find_by_author(session.conn(), id).await?;

    Ok(Json(AuthorView::project(author, books)))
}

async fn create_author(
    State(db): State<Db>,
    payload: JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let draft: AuthorDraft = payload.decode()?;
    draft.validate()?;

    let mut session = db.session().await?;
    let author = repository::insert(session.conn(), &draft).await?;
    session.flush().await?;

    tracing::info!(module = MODULE_NAME, author_id = author.id, "author created");

    let location = utils::resource_path(MODULE_NAME, author.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(AuthorView::project(author, Vec::new())),
    ))
}

async fn update_author(
    State(db): State<Db>,
    EntityId(id): EntityId,
    RawBody(body): RawBody,
) -> Result<StatusCode, AppError> {
    let mut session = db.session().await?;
    let current = find_or_404(session.conn(), id).await?;

    let patch: AuthorPatch = JsonObject::parse(&body)?.decode()?;
    let draft = patch.apply_to(&current);
    draft.validate()?;

    repository::update(session.conn(), id, &draft).await?;
    session.flush().await?;

    tracing::info!(module = MODULE_NAME, author_id = id, "author updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_author(
    State(db): State<Db>,
    EntityId(id): EntityId,
) -> Result<StatusCode, AppError> {
    let mut session = db.session().await?;
    find_or_404(session.conn(), id).await?;

    repository::remove(session.conn(), id).await?;
    session.flush().await?;

    tracing::info!(module = MODULE_NAME, author_id = id, "author deleted with its books");
    Ok(StatusCode::NO_CONTENT)
}
