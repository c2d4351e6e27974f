//! Sample data for development and test environments.

use anyhow::Context;
use rand::{seq::SliceRandom, Rng};
use shelf_db::Db;

use crate::modules::{
    authors::{self, models::AuthorDraft},
    books::{self, models::BookDraft},
};

pub const AUTHOR_COUNT: usize = 10;
pub const BOOK_COUNT: usize = 10;

/// What a fixture load did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureReport {
    pub purged_authors: u64,
    pub purged_books: u64,
    pub authors: usize,
    pub books: usize,
}

/// Seed the store with indexed authors and books.
///
/// Unless `append` is set, existing rows are purged first. Each book is
/// attached to an author drawn uniformly from the freshly created ones.
/// Everything happens in one session, so a failure leaves the store untouched.
pub async fn load<R>(db: &Db, rng: &mut R, append: bool) -> anyhow::Result<FixtureReport>
where
    R: Rng + ?Sized,
{
    let mut session = db.session().await.context("failed to open fixture session")?;

    let (purged_books, purged_authors) = if append {
        (0, 0)
    } else {
        let books = books::repository::purge(session.conn()).await?;
        let authors = authors::repository::purge(session.conn()).await?;
        (books, authors)
    };

    let mut created_authors = Vec::with_capacity(AUTHOR_COUNT);
    for i in 0..AUTHOR_COUNT {
        let draft = AuthorDraft {
            first_name: format!("First name {i}"),
            last_name: format!("Last name {i}"),
        };
        created_authors.push(authors::repository::insert(session.conn(), &draft).await?);
    }

    for i in 0..BOOK_COUNT {
        let draft = BookDraft {
            title: format!("Book {i}"),
            cover_text: Some(format!("Back cover text number: {i}")),
        };
        let author_id = created_authors.choose(&mut *rng).map(|author| author.id);
        books::repository::insert(session.conn(), &draft, author_id).await?;
    }

    session.flush().await.context("failed to commit fixtures")?;

    let report = FixtureReport {
        purged_authors,
        purged_books,
        authors: created_authors.len(),
        books: BOOK_COUNT,
    };
    tracing::info!(?report, "fixtures loaded");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap;
    use rand::{rngs::StdRng, SeedableRng};

    async fn migrated_db() -> Db {
        let db = Db::connect_in_memory().await.unwrap();
        bootstrap::build_registry().run_migrations(&db).await.unwrap();
        db
    }

    async fn table_count(db: &Db, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn every_book_gets_a_seeded_author() {
        let db = migrated_db().await;
        let mut rng = StdRng::seed_from_u64(7);

        let report = load(&db, &mut rng, false).await.unwrap();
        assert_eq!(report.authors, AUTHOR_COUNT);
        assert_eq!(report.books, BOOK_COUNT);

        let orphans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books b LEFT JOIN authors a ON a.id = b.author_id WHERE a.id IS NULL",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(orphans, 0);

        let first: String = sqlx::query_scalar("SELECT title FROM books ORDER BY id LIMIT 1")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(first, "Book 0");
    }

    #[tokio::test]
    async fn reload_purges_unless_appending() {
        let db = migrated_db().await;
        let mut rng = StdRng::seed_from_u64(1);

        load(&db, &mut rng, false).await.unwrap();
        let report = load(&db, &mut rng, false).await.unwrap();
        assert_eq!(report.purged_authors, AUTHOR_COUNT as u64);
        assert_eq!(report.purged_books, BOOK_COUNT as u64);
        assert_eq!(table_count(&db, "authors").await, AUTHOR_COUNT as i64);

        // ids restart after a purge
        let min_id: i64 = sqlx::query_scalar("SELECT MIN(id) FROM authors")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(min_id, 1);

        load(&db, &mut rng, true).await.unwrap();
        assert_eq!(table_count(&db, "authors").await, 2 * AUTHOR_COUNT as i64);
        assert_eq!(table_count(&db, "books").await, 2 * BOOK_COUNT as i64);
    }
}
