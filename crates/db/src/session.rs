use sqlx::{Sqlite, SqliteConnection, Transaction};

use crate::DbError;

/// Unit of work against the store.
///
/// All reads and writes of one request go through the same transaction and
/// become visible together on [`Session::flush`]. Dropping a session without
/// flushing discards its writes.
pub struct Session {
    tx: Transaction<'static, Sqlite>,
}

impl Session {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    /// Connection to run queries on
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }

    /// Commit every pending change
    pub async fn flush(self) -> Result<(), DbError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Db;

    async fn scratch_db() -> Db {
        let db = Db::connect_in_memory().await.unwrap();
        sqlx::query("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL)")
            .execute(db.pool())
            .await
            .unwrap();
        db
    }

    async fn count(db: &Db) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM notes")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn flush_commits_pending_writes() {
        let db = scratch_db().await;

        let mut session = db.session().await.unwrap();
        sqlx::query("INSERT INTO notes (body) VALUES ('kept')")
            .execute(session.conn())
            .await
            .unwrap();
        session.flush().await.unwrap();

        assert_eq!(count(&db).await, 1);
    }

    #[tokio::test]
    async fn dropped_session_discards_writes() {
        let db = scratch_db().await;

        {
            let mut session = db.session().await.unwrap();
            sqlx::query("INSERT INTO notes (body) VALUES ('lost')")
                .execute(session.conn())
                .await
                .unwrap();
        }

        assert_eq!(count(&db).await, 0);
    }
}
