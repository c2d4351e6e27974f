//! Forward-only schema migrations contributed by modules.

use crate::{Db, DbError};

const LEDGER_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS _shelf_migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    )
"#;

/// Migration definition for modules
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Apply every migration not yet recorded in the ledger, in the order given.
///
/// Each migration runs in its own transaction together with its ledger row.
/// Returns how many migrations were applied.
pub async fn apply(db: &Db, migrations: &[(String, Migration)]) -> Result<usize, DbError> {
    sqlx::raw_sql(LEDGER_DDL).execute(db.pool()).await?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let recorded: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM _shelf_migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(db.pool())
                .await?;

        if recorded.is_some() {
            tracing::debug!(target: "shelf-db", %module, id = migration.id, "migration already applied");
            continue;
        }

        let failed = |source: sqlx::Error| DbError::Migration {
            module: module.clone(),
            id: migration.id.to_string(),
            source,
        };

        let mut tx = db.pool().begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
        sqlx::query("INSERT INTO _shelf_migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
        tx.commit().await.map_err(failed)?;

        tracing::info!(target: "shelf-db", %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}
