//! Wiring shared by the server binary and the CLI.

use anyhow::Context;
use shelf_db::Db;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// Registry with every project module registered
pub fn build_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Connect to the configured store
pub async fn connect(settings: &Settings) -> anyhow::Result<Db> {
    Db::connect(&settings.database.url, settings.database.max_connections)
        .await
        .with_context(|| format!("failed to open database '{}'", settings.database.url))
}

/// Connect and bring the schema up to date
pub async fn prepare(settings: &Settings) -> anyhow::Result<(ModuleRegistry, Db)> {
    let registry = build_registry();
    let db = connect(settings).await?;
    registry.run_migrations(&db).await?;
    Ok((registry, db))
}

/// Run the HTTP server until a shutdown signal arrives
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let (registry, db) = prepare(&settings).await?;

    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = shelf_http::start_server(&registry, &settings, &db).await;

    registry.stop_modules().await?;
    db.close().await;
    served
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_holds_both_modules() {
        let registry = build_registry();
        assert_eq!(registry.module_count(), 2);
        assert!(registry.get_module("author").is_some());
        assert!(registry.get_module("book").is_some());
    }

    #[test]
    fn author_table_is_created_before_books() {
        let order: Vec<String> = build_registry()
            .collect_migrations()
            .into_iter()
            .map(|(module, _)| module)
            .collect();
        assert_eq!(order, vec!["author", "book"]);
    }

    #[tokio::test]
    async fn modules_initialize_against_a_migrated_store() {
        let db = Db::connect_in_memory().await.unwrap();
        let registry = build_registry();
        registry.run_migrations(&db).await.unwrap();

        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };
        registry.init_modules(&ctx).await.unwrap();
        registry.start_modules(&ctx).await.unwrap();
        registry.stop_modules().await.unwrap();
    }
}
