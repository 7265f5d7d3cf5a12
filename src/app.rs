//! Application bootstrap: database, module registry, HTTP server.

use anyhow::Context;
use shelf_db::Database;
use shelf_kernel::{InitCtx, ModuleRegistry, Settings};

use crate::modules;

/// Open the configured database pool.
pub async fn connect(settings: &Settings) -> anyhow::Result<Database> {
    Database::connect(&settings.database.url, settings.database.max_connections)
        .await
        .with_context(|| "failed to connect to the database")
}

/// Build a registry holding every application module.
pub fn build_registry(db: &Database) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, db);
    registry
}

/// Apply pending migrations from every module; returns how many ran.
pub async fn migrate(registry: &ModuleRegistry, db: &Database) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    let applied = db
        .migrate(&migrations)
        .await
        .with_context(|| "failed to apply migrations")?;

    tracing::info!(
        applied,
        known = migrations.len(),
        "database schema up to date"
    );
    Ok(applied)
}

/// Run the service until a shutdown signal arrives.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let db = connect(settings).await?;
    let registry = build_registry(&db);
    let ctx = InitCtx {
        settings,
        db: &db,
    };

    registry.init_modules(&ctx).await?;
    migrate(&registry, &db).await?;
    registry.start_modules(&ctx).await?;

    let served = shelf_http::start_server(&registry, settings).await;

    registry.stop_modules().await?;
    db.close().await;

    served
}

/// Apply migrations and exit.
pub async fn migrate_only(settings: &Settings) -> anyhow::Result<usize> {
    let db = connect(settings).await?;
    let registry = build_registry(&db);
    let applied = migrate(&registry, &db).await;
    db.close().await;
    applied
}
