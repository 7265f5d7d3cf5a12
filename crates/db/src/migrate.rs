//! Forward-only migrations contributed by modules.

use sqlx::Executor;

use crate::{Database, DbError};

const LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    module TEXT NOT NULL,
    id     TEXT NOT NULL,
    PRIMARY KEY (module, id)
)";

/// Migration definition for modules
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

// Each pending migration runs in its own transaction together with its
// ledger row, so a failed migration leaves no trace.
macro_rules! apply_pending {
    ($pool:expr, $migrations:expr, $applied_sql:literal, $record_sql:literal) => {{
        let pool = $pool;
        pool.execute(LEDGER_DDL).await?;

        let mut applied = 0usize;
        for (module, migration) in $migrations {
            let seen: i64 = sqlx::query_scalar($applied_sql)
                .bind(module.as_str())
                .bind(migration.id)
                .fetch_one(pool)
                .await?;
            if seen > 0 {
                tracing::debug!(target: "shelf-db", %module, id = migration.id, "migration already applied");
                continue;
            }

            let failed = |source| DbError::Migration {
                module: module.clone(),
                id: migration.id.to_string(),
                source,
            };

            let mut tx = pool.begin().await.map_err(failed)?;
            (&mut *tx).execute(migration.up).await.map_err(failed)?;
            sqlx::query($record_sql)
                .bind(module.as_str())
                .bind(migration.id)
                .execute(&mut *tx)
                .await
                .map_err(failed)?;
            tx.commit().await.map_err(failed)?;

            tracing::info!(target: "shelf-db", %module, id = migration.id, "migration applied");
            applied += 1;
        }
        Ok(applied)
    }};
}

impl Database {
    /// Apply every migration not yet recorded in `schema_migrations`.
    ///
    /// Migrations run in the order given. Returns how many were applied.
    pub async fn migrate(&self, migrations: &[(String, Migration)]) -> Result<usize, DbError> {
        match self {
            Database::Postgres(pool) => apply_pending!(
                pool,
                migrations,
                "SELECT COUNT(*) FROM schema_migrations WHERE module = $1 AND id = $2",
                "INSERT INTO schema_migrations (module, id) VALUES ($1, $2)"
            ),
            Database::Sqlite(pool) => apply_pending!(
                pool,
                migrations,
                "SELECT COUNT(*) FROM schema_migrations WHERE module = ? AND id = ?",
                "INSERT INTO schema_migrations (module, id) VALUES (?, ?)"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrations() -> Vec<(String, Migration)> {
        vec![(
            "notes".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE notes (id TEXT PRIMARY KEY, body TEXT NOT NULL)",
            },
        )]
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let db = Database::connect("sqlite::memory:", 1).await.unwrap();

        assert_eq!(db.migrate(&migrations()).await.unwrap(), 1);
        assert_eq!(db.migrate(&migrations()).await.unwrap(), 0);

        let Database::Sqlite(pool) = &db else {
            panic!("expected sqlite pool");
        };
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() {
        let db = Database::connect("sqlite::memory:", 1).await.unwrap();
        let broken = vec![(
            "notes".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE TABLE (",
            },
        )];

        let err = db.migrate(&broken).await.unwrap_err();
        assert!(matches!(err, DbError::Migration { ref id, .. } if id == "001_broken"));

        // The ledger must not claim the broken migration ran.
        assert_eq!(db.migrate(&migrations()).await.unwrap(), 1);
    }
}
