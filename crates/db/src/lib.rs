//! Database connection factory and migration runner.
//!
//! A [`Database`] wraps a `sqlx` pool for one of the supported backends. The
//! backend is picked from the URL scheme so deployments can point at
//! PostgreSQL while local runs and tests use SQLite.

use std::str::FromStr;

use sqlx::{
    postgres::PgPoolOptions,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    PgPool, SqlitePool,
};
use thiserror::Error;

mod migrate;

pub use migrate::Migration;

/// Errors raised while connecting to or migrating the database.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("unsupported database url '{0}'; expected postgres:// or sqlite:")]
    UnsupportedUrl(String),

    #[error("migration {module}/{id} failed: {source}")]
    Migration {
        module: String,
        id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Which engine a [`Database`] talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    /// Resolve the backend from a connection URL.
    pub fn from_url(url: &str) -> Result<Self, DbError> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Self::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else {
            Err(DbError::UnsupportedUrl(url.to_string()))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Process-wide connection pool.
#[derive(Debug, Clone)]
pub enum Database {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl Database {
    /// Open a pool for `url`.
    ///
    /// In-memory SQLite databases only live as long as their connection, so
    /// they are pinned to a single connection that is never recycled.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DbError> {
        let database = match Backend::from_url(url)? {
            Backend::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(max_connections)
                    .connect(url)
                    .await?;
                Self::Postgres(pool)
            }
            Backend::Sqlite => {
                let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
                let pool_options = if url.contains(":memory:") {
                    SqlitePoolOptions::new()
                        .max_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None)
                } else {
                    SqlitePoolOptions::new().max_connections(max_connections)
                };
                Self::Sqlite(pool_options.connect_with(options).await?)
            }
        };

        tracing::info!(
            target: "shelf-db",
            backend = database.backend().as_str(),
            "database pool ready"
        );

        Ok(database)
    }

    pub fn backend(&self) -> Backend {
        match self {
            Self::Postgres(_) => Backend::Postgres,
            Self::Sqlite(_) => Backend::Sqlite,
        }
    }

    /// Close every pooled connection, waiting for checked-out ones.
    pub async fn close(&self) {
        match self {
            Self::Postgres(pool) => pool.close().await,
            Self::Sqlite(pool) => pool.close().await,
        }
        tracing::info!(target: "shelf-db", "database pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_is_picked_from_scheme() {
        assert_eq!(
            Backend::from_url("postgres://localhost/books").unwrap(),
            Backend::Postgres
        );
        assert_eq!(
            Backend::from_url("postgresql://localhost/books").unwrap(),
            Backend::Postgres
        );
        assert_eq!(
            Backend::from_url("sqlite::memory:").unwrap(),
            Backend::Sqlite
        );
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let err = Backend::from_url("mysql://localhost/books").unwrap_err();
        assert!(matches!(err, DbError::UnsupportedUrl(url) if url == "mysql://localhost/books"));
    }

    #[tokio::test]
    async fn connects_to_in_memory_sqlite() {
        let db = Database::connect("sqlite::memory:", 5).await.unwrap();
        assert_eq!(db.backend(), Backend::Sqlite);
        db.close().await;
    }
}
