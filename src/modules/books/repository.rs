//! Data access for the `books` table.

use std::sync::Arc;

use async_trait::async_trait;
use shelf_db::Database;
use sqlx::{PgPool, SqlitePool};
use thiserror::Error;

use super::models::Book;

/// DDL for the `books` table; valid on every supported backend.
pub const CREATE_BOOKS_TABLE: &str = "CREATE TABLE IF NOT EXISTS books (
    isbn       TEXT PRIMARY KEY,
    amazon_url TEXT NOT NULL,
    author     TEXT NOT NULL,
    language   TEXT NOT NULL,
    pages      INTEGER NOT NULL,
    publisher  TEXT NOT NULL,
    title      TEXT NOT NULL,
    year       INTEGER NOT NULL
)";

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("There is no book with an isbn '{0}'")]
    NotFound(String),

    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
}

/// CRUD over books keyed by ISBN. Every call is a single statement.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All books, ordered by title
    async fn list_all(&self) -> Result<Vec<Book>, RepoError>;

    async fn get_by_isbn(&self, isbn: &str) -> Result<Book, RepoError>;

    /// Insert `book`; an existing ISBN fails with the backend's
    /// primary-key violation as [`RepoError::Database`]
    async fn create(&self, book: &Book) -> Result<Book, RepoError>;

    /// Overwrite every column of the row keyed by `isbn` except the key
    /// itself; `book.isbn` is ignored.
    async fn update(&self, isbn: &str, book: &Book) -> Result<Book, RepoError>;

    async fn delete_by_isbn(&self, isbn: &str) -> Result<(), RepoError>;
}

/// Pick the repository implementation matching the pool's backend.
pub fn for_database(db: &Database) -> Arc<dyn BookRepository> {
    match db {
        Database::Postgres(pool) => Arc::new(PgBookRepository::new(pool.clone())),
        Database::Sqlite(pool) => Arc::new(SqliteBookRepository::new(pool.clone())),
    }
}

// The backends only differ in their bind-parameter syntax.
macro_rules! sql_book_repository {
    (
        $(#[$meta:meta])*
        $name:ident($pool:ty) {
            get: $get:literal,
            insert: $insert:literal,
            update: $update:literal,
            delete: $delete:literal $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            pool: $pool,
        }

        impl $name {
            pub fn new(pool: $pool) -> Self {
                Self { pool }
            }
        }

        #[async_trait]
        impl BookRepository for $name {
            async fn list_all(&self) -> Result<Vec<Book>, RepoError> {
                let books = sqlx::query_as::<_, Book>(
                    "SELECT isbn, amazon_url, author, language, pages, publisher, title, year
                     FROM books ORDER BY title",
                )
                .fetch_all(&self.pool)
                .await?;
                Ok(books)
            }

            async fn get_by_isbn(&self, isbn: &str) -> Result<Book, RepoError> {
                sqlx::query_as::<_, Book>($get)
                    .bind(isbn)
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or_else(|| RepoError::NotFound(isbn.to_string()))
            }

            async fn create(&self, book: &Book) -> Result<Book, RepoError> {
                sqlx::query_as::<_, Book>($insert)
                    .bind(&book.isbn)
                    .bind(&book.amazon_url)
                    .bind(&book.author)
                    .bind(&book.language)
                    .bind(book.pages)
                    .bind(&book.publisher)
                    .bind(&book.title)
                    .bind(book.year)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(RepoError::from)
            }

            async fn update(&self, isbn: &str, book: &Book) -> Result<Book, RepoError> {
                sqlx::query_as::<_, Book>($update)
                    .bind(&book.amazon_url)
                    .bind(&book.author)
                    .bind(&book.language)
                    .bind(book.pages)
                    .bind(&book.publisher)
                    .bind(&book.title)
                    .bind(book.year)
                    .bind(isbn)
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or_else(|| RepoError::NotFound(isbn.to_string()))
            }

            async fn delete_by_isbn(&self, isbn: &str) -> Result<(), RepoError> {
                let result = sqlx::query($delete)
                    .bind(isbn)
                    .execute(&self.pool)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(RepoError::NotFound(isbn.to_string()));
                }
                Ok(())
            }
        }
    };
}

sql_book_repository! {
    /// Books stored in PostgreSQL
    PgBookRepository(PgPool) {
        get: "SELECT isbn, amazon_url, author, language, pages, publisher, title, year
              FROM books WHERE isbn = $1",
        insert: "INSERT INTO books (isbn, amazon_url, author, language, pages, publisher, title, year)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 RETURNING isbn, amazon_url, author, language, pages, publisher, title, year",
        update: "UPDATE books
                 SET amazon_url = $1, author = $2, language = $3, pages = $4,
                     publisher = $5, title = $6, year = $7
                 WHERE isbn = $8
                 RETURNING isbn, amazon_url, author, language, pages, publisher, title, year",
        delete: "DELETE FROM books WHERE isbn = $1",
    }
}

sql_book_repository! {
    /// Books stored in SQLite
    SqliteBookRepository(SqlitePool) {
        get: "SELECT isbn, amazon_url, author, language, pages, publisher, title, year
              FROM books WHERE isbn = ?",
        insert: "INSERT INTO books (isbn, amazon_url, author, language, pages, publisher, title, year)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                 RETURNING isbn, amazon_url, author, language, pages, publisher, title, year",
        update: "UPDATE books
                 SET amazon_url = ?, author = ?, language = ?, pages = ?,
                     publisher = ?, title = ?, year = ?
                 WHERE isbn = ?
                 RETURNING isbn, amazon_url, author, language, pages, publisher, title, year",
        delete: "DELETE FROM books WHERE isbn = ?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_db::Migration;

    async fn repository() -> Arc<dyn BookRepository> {
        let db = Database::connect("sqlite::memory:", 1).await.unwrap();
        db.migrate(&[(
            "books".to_string(),
            Migration {
                id: "001_create_books",
                up: CREATE_BOOKS_TABLE,
            },
        )])
        .await
        .unwrap();
        for_database(&db)
    }

    fn book(isbn: &str, title: &str) -> Book {
        Book {
            isbn: isbn.to_string(),
            amazon_url: "http://amazon.com/testbook".to_string(),
            author: "Test Author".to_string(),
            language: "testLang".to_string(),
            pages: 1000,
            publisher: "Test Publisher".to_string(),
            title: title.to_string(),
            year: 2017,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let repo = repository().await;
        let created = repo.create(&book("010101", "Test Title")).await.unwrap();

        assert_eq!(created, book("010101", "Test Title"));
        assert_eq!(repo.get_by_isbn("010101").await.unwrap(), created);
    }

    #[tokio::test]
    async fn list_is_ordered_by_title() {
        let repo = repository().await;
        repo.create(&book("2", "Zebra")).await.unwrap();
        repo.create(&book("1", "Aardvark")).await.unwrap();

        let titles: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Aardvark", "Zebra"]);
    }

    #[tokio::test]
    async fn duplicate_isbn_surfaces_as_database_error() {
        let repo = repository().await;
        repo.create(&book("010101", "Test Title")).await.unwrap();

        let err = repo.create(&book("010101", "Other")).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Database(sqlx::Error::Database(ref db)) if db.is_unique_violation()
        ));
        assert_eq!(repo.get_by_isbn("010101").await.unwrap().title, "Test Title");
    }

    #[tokio::test]
    async fn update_keeps_the_path_key() {
        let repo = repository().await;
        repo.create(&book("010101", "Test Title")).await.unwrap();

        let mut changes = book("999999", "New Title");
        changes.pages = 500;
        let updated = repo.update("010101", &changes).await.unwrap();

        assert_eq!(updated.isbn, "010101");
        assert_eq!(updated.title, "New Title");
        assert_eq!(updated.pages, 500);
        assert!(matches!(
            repo.get_by_isbn("999999").await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let repo = repository().await;

        assert!(matches!(
            repo.get_by_isbn("nope").await,
            Err(RepoError::NotFound(isbn)) if isbn == "nope"
        ));
        assert!(matches!(
            repo.update("nope", &book("nope", "x")).await,
            Err(RepoError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete_by_isbn("nope").await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let repo = repository().await;
        repo.create(&book("010101", "Test Title")).await.unwrap();

        repo.delete_by_isbn("010101").await.unwrap();

        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[test]
    fn not_found_message_names_the_isbn() {
        assert_eq!(
            RepoError::NotFound("123".to_string()).to_string(),
            "There is no book with an isbn '123'"
        );
    }
}
