use serde::{Deserialize, Serialize};

/// A row of the `books` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Primary key; also the resource id in URLs
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i32,
    pub publisher: String,
    pub title: String,
    pub year: i32,
}

/// `{ "book": {...} }`
#[derive(Debug, Serialize)]
pub struct BookEnvelope {
    pub book: Book,
}

/// `{ "books": [...] }`
#[derive(Debug, Serialize)]
pub struct BookList {
    pub books: Vec<Book>,
}

/// `{ "message": "..." }`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
