//! Validation of write payloads against the Book schema.
//!
//! Violation messages are part of the public API: clients match on
//! substrings such as `instance requires property "year"`, so the rendered
//! text must not change.

use std::fmt;

use serde_json::{Map, Value};

use super::models::Book;

/// Every Book property, in schema order. All of them are required.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "isbn",
    "amazon_url",
    "author",
    "language",
    "pages",
    "publisher",
    "title",
    "year",
];

/// A single reason a payload does not match the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A required property is absent (`null` counts as present).
    MissingProperty(&'static str),
    /// The value at `path` is not of the `expected` JSON type.
    WrongType {
        path: String,
        expected: &'static str,
    },
    AboveMaximum {
        field: &'static str,
        limit: i64,
    },
    BelowMinimum {
        field: &'static str,
        limit: i64,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingProperty(field) => {
                write!(f, "instance requires property \"{}\"", field)
            }
            Violation::WrongType { path, expected } => {
                write!(f, "{} is not of a type(s) {}", path, expected)
            }
            Violation::AboveMaximum { field, limit } => {
                write!(f, "instance.{} must be less than or equal to {}", field, limit)
            }
            Violation::BelowMinimum { field, limit } => {
                write!(f, "instance.{} must be greater than or equal to {}", field, limit)
            }
        }
    }
}

/// Check `payload` against the Book schema.
///
/// Missing properties are reported first, then type and range problems, each
/// group in schema order. No coercion happens: `"2007"` is not an integer.
/// Unknown properties are ignored.
pub fn validate(payload: &Value) -> Result<Book, Vec<Violation>> {
    let Some(object) = payload.as_object() else {
        return Err(vec![Violation::WrongType {
            path: "instance".to_string(),
            expected: "object",
        }]);
    };

    let mut reader = Reader {
        object,
        violations: REQUIRED_FIELDS
            .iter()
            .filter(|field| !object.contains_key(**field))
            .map(|field| Violation::MissingProperty(*field))
            .collect(),
    };

    let isbn = reader.string("isbn");
    let amazon_url = reader.string("amazon_url");
    let author = reader.string("author");
    let language = reader.string("language");
    let pages = reader.integer("pages");
    let publisher = reader.string("publisher");
    let title = reader.string("title");
    let year = reader.integer("year");

    match (isbn, amazon_url, author, language, pages, publisher, title, year) {
        (
            Some(isbn),
            Some(amazon_url),
            Some(author),
            Some(language),
            Some(pages),
            Some(publisher),
            Some(title),
            Some(year),
        ) if reader.violations.is_empty() => Ok(Book {
            isbn,
            amazon_url,
            author,
            language,
            pages,
            publisher,
            title,
            year,
        }),
        _ => Err(reader.violations),
    }
}

struct Reader<'a> {
    object: &'a Map<String, Value>,
    violations: Vec<Violation>,
}

impl Reader<'_> {
    fn wrong_type(&mut self, field: &'static str, expected: &'static str) {
        self.violations.push(Violation::WrongType {
            path: format!("instance.{}", field),
            expected,
        });
    }

    fn string(&mut self, field: &'static str) -> Option<String> {
        match self.object.get(field)? {
            Value::String(value) => Some(value.clone()),
            _ => {
                self.wrong_type(field, "string");
                None
            }
        }
    }

    fn integer(&mut self, field: &'static str) -> Option<i32> {
        let value = self.object.get(field)?;
        let Some(number) = as_integer(value) else {
            self.wrong_type(field, "integer");
            return None;
        };

        match i32::try_from(number) {
            Ok(number) => Some(number),
            Err(_) if number > 0 => {
                self.violations.push(Violation::AboveMaximum {
                    field,
                    limit: i32::MAX.into(),
                });
                None
            }
            Err(_) => {
                self.violations.push(Violation::BelowMinimum {
                    field,
                    limit: i32::MIN.into(),
                });
                None
            }
        }
    }
}

/// Whole JSON numbers, including ones written with a zero fraction (`2007.0`).
fn as_integer(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };

    if let Some(n) = number.as_i64() {
        return Some(n);
    }
    if number.as_u64().is_some() {
        return Some(i64::MAX);
    }
    // Float-to-int `as` casts saturate, which keeps huge values out of range.
    number
        .as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .map(|f| f as i64)
}
