mod books;
mod favorites;
mod schema;
mod table;
mod users;

pub use books::BookRepository;
pub use favorites::FavoriteRepository;
pub use schema::Database;
pub use users::UserRepository;

pub use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// A table row as raw column values, in declaration order.
pub type Row = Vec<Value>;

/// Registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login email, primary key.
    pub email: String,
    /// Hex SHA-256 of the password.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Primary key.
    pub book_id: i64,
    /// Title.
    pub name: String,
    /// Author name.
    pub author: Option<String>,
    /// Page count.
    pub num_pages: Option<i64>,
    /// "Hardback", "Paperback", ...
    pub cover_type: Option<String>,
    /// Category the book was seeded under.
    pub category: Option<String>,
}

impl Book {
    /// Values in `books` column order, for positional inserts.
    pub fn to_row(&self) -> Row {
        vec![
            Value::Integer(self.book_id),
            Value::Text(self.name.clone()),
            self.author.clone().into(),
            self.num_pages.into(),
            self.cover_type.clone().into(),
            self.category.clone().into(),
        ]
    }

    pub(crate) fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            book_id: row.get(0)?,
            name: row.get(1)?,
            author: row.get(2)?,
            num_pages: row.get(3)?,
            cover_type: row.get(4)?,
            category: row.get(5)?,
        })
    }
}

/// A user's favorite book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    /// Owner email.
    pub email: String,
    /// Favorited book.
    pub book_id: i64,
}
