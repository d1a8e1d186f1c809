use crate::db::{Book, Database, Favorite};
use crate::error::Result;
use rusqlite::{OptionalExtension, params};

/// Typed access to the `favorites` table.
#[derive(Debug, Clone)]
pub struct FavoriteRepository {
    db: Database,
}

impl FavoriteRepository {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }

    /// Mark `book_id` as a favorite of `email`.
    ///
    /// Returns false when the pair already existed. A missing user or book
    /// is still reported as a foreign key [`Constraint`] error.
    ///
    /// [`Constraint`]: crate::error::AppError::Constraint
    pub fn add(&self, email: &str, book_id: i64) -> Result<bool> {
        let conn = self.db.connect()?;
        // OR IGNORE covers the primary key only; foreign keys still fail
        let rows = conn.execute(
            "INSERT OR IGNORE INTO favorites (email, book_id) VALUES (?1, ?2)",
            params![email, book_id],
        )?;
        Ok(rows > 0)
    }

    /// Unmark a favorite. Returns false if it was not present.
    pub fn remove(&self, email: &str, book_id: i64) -> Result<bool> {
        let conn = self.db.connect()?;
        let rows = conn.execute(
            "DELETE FROM favorites WHERE email = ?1 AND book_id = ?2",
            params![email, book_id],
        )?;
        Ok(rows > 0)
    }

    /// Whether `email` has favorited `book_id`.
    pub fn is_favorite(&self, email: &str, book_id: i64) -> Result<bool> {
        let conn = self.db.connect()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM favorites WHERE email = ?1 AND book_id = ?2",
                params![email, book_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Books favorited by `email`, ordered by id.
    pub fn books_for(&self, email: &str) -> Result<Vec<Book>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(
            "SELECT b.book_id, b.name, b.author, b.num_pages, b.cover_type, b.category
             FROM books b
             JOIN favorites f ON f.book_id = b.book_id
             WHERE f.email = ?1
             ORDER BY b.book_id",
        )?;
        let books = stmt
            .query_map(params![email], Book::from_sql)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(books)
    }

    /// How many users favorited `book_id`.
    pub fn count_for_book(&self, book_id: i64) -> Result<i64> {
        let conn = self.db.connect()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM favorites WHERE book_id = ?1",
            params![book_id],
            |row| row.get(0),
        )?)
    }

    /// Every favorite pair.
    pub fn list(&self) -> Result<Vec<Favorite>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare("SELECT email, book_id FROM favorites ORDER BY email, book_id")?;
        let favorites = stmt
            .query_map([], |row| {
                Ok(Favorite {
                    email: row.get(0)?,
                    book_id: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(favorites)
    }
}
