//! Catalogue browsing and per-user favorites.

use crate::auth::Session;
use crate::db::{Book, Database, Value};
use crate::error::{AppError, Result};

/// Library operations on behalf of a logged-in user or for anyone browsing.
#[derive(Debug, Clone)]
pub struct LibraryService {
    db: Database,
    sample_size: usize,
}

impl LibraryService {
    /// Create a library service. `sample_size` is the default catalogue size.
    pub fn new(db: Database, sample_size: usize) -> Self {
        Self { db, sample_size }
    }

    /// Make sure the schema exists and seed the catalogue when it is empty.
    ///
    /// `seeder` only runs on an empty `books` table. Returns the number of
    /// books inserted, 0 when the catalogue was already populated. A seeder
    /// that yields no books is a [`AppError::NotFound`] error.
    pub fn startup<F>(&self, seeder: F) -> Result<usize>
    where
        F: FnOnce() -> Result<Vec<Book>>,
    {
        self.db.ensure_schema()?;

        if !self.db.is_table_empty("books")? {
            tracing::debug!("Catalogue already seeded");
            return Ok(0);
        }

        let books = seeder()?;
        if books.is_empty() {
            return Err(AppError::NotFound(
                "No books found to seed the catalogue".to_string(),
            ));
        }

        let inserted = self.db.books().insert_many(&books)?;
        tracing::info!(books = inserted, "Seeded catalogue");
        Ok(inserted)
    }

    /// Every book, ordered by id.
    pub fn all_books(&self) -> Result<Vec<Book>> {
        self.db.books().list()
    }

    /// A random selection of `n` books, or the configured sample size.
    pub fn catalogue(&self, n: Option<usize>) -> Result<Vec<Book>> {
        self.db.books().random(n.unwrap_or(self.sample_size))
    }

    /// Mean page count across the catalogue, halves rounded to even.
    pub fn average_pages(&self) -> Result<Option<u32>> {
        Ok(self
            .db
            .books()
            .average_pages()?
            .map(|avg| avg.round_ties_even() as u32))
    }

    /// The book with the most pages.
    pub fn largest_book(&self) -> Result<Option<Book>> {
        self.db.books().largest()
    }

    /// Books the session user has favorited.
    pub fn favorites(&self, session: &Session) -> Result<Vec<Book>> {
        self.db.favorites().books_for(&session.email)
    }

    /// Favorite a book. Adding one twice is a no-op and returns false.
    pub fn add_favorite(&self, session: &Session, book_id: i64) -> Result<bool> {
        if self.db.books().get(book_id)?.is_none() {
            return Err(AppError::NotFound(format!("Book {}", book_id)));
        }

        let added = self.db.favorites().add(&session.email, book_id)?;
        tracing::info!(email = %session.email, book_id, added, "Add favorite");
        Ok(added)
    }

    /// Remove a book from the session user's favorites.
    pub fn remove_favorite(&self, session: &Session, book_id: i64) -> Result<bool> {
        let removed = self.db.favorites().remove(&session.email, book_id)?;
        tracing::info!(email = %session.email, book_id, removed, "Remove favorite");
        Ok(removed)
    }

    /// How many users have favorited `book_id`.
    pub fn popularity(&self, book_id: i64) -> Result<i64> {
        self.db
            .get_count_of_relations("favorites", "book_id", Value::Integer(book_id))
    }
}
