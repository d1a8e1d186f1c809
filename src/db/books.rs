use crate::db::{Book, Database};
use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, params};

const BOOK_COLUMNS: &str = "book_id, name, author, num_pages, cover_type, category";

/// Typed access to the `books` table.
#[derive(Debug, Clone)]
pub struct BookRepository {
    db: Database,
}

impl BookRepository {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert one book.
    pub fn insert(&self, book: &Book) -> Result<()> {
        let conn = self.db.connect()?;
        insert_book(&conn, book)
    }

    /// Insert `books` in a single transaction; all or nothing.
    pub fn insert_many(&self, books: &[Book]) -> Result<usize> {
        let mut conn = self.db.connect()?;
        let tx = conn.transaction()?;
        for book in books {
            insert_book(&tx, book)?;
        }
        tx.commit()?;
        Ok(books.len())
    }

    /// Fetch a book by id.
    pub fn get(&self, book_id: i64) -> Result<Option<Book>> {
        let conn = self.db.connect()?;
        let book = conn
            .query_row(
                &format!("SELECT {BOOK_COLUMNS} FROM books WHERE book_id = ?1"),
                params![book_id],
                Book::from_sql,
            )
            .optional()?;
        Ok(book)
    }

    /// Whole catalogue ordered by id.
    pub fn list(&self) -> Result<Vec<Book>> {
        self.query(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY book_id"), params![])
    }

    /// Up to `n` distinct books in random order.
    pub fn random(&self, n: usize) -> Result<Vec<Book>> {
        let limit = i64::try_from(n).unwrap_or(i64::MAX);
        self.query(
            &format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY RANDOM() LIMIT ?1"),
            params![limit],
        )
    }

    /// Number of books.
    pub fn count(&self) -> Result<i64> {
        let conn = self.db.connect()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?)
    }

    /// Change a book's category. Returns false if the book does not exist.
    pub fn set_category(&self, book_id: i64, category: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        let rows = conn.execute(
            "UPDATE books SET category = ?1 WHERE book_id = ?2",
            params![category, book_id],
        )?;
        Ok(rows > 0)
    }

    /// Mean page count, `None` when no book has one.
    pub fn average_pages(&self) -> Result<Option<f64>> {
        let conn = self.db.connect()?;
        Ok(conn.query_row("SELECT AVG(num_pages) FROM books", [], |row| row.get(0))?)
    }

    /// The book with the most pages; lowest id wins a tie.
    pub fn largest(&self) -> Result<Option<Book>> {
        let conn = self.db.connect()?;
        let book = conn
            .query_row(
                &format!(
                    "SELECT {BOOK_COLUMNS} FROM books
                     WHERE num_pages = (SELECT MAX(num_pages) FROM books)
                     ORDER BY book_id LIMIT 1"
                ),
                [],
                Book::from_sql,
            )
            .optional()?;
        Ok(book)
    }

    fn query(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Book>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let books = stmt
            .query_map(params, Book::from_sql)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(books)
    }
}

fn insert_book(conn: &Connection, book: &Book) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO books ({BOOK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
        params![
            book.book_id,
            book.name,
            book.author,
            book.num_pages,
            book.cover_type,
            book.category,
        ],
    )?;
    Ok(())
}
