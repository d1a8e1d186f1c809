use crate::db::{BookRepository, FavoriteRepository, UserRepository};
use crate::error::{AppError, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Handle on the library database file.
///
/// Only the path is kept; every call opens its own connection and drops it
/// when done, so no handle outlives a single operation.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Point at the database file at `path`, creating parent directories.
    ///
    /// The file itself is created by the first connection.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection with foreign keys enforced.
    ///
    /// The busy timeout is zero: a locked file fails at once with
    /// [`AppError::Unavailable`] instead of being retried.
    pub(crate) fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::ZERO)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    /// Users repository.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.clone())
    }

    /// Books repository.
    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.clone())
    }

    /// Favorites repository.
    pub fn favorites(&self) -> FavoriteRepository {
        FavoriteRepository::new(self.clone())
    }

    /// Create the users, books and favorites tables if absent.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute_batch(
            r#"
            -- Registered accounts
            CREATE TABLE IF NOT EXISTS users (
                email TEXT PRIMARY KEY NOT NULL,
                password TEXT NOT NULL
            );

            -- Catalogue, column order matters for positional inserts
            CREATE TABLE IF NOT EXISTS books (
                book_id INTEGER PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                author TEXT,
                num_pages INTEGER,
                cover_type TEXT,
                category TEXT
            );

            -- User <-> book favorites
            CREATE TABLE IF NOT EXISTS favorites (
                email TEXT,
                book_id INTEGER,
                FOREIGN KEY (email) REFERENCES users(email),
                FOREIGN KEY (book_id) REFERENCES books(book_id),
                PRIMARY KEY (email, book_id)
            );
            "#,
        )?;

        Ok(())
    }

    /// Whether a table called `name` exists.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let conn = self.connect()?;
        table_exists(&conn, name)
    }

    /// Whether `name` has no rows.
    pub fn is_table_empty(&self, name: &str) -> Result<bool> {
        let conn = self.connect()?;
        let table = quoted_table(&conn, name)?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        Ok(count == 0)
    }

    /// Column names of `name` in declaration order.
    pub fn get_columns(&self, name: &str) -> Result<Vec<String>> {
        let conn = self.connect()?;
        match stored_table_name(&conn, name)? {
            Some(stored) => columns(&conn, &stored),
            None => Err(AppError::UnknownTable(name.to_string())),
        }
    }
}

/// Stored spelling of table `name`. SQLite identifiers are case-insensitive,
/// so `USERS` resolves to `users`.
pub(crate) fn stored_table_name(conn: &Connection, name: &str) -> Result<Option<String>> {
    let found = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            params![name],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(found)
}

pub(crate) fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(stored_table_name(conn, name)?.is_some())
}

pub(crate) fn columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    let names = stmt
        .query_map(params![table], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Double-quote an identifier for direct use in SQL text.
pub(crate) fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Check `name` against the schema and return its stored spelling quoted.
pub(crate) fn quoted_table(conn: &Connection, name: &str) -> Result<String> {
    match stored_table_name(conn, name)? {
        Some(stored) => Ok(quote(&stored)),
        None => Err(AppError::UnknownTable(name.to_string())),
    }
}

/// Check every column against `known`, ignoring ASCII case, and return the
/// known spellings quoted.
pub(crate) fn quoted_columns<'a>(
    table: &str,
    known: &[String],
    wanted: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<String>> {
    wanted
        .into_iter()
        .map(|column| {
            known
                .iter()
                .find(|k| k.eq_ignore_ascii_case(column))
                .map(|k| quote(k))
                .ok_or_else(|| AppError::UnknownColumn {
                    table: table.to_string(),
                    column: column.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes_embedded_quotes() {
        assert_eq!(quote("books"), "\"books\"");
        assert_eq!(quote("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn quoted_columns_rejects_unknown() {
        let known = vec!["email".to_string(), "book_id".to_string()];
        let ok = quoted_columns("favorites", &known, ["book_id"]).unwrap();
        assert_eq!(ok, vec!["\"book_id\"".to_string()]);

        let err = quoted_columns("favorites", &known, ["email; DROP TABLE users"]).unwrap_err();
        assert!(matches!(err, AppError::UnknownColumn { .. }));
    }

    #[test]
    fn quoted_columns_uses_stored_spelling() {
        let known = vec!["email".to_string(), "book_id".to_string()];
        let ok = quoted_columns("favorites", &known, ["EMAIL", "Book_Id"]).unwrap();
        assert_eq!(ok, vec!["\"email\"".to_string(), "\"book_id\"".to_string()]);
    }
}
