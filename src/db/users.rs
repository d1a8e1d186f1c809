use crate::db::{Database, User};
use crate::error::Result;
use rusqlite::{OptionalExtension, params};

/// Typed access to the `users` table.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new account.
    pub fn create(&self, user: &User) -> Result<()> {
        let conn = self.db.connect()?;
        conn.execute(
            "INSERT INTO users (email, password) VALUES (?1, ?2)",
            params![user.email, user.password_hash],
        )?;
        Ok(())
    }

    /// Look up an account by email.
    pub fn find(&self, email: &str) -> Result<Option<User>> {
        let conn = self.db.connect()?;
        let user = conn
            .query_row(
                "SELECT email, password FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(User {
                        email: row.get(0)?,
                        password_hash: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Whether an account exists for `email`.
    pub fn exists(&self, email: &str) -> Result<bool> {
        Ok(self.find(email)?.is_some())
    }

    /// All registered emails, sorted.
    pub fn emails(&self) -> Result<Vec<String>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare("SELECT email FROM users ORDER BY email")?;
        let emails = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(emails)
    }
}
