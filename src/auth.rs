//! Authentication module.

use crate::db::{Database, User};
use crate::error::{AppError, ConstraintKind, Result};
use sha2::{Digest, Sha256};

/// Hash a password as lowercase hex SHA-256.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    format!("{:x}", digest)
}

/// Check a password against a stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password) == stored_hash
}

/// The authenticated user, handed to everything that acts on their behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Email of the logged-in user.
    pub email: String,
}

/// Authentication service.
pub struct AuthService {
    db: Database,
    registration_enabled: bool,
    min_password_len: usize,
}

impl AuthService {
    /// Create a new auth service.
    pub fn new(db: Database, registration_enabled: bool, min_password_len: usize) -> Self {
        Self {
            db,
            registration_enabled,
            min_password_len,
        }
    }

    /// Register a new user.
    pub fn register(&self, email: &str, password: &str) -> Result<User> {
        if !self.registration_enabled {
            return Err(AppError::RegistrationDisabled);
        }

        let email = email.trim();
        let taken = self
            .db
            .search("users", Some(&["email"][..]), &[])?
            .iter()
            .any(|row| matches!(row.first(), Some(crate::db::Value::Text(e)) if e == email));
        if taken {
            return Err(AppError::EmailTaken);
        }

        if !email.contains('@') {
            return Err(AppError::InvalidInput("Invalid email".to_string()));
        }

        if password.chars().count() < self.min_password_len {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {} characters",
                self.min_password_len
            )));
        }

        let user = User {
            email: email.to_string(),
            password_hash: hash_password(password),
        };

        self.db.users().create(&user).map_err(|e| {
            if e.is_constraint(ConstraintKind::Unique) {
                AppError::EmailTaken
            } else {
                e
            }
        })?;

        tracing::info!(email = %user.email, "Registered user");
        Ok(user)
    }

    /// Check credentials and open a session.
    pub fn login(&self, email: &str, password: &str) -> Result<Session> {
        let user = self
            .db
            .users()
            .find(email.trim())?
            .ok_or(AppError::UnknownEmail)?;

        if !verify_password(password, &user.password_hash) {
            tracing::debug!(email = %user.email, "Rejected login");
            return Err(AppError::WrongPassword);
        }

        tracing::info!(email = %user.email, "Logged in");
        Ok(Session { email: user.email })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_hex_sha256() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_password("").len(), 64);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("hunter22");
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }
}
