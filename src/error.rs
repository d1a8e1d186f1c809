use rusqlite::ErrorCode;
use rusqlite::ffi;
use thiserror::Error;

/// Which constraint a rejected write ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Primary key or UNIQUE column collision.
    Unique,
    /// Reference to a row that does not exist.
    ForeignKey,
    /// NULL written to a NOT NULL column.
    NotNull,
    /// CHECK or any other constraint.
    Other,
}

impl ConstraintKind {
    fn from_extended_code(code: i32) -> Self {
        match code {
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => Self::Unique,
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Self::ForeignKey,
            ffi::SQLITE_CONSTRAINT_NOTNULL => Self::NotNull,
            _ => Self::Other,
        }
    }
}

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// A write violated a uniqueness, foreign key or other constraint.
    #[error("Constraint violation ({kind:?}): {message}")]
    Constraint {
        /// Constraint that was violated.
        kind: ConstraintKind,
        /// Message reported by SQLite.
        message: String,
    },

    /// The database file is locked, busy or cannot be read/written.
    #[error("Database unavailable: {0}. Close any other instance using it and try again")]
    Unavailable(String),

    /// Positional insert with the wrong number of values.
    #[error("Table '{table}' has {expected} columns but {got} values were given")]
    Arity {
        /// Target table.
        table: String,
        /// Number of declared columns.
        expected: usize,
        /// Number of supplied values.
        got: usize,
    },

    /// Table name not present in the schema.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Column name not present in the given table.
    #[error("Unknown column '{column}' in table '{table}'")]
    UnknownColumn {
        /// Table that was searched.
        table: String,
        /// Column that was not found.
        column: String,
    },

    /// Caller supplied unusable input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Registration with an email that already has an account.
    #[error("This email is already registered")]
    EmailTaken,

    /// Login with an email that has no account.
    #[error("No such email found")]
    UnknownEmail,

    /// Login with a wrong password.
    #[error("Password is incorrect")]
    WrongPassword,

    /// Registration is switched off in the configuration.
    #[error("Registration is disabled")]
    RegistrationDisabled,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other SQLite failure.
    #[error("Database error: {0}")]
    Database(rusqlite::Error),
}

impl AppError {
    /// True for constraint violations of the given kind.
    pub fn is_constraint(&self, kind: ConstraintKind) -> bool {
        matches!(self, AppError::Constraint { kind: k, .. } if *k == kind)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, msg) = &e {
            let message = msg.clone().unwrap_or_else(|| err.to_string());
            match err.code {
                ErrorCode::ConstraintViolation => {
                    return AppError::Constraint {
                        kind: ConstraintKind::from_extended_code(err.extended_code),
                        message,
                    };
                }
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::ReadOnly
                | ErrorCode::SystemIoFailure
                | ErrorCode::DiskFull
                | ErrorCode::PermissionDenied
                | ErrorCode::FileLockingProtocolFailed => {
                    return AppError::Unavailable(message);
                }
                _ => {}
            }
        }
        AppError::Database(e)
    }
}

/// Result type alias for the application.
pub type Result<T> = std::result::Result<T, AppError>;
