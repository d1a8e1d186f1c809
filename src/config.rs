use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Personal book library with favorites.
#[derive(Parser, Debug, Clone)]
#[command(name = "shelf-rs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "SHELF_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a default config file and the database schema.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },

    /// Seed the catalogue from saved book-list pages if it is empty.
    Seed {
        /// Directory of `<category>.html` pages (overrides config).
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Register a new account.
    Register {
        /// Email address.
        email: String,
        /// Password (will prompt if not provided).
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Browse the catalogue.
    Books {
        /// Books subcommand action.
        #[command(subcommand)]
        action: BooksCommand,
    },

    /// Manage your favorites.
    Favorites {
        /// Account email.
        #[arg(short, long)]
        email: String,
        /// Password (will prompt if not provided).
        #[arg(short, long)]
        password: Option<String>,
        /// Favorites subcommand action.
        #[command(subcommand)]
        action: FavoritesCommand,
    },
}

/// Catalogue subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum BooksCommand {
    /// Show every book.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show a random selection of books.
    Random {
        /// Number of books (defaults to the configured sample size).
        count: Option<usize>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show average page count and the largest book.
    Stats,
}

/// Favorites subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum FavoritesCommand {
    /// List your favorite books.
    List,
    /// Add a book to your favorites.
    Add {
        /// Book id.
        book_id: i64,
    },
    /// Remove a book from your favorites.
    Remove {
        /// Book id.
        book_id: i64,
    },
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Catalogue browsing configuration.
    #[serde(default)]
    pub catalogue: CatalogueConfig,

    /// Seeding configuration.
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/library.db")
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Registration mode: "open", "disabled".
    #[serde(default = "default_registration")]
    pub registration: String,

    /// Shortest accepted password.
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            registration: default_registration(),
            min_password_len: default_min_password_len(),
        }
    }
}

fn default_registration() -> String {
    "open".to_string()
}

fn default_min_password_len() -> usize {
    4
}

impl AuthConfig {
    /// Check if registration is enabled.
    pub fn registration_enabled(&self) -> bool {
        self.registration == "open"
    }
}

/// Catalogue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueConfig {
    /// Books shown by `books random` without an explicit count.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
        }
    }
}

fn default_sample_size() -> usize {
    10
}

/// Seeding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Directory holding `<category>.html` book-list pages.
    #[serde(default = "default_seed_dir")]
    pub dir: PathBuf,

    /// Lower bound for generated page counts.
    #[serde(default = "default_min_pages")]
    pub min_pages: i64,

    /// Upper bound (inclusive) for generated page counts.
    #[serde(default = "default_max_pages")]
    pub max_pages: i64,

    /// Cover types picked at random for seeded books.
    #[serde(default = "default_cover_types")]
    pub cover_types: Vec<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            dir: default_seed_dir(),
            min_pages: default_min_pages(),
            max_pages: default_max_pages(),
            cover_types: default_cover_types(),
        }
    }
}

fn default_seed_dir() -> PathBuf {
    PathBuf::from("data/lists")
}

fn default_min_pages() -> i64 {
    300
}

fn default_max_pages() -> i64 {
    900
}

fn default_cover_types() -> Vec<String> {
    ["Hardback", "Paperback", "Softcover"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl SeedConfig {
    /// Reject page ranges and cover lists the seeder cannot draw from.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.min_pages < 0 || self.min_pages > self.max_pages {
            return Err(crate::error::AppError::Config(format!(
                "Invalid page range {}..={}",
                self.min_pages, self.max_pages
            )));
        }
        if self.cover_types.is_empty() {
            return Err(crate::error::AppError::Config(
                "At least one cover type is required".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> crate::error::Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to parse config file: {}", e))
        })?;
        config.seed.validate()?;
        Ok(config)
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("config.toml"),
            PathBuf::from("shelf-rs.toml"),
            dirs::config_dir()
                .map(|p| p.join("shelf-rs").join("config.toml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/shelf-rs/config.toml"),
        ];

        candidates
            .into_iter()
            .find(|p| !p.as_os_str().is_empty() && p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# shelf-rs configuration

[database]
path = "data/library.db"

[auth]
# Registration mode: "open" or "disabled"
registration = "open"
min_password_len = 4

[catalogue]
# Books shown by `shelf-rs books random`
sample_size = 10

[seed]
# One saved book-list page per category, e.g. data/lists/fantasy.html
dir = "data/lists"
min_pages = 300
max_pages = 900
cover_types = ["Hardback", "Paperback", "Softcover"]
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips() {
        let config = Config::parse(&Config::generate_default()).unwrap();
        assert_eq!(config.database.path, PathBuf::from("data/library.db"));
        assert!(config.auth.registration_enabled());
        assert_eq!(config.auth.min_password_len, 4);
        assert_eq!(config.catalogue.sample_size, 10);
        assert_eq!(config.seed.cover_types.len(), 3);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = Config::parse("[auth]\nregistration = \"disabled\"\n").unwrap();
        assert!(!config.auth.registration_enabled());
        assert_eq!(config.seed.min_pages, 300);
        assert_eq!(config.seed.max_pages, 900);
    }

    #[test]
    fn test_invalid_page_range_rejected() {
        let err = Config::parse("[seed]\nmin_pages = 900\nmax_pages = 300\n").unwrap_err();
        assert!(matches!(err, crate::error::AppError::Config(_)));
    }
}
