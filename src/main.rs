//! shelf-rs entry point.

use clap::Parser;
use shelf_rs::{
    AuthService, LibraryService,
    config::{BooksCommand, Cli, Command, Config, FavoritesCommand},
    db::{Book, Database},
    seed::Seeder,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelf_rs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    match cli.command {
        Command::Init { force } => cmd_init(force),
        Command::Seed { dir } => cmd_seed(&config, dir),
        Command::Register { email, password } => cmd_register(&config, &email, password),
        Command::Books { action } => cmd_books(&config, action),
        Command::Favorites {
            email,
            password,
            action,
        } => cmd_favorites(&config, &email, password, action),
    }
}

/// Initialize config and database.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());

    let config = Config::default();
    let db = Database::open(&config.database.path)?;
    db.ensure_schema()?;
    println!("Initialized database: {}", config.database.path.display());

    println!("\nSave book-list pages as {}/<category>.html", config.seed.dir.display());
    println!("Then run: shelf-rs seed");
    println!("And: shelf-rs register <email>");

    Ok(())
}

/// Seed the catalogue if it is empty.
fn cmd_seed(config: &Config, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let dir = dir.unwrap_or_else(|| config.seed.dir.clone());
    let seeder = Seeder::new(config.seed.clone())?;
    let library = library_service(config)?;

    let inserted = library.startup(|| seeder.books_from_dir(&dir))?;
    if inserted == 0 {
        println!("Catalogue already has books, nothing seeded.");
    } else {
        println!("Seeded {} books from {}", inserted, dir.display());
    }

    Ok(())
}

/// Register a new account.
fn cmd_register(config: &Config, email: &str, password: Option<String>) -> anyhow::Result<()> {
    let auth = auth_service(config)?;
    let password = match password {
        Some(p) => p,
        None => prompt_password("Password: ")?,
    };

    let user = auth.register(email, &password)?;
    println!("Registration successful: {}", user.email);
    Ok(())
}

/// Catalogue commands.
fn cmd_books(config: &Config, action: BooksCommand) -> anyhow::Result<()> {
    let library = library_service(config)?;

    match action {
        BooksCommand::List { json } => print_books(&library.all_books()?, json)?,
        BooksCommand::Random { count, json } => print_books(&library.catalogue(count)?, json)?,
        BooksCommand::Stats => {
            match library.average_pages()? {
                Some(avg) => println!("Average pages: {}", avg),
                None => println!("Average pages: n/a"),
            }
            match library.largest_book()? {
                Some(book) => println!(
                    "Largest book:  {} ({} pages)",
                    book.name,
                    book.num_pages.unwrap_or_default()
                ),
                None => println!("Largest book:  n/a"),
            }
        }
    }

    Ok(())
}

/// Favorites commands for a logged-in user.
fn cmd_favorites(
    config: &Config,
    email: &str,
    password: Option<String>,
    action: FavoritesCommand,
) -> anyhow::Result<()> {
    let auth = auth_service(config)?;
    let password = match password {
        Some(p) => p,
        None => prompt_password("Password: ")?,
    };
    let session = auth.login(email, &password)?;
    let library = library_service(config)?;

    match action {
        FavoritesCommand::List => {
            let books = library.favorites(&session)?;
            if books.is_empty() {
                println!("No favorites yet.");
            } else {
                print_books(&books, false)?;
            }
        }
        FavoritesCommand::Add { book_id } => {
            if library.add_favorite(&session, book_id)? {
                println!("Added book {} to favorites", book_id);
            } else {
                println!("Book {} is already a favorite", book_id);
            }
        }
        FavoritesCommand::Remove { book_id } => {
            if library.remove_favorite(&session, book_id)? {
                println!("Removed book {} from favorites", book_id);
            } else {
                println!("Book {} was not a favorite", book_id);
            }
        }
    }

    Ok(())
}

fn open_db(config: &Config) -> anyhow::Result<Database> {
    let db = Database::open(&config.database.path)?;
    db.ensure_schema()?;
    Ok(db)
}

fn auth_service(config: &Config) -> anyhow::Result<AuthService> {
    Ok(AuthService::new(
        open_db(config)?,
        config.auth.registration_enabled(),
        config.auth.min_password_len,
    ))
}

fn library_service(config: &Config) -> anyhow::Result<LibraryService> {
    Ok(LibraryService::new(
        open_db(config)?,
        config.catalogue.sample_size,
    ))
}

fn print_books(books: &[Book], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(books)?);
        return Ok(());
    }

    println!(
        "{:<6} {:<40} {:<25} {:>5} {:<10} CATEGORY",
        "ID", "NAME", "AUTHOR", "PAGES", "COVER"
    );
    println!("{}", "-".repeat(100));
    for book in books {
        println!(
            "{:<6} {:<40} {:<25} {:>5} {:<10} {}",
            book.book_id,
            truncate(&book.name, 40),
            truncate(book.author.as_deref().unwrap_or("-"), 25),
            book.num_pages.map(|n| n.to_string()).unwrap_or_default(),
            book.cover_type.as_deref().unwrap_or("-"),
            book.category.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

/// Prompt for password input.
fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;

    Ok(password.trim().to_string())
}
