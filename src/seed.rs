//! Catalogue seeding from saved book-list pages.
//!
//! Each page holds a ranked list of books in its first `<table>`. One page
//! is expected per category, named after it (`fantasy.html`, `sci-fi.html`).

use crate::config::SeedConfig;
use crate::db::Book;
use crate::error::{AppError, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

selector!(TABLE_SELECTOR, "table");
selector!(ROW_SELECTOR, "tr");
selector!(CELL_SELECTOR, "td");
selector!(TITLE_SELECTOR, "a.bookTitle");
selector!(AUTHOR_SELECTOR, "a.authorName");

/// A book as read from a list page, before ids and details are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedBook {
    /// Title.
    pub name: String,
    /// Author, if the row had one.
    pub author: Option<String>,
    /// Category of the page it came from.
    pub category: String,
}

/// Parse every book row of the first table in `html`.
pub fn parse_list(html: &str, category: &str) -> Vec<ScrapedBook> {
    let document = Html::parse_document(html);
    let Some(table) = document.select(&TABLE_SELECTOR).next() else {
        return Vec::new();
    };

    table
        .select(&ROW_SELECTOR)
        .filter_map(|row| parse_row(row, category))
        .collect()
}

fn parse_row(row: ElementRef<'_>, category: &str) -> Option<ScrapedBook> {
    let (name, author) = match row.select(&TITLE_SELECTOR).next() {
        Some(title) => (
            element_text(title),
            row.select(&AUTHOR_SELECTOR)
                .next()
                .map(element_text)
                .filter(|a| !a.is_empty()),
        ),
        None => {
            let cell = row.select(&CELL_SELECTOR).nth(2)?;
            split_title_author(&element_text(cell))
        }
    };

    if name.is_empty() {
        return None;
    }

    Some(ScrapedBook {
        name,
        author,
        category: category.to_string(),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a "Title by Author (extra) 4.2 avg rating" cell.
///
/// The author ends at the first `(` or digit.
pub fn split_title_author(cell: &str) -> (String, Option<String>) {
    let cell = collapse_whitespace(cell);
    match cell.split_once(" by ") {
        Some((title, rest)) => {
            let end = rest
                .find(|c: char| c == '(' || c.is_ascii_digit())
                .unwrap_or(rest.len());
            let author = rest[..end].trim();
            let author = (!author.is_empty()).then(|| author.to_string());
            (title.trim().to_string(), author)
        }
        None => (cell.trim().to_string(), None),
    }
}

/// List `<category>.html` pages directly inside `dir`, sorted alphabetically
/// by file stem.
pub fn discover_lists(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Err(AppError::NotFound(format!(
            "Seed directory {}",
            dir.display()
        )));
    }

    let mut lists = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| AppError::Io(e.into()))?;
        let path = entry.path();
        let is_html = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
        if !entry.file_type().is_file() || !is_html {
            continue;
        }
        if let Some(category) = path.file_stem().and_then(|s| s.to_str()) {
            lists.push((category.to_string(), path.to_path_buf()));
        }
    }

    lists.sort();
    Ok(lists)
}

/// Turns list pages into catalogue rows.
pub struct Seeder {
    config: SeedConfig,
}

impl Seeder {
    /// Create a seeder with the given page range and cover types.
    pub fn new(config: SeedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Read and parse every list page in `dir`, in parallel.
    pub fn scrape_dir(&self, dir: &Path) -> Result<Vec<ScrapedBook>> {
        let lists = discover_lists(dir)?;

        let parsed = lists
            .par_iter()
            .map(|(category, path)| -> Result<Vec<ScrapedBook>> {
                let html = std::fs::read_to_string(path)?;
                let books = parse_list(&html, category);
                tracing::debug!(category = %category, books = books.len(), "Parsed book list");
                Ok(books)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(parsed.into_iter().flatten().collect())
    }

    /// Number, dedupe and fill in the scraped rows.
    ///
    /// Ids follow scrape order from 0 and are assigned before duplicates
    /// on (name, author) are dropped, so gaps are expected.
    pub fn build_books<R: Rng>(&self, scraped: Vec<ScrapedBook>, rng: &mut R) -> Vec<Book> {
        let mut seen = HashSet::new();
        let mut books = Vec::with_capacity(scraped.len());

        for (id, item) in scraped.into_iter().enumerate() {
            if !seen.insert((item.name.clone(), item.author.clone())) {
                continue;
            }
            books.push(Book {
                book_id: id as i64,
                name: item.name,
                author: item.author,
                num_pages: Some(rng.gen_range(self.config.min_pages..=self.config.max_pages)),
                cover_type: self.config.cover_types.choose(rng).cloned(),
                category: Some(item.category),
            });
        }

        books
    }

    /// Scrape `dir` and build the catalogue with the thread-local RNG.
    pub fn books_from_dir(&self, dir: &Path) -> Result<Vec<Book>> {
        let scraped = self.scrape_dir(dir)?;
        Ok(self.build_books(scraped, &mut rand::thread_rng()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const LIST_PAGE: &str = r#"
        <html><body>
        <table class="tableList">
          <tr>
            <td class="number">1</td>
            <td><img src="cover.jpg"></td>
            <td>
              <a class="bookTitle" href="/book/1"><span>The Name of the Wind</span></a>
              by <a class="authorName" href="/author/1"><span>Patrick Rothfuss</span></a>
            </td>
          </tr>
          <tr>
            <td class="number">2</td>
            <td></td>
            <td>The Way of Kings by Brandon Sanderson (Goodreads Author) 4.65 avg rating</td>
          </tr>
          <tr><td colspan="3">advert</td></tr>
        </table>
        <table><tr><td>1</td><td></td><td>Ignored by Nobody</td></tr></table>
        </body></html>
    "#;

    fn scraped(name: &str, author: &str, category: &str) -> ScrapedBook {
        ScrapedBook {
            name: name.to_string(),
            author: Some(author.to_string()),
            category: category.to_string(),
        }
    }

    #[test]
    fn test_parse_list_reads_anchors_and_plain_cells() {
        let books = parse_list(LIST_PAGE, "fantasy");
        assert_eq!(
            books,
            vec![
                scraped("The Name of the Wind", "Patrick Rothfuss", "fantasy"),
                scraped("The Way of Kings", "Brandon Sanderson", "fantasy"),
            ]
        );
    }

    #[test]
    fn test_parse_list_without_table() {
        assert!(parse_list("<p>nothing here</p>", "horror").is_empty());
    }

    #[test]
    fn test_split_title_author() {
        assert_eq!(
            split_title_author("Dune by Frank Herbert 4.3 avg rating"),
            ("Dune".to_string(), Some("Frank Herbert".to_string()))
        );
        assert_eq!(split_title_author("Untitled"), ("Untitled".to_string(), None));
    }

    #[test]
    fn test_build_books_dedupes_and_keeps_ids() {
        let seeder = Seeder::new(SeedConfig::default()).unwrap();
        let input = vec![
            scraped("Dune", "Frank Herbert", "sci-fi"),
            scraped("It", "Stephen King", "horror"),
            scraped("Dune", "Frank Herbert", "thriller"),
            scraped("Gone Girl", "Gillian Flynn", "thriller"),
        ];

        let mut rng = StdRng::seed_from_u64(7);
        let books = seeder.build_books(input, &mut rng);

        let ids: Vec<i64> = books.iter().map(|b| b.book_id).collect();
        assert_eq!(ids, vec![0, 1, 3]);
        assert_eq!(books[0].category.as_deref(), Some("sci-fi"));

        for book in &books {
            let pages = book.num_pages.unwrap();
            assert!((300..=900).contains(&pages));
            let cover = book.cover_type.as_deref().unwrap();
            assert!(["Hardback", "Paperback", "Softcover"].contains(&cover));
        }
    }

    #[test]
    fn test_scrape_dir_uses_file_stem_as_category() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sci-fi.html"), LIST_PAGE).unwrap();
        std::fs::write(dir.path().join("fantasy.html"), LIST_PAGE).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a list").unwrap();

        let seeder = Seeder::new(SeedConfig::default()).unwrap();
        let books = seeder.scrape_dir(dir.path()).unwrap();

        assert_eq!(books.len(), 4);
        assert_eq!(books[0].category, "fantasy");
        assert_eq!(books[3].category, "sci-fi");
    }

    #[test]
    fn test_discover_lists_alphabetical_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["thriller.html", "sci-fi.htm", "horror.html", "fantasy.html"] {
            std::fs::write(dir.path().join(name), LIST_PAGE).unwrap();
        }

        let categories: Vec<String> = discover_lists(dir.path())
            .unwrap()
            .into_iter()
            .map(|(category, _)| category)
            .collect();
        assert_eq!(categories, vec!["fantasy", "horror", "sci-fi", "thriller"]);
    }

    #[test]
    fn test_missing_seed_dir() {
        let dir = tempfile::tempdir().unwrap();
        let seeder = Seeder::new(SeedConfig::default()).unwrap();
        let err = seeder.scrape_dir(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
