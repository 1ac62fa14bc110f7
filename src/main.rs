use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;

use newsroom::api::{build_http_client, NewsClient};
use newsroom::config::Config;
use newsroom::settings::{Settings, KEY_CATEGORY, KEY_COUNTRY, KEY_LANGUAGE};
use newsroom::storage::{Article, Database, DatabaseError, NewArticle};
use newsroom::util::{single_line, strip_control_chars, truncate_to_width, validate_url_for_open};
use newsroom::viewmodel::{
    ArchiveViewModel, ArticlesViewModel, FiltersViewModel, HeadlinesViewModel, SearchViewModel,
};

/// Languages the search endpoint accepts, `all` meaning unfiltered
const SEARCH_LANGUAGES: [&str; 7] = ["all", "en", "es", "fr", "de", "it", "no"];

const TITLE_WIDTH: usize = 80;

/// Get the config directory path (~/.config/newsroom/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("newsroom"))
}

#[derive(Parser, Debug)]
#[command(name = "newsroom", version, about = "Search, save and archive news from NewsAPI")]
struct Args {
    /// Reset database (delete and recreate)
    #[arg(long, global = true)]
    reset_db: bool,

    /// Use this database file instead of ~/.config/newsroom/news.db
    #[arg(long, value_name = "FILE", global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search all articles by keyword
    Search {
        keyword: String,
        /// Language code, or "all"
        #[arg(short, long)]
        language: Option<String>,
        /// Save results by their 1-based position
        #[arg(long, value_name = "N", num_args = 1..)]
        save: Vec<usize>,
    },
    /// Show top headlines for the selected country and category
    Headlines {
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Save headlines by their 1-based position
        #[arg(long, value_name = "N", num_args = 1..)]
        save: Vec<usize>,
    },
    /// List saved articles
    Favorites,
    /// Move a saved article to the archive
    Archive { id: i64 },
    /// List archived articles
    Archived,
    /// Restore an archived article
    Restore { id: i64 },
    /// Permanently delete an article
    Delete { id: i64 },
    /// Open an article in the browser
    Open { id: i64 },
    /// Show, delete or clear search history
    History {
        #[arg(long, value_name = "ID", conflicts_with = "clear")]
        delete: Option<i64>,
        #[arg(long)]
        clear: bool,
    },
    /// List, add or remove headline countries
    Countries {
        #[arg(long, value_name = "NAME", conflicts_with = "remove")]
        add: Option<String>,
        #[arg(long, value_name = "ID")]
        remove: Option<i64>,
    },
    /// List, add or remove headline categories
    Categories {
        #[arg(long, value_name = "NAME", conflicts_with = "remove")]
        add: Option<String>,
        #[arg(long, value_name = "ID")]
        remove: Option<i64>,
    },
    /// Validate and store a NewsAPI key
    SetKey { key: String },
    /// Choose the default headline country, category or search language
    Select {
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        tracing::info!(path = %config_dir.display(), "Created config directory");
    }

    // User-only access to the directory holding the key and database
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config_path = config_dir.join("config.toml");
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {} (using defaults)", e);
            Config::default()
        }
    };

    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| config_dir.join("news.db"));

    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::Locked) => {
            eprintln!("Error: The database is locked by another newsroom process. Please try again.");
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    let mut settings = match Settings::load(&config, &db).await {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load stored settings, using config only");
            Settings::from_config(&config)
        }
    };

    let command = match args.command {
        Some(command) => command,
        None if args.reset_db => return Ok(()),
        None => Command::Headlines {
            country: None,
            category: None,
            save: Vec::new(),
        },
    };

    run(command, &config, &db, &mut settings).await
}

async fn run(command: Command, config: &Config, db: &Database, settings: &mut Settings) -> Result<()> {
    match command {
        Command::Search {
            keyword,
            language,
            save,
        } => {
            let language = language.unwrap_or_else(|| settings.language().to_string());
            if !SEARCH_LANGUAGES.contains(&language.as_str()) {
                anyhow::bail!(
                    "Unsupported language '{}'. Choose one of: {}",
                    language,
                    SEARCH_LANGUAGES.join(", ")
                );
            }

            let client = news_client(config, settings.api_key())?;
            let mut vm = SearchViewModel::new(db.clone(), client);
            vm.perform_search(&keyword, &language).await;

            if let Some(error) = &vm.error {
                anyhow::bail!("{}", error);
            }
            print_new_articles(&vm.articles);
            save_selected(db, &vm.articles, &save).await;
        }
        Command::Headlines {
            country,
            category,
            save,
        } => {
            let country = country.unwrap_or_else(|| settings.country().to_string());
            let category = category.unwrap_or_else(|| settings.category().to_string());

            let client = news_client(config, settings.api_key())?;
            let mut vm = HeadlinesViewModel::new(client);
            vm.load(&country, &category).await;

            if let Some(error) = &vm.error {
                anyhow::bail!("{}", error);
            }
            if vm.headlines.is_empty() {
                println!("No headlines for {} / {}.", country, display_category(&category));
            } else {
                println!("Top headlines: {} / {}", country, display_category(&category));
                print_new_articles(&vm.headlines);
            }
            save_selected(db, &vm.headlines, &save).await;
        }
        Command::Favorites => {
            let mut vm = ArticlesViewModel::new(db.clone());
            vm.load_favorites().await;
            if let Some(error) = &vm.error {
                anyhow::bail!("{}", error);
            }
            if vm.favorites.is_empty() {
                println!("No saved articles.");
            }
            print_saved_articles(&vm.favorites);
        }
        Command::Archive { id } => {
            let mut vm = ArticlesViewModel::new(db.clone());
            vm.move_to_trash(id).await;
            if let Some(error) = &vm.error {
                anyhow::bail!("{}", error);
            }
            println!("Article {} moved to archive.", id);
        }
        Command::Archived => {
            let mut vm = ArchiveViewModel::new(db.clone());
            vm.load_archived().await;
            if let Some(error) = &vm.error {
                anyhow::bail!("{}", error);
            }
            if vm.archived.is_empty() {
                println!("Archive is empty.");
            }
            print_saved_articles(&vm.archived);
        }
        Command::Restore { id } => {
            let mut vm = ArchiveViewModel::new(db.clone());
            vm.restore(id).await;
            if let Some(error) = &vm.error {
                anyhow::bail!("{}", error);
            }
            println!("Article {} restored.", id);
        }
        Command::Delete { id } => {
            let mut vm = ArchiveViewModel::new(db.clone());
            vm.delete(id).await;
            if let Some(error) = &vm.error {
                anyhow::bail!("{}", error);
            }
            println!("Article {} deleted.", id);
        }
        Command::Open { id } => {
            let article = db
                .get_article_by_id(id)
                .await
                .context("Failed to load article")?
                .ok_or_else(|| anyhow::anyhow!("No article with id {}", id))?;
            let url = validate_url_for_open(&article.url)
                .with_context(|| format!("Refusing to open article {}", id))?;
            open::that(url.as_str()).context("Failed to open browser")?;
        }
        Command::History { delete, clear } => {
            if clear {
                let removed = db
                    .clear_search_history()
                    .await
                    .context("Failed to clear search history")?;
                println!("Cleared {} searches.", removed);
            } else if let Some(id) = delete {
                if !db.delete_search(id).await.context("Failed to delete search")? {
                    anyhow::bail!("No search with id {}", id);
                }
                println!("Search {} deleted.", id);
            } else {
                let history = db
                    .get_search_history()
                    .await
                    .context("Failed to load search history")?;
                if history.is_empty() {
                    println!("No searches yet.");
                }
                for search in history {
                    println!(
                        "{:>5}  {}  {}",
                        search.id,
                        format_timestamp(search.created_at),
                        clean_line(&search.keyword)
                    );
                }
            }
        }
        Command::Countries { add, remove } => {
            let mut vm = FiltersViewModel::new(db.clone());
            if let Some(name) = add {
                vm.add(&name, "").await;
            } else if let Some(id) = remove {
                vm.remove_country(id).await;
            } else {
                vm.load().await;
            }
            if let Some(error) = &vm.error {
                anyhow::bail!("{}", error);
            }
            let combined = vm.combined_countries().await.context("Failed to list countries")?;
            println!("Countries: {}", combined.join(", "));
            for country in &vm.countries {
                println!("{:>5}  {}", country.id, country.name);
            }
        }
        Command::Categories { add, remove } => {
            let mut vm = FiltersViewModel::new(db.clone());
            if let Some(name) = add {
                vm.add("", &name).await;
            } else if let Some(id) = remove {
                vm.remove_category(id).await;
            } else {
                vm.load().await;
            }
            if let Some(error) = &vm.error {
                anyhow::bail!("{}", error);
            }
            let combined = vm
                .combined_categories()
                .await
                .context("Failed to list categories")?;
            println!("Categories: {}", combined.join(", "));
            for category in &vm.categories {
                println!("{:>5}  {}", category.id, category.name);
            }
        }
        Command::SetKey { key } => {
            let client = news_client(config, None)?;
            if !client.validate_api_key(&key).await {
                anyhow::bail!("API key is invalid.");
            }
            settings
                .set_api_key(db, &key)
                .await
                .context("Failed to store API key")?;
            println!("API key saved.");
        }
        Command::Select {
            country,
            category,
            language,
        } => {
            if country.is_none() && category.is_none() && language.is_none() {
                println!("Country:  {}", settings.country());
                println!("Category: {}", display_category(settings.category()));
                println!("Language: {}", settings.language());
                return Ok(());
            }

            if let Some(country) = country {
                let country = country.trim().to_lowercase();
                let known = db.combined_countries().await.context("Failed to list countries")?;
                if !known.contains(&country) {
                    anyhow::bail!("Unknown country '{}'. Choose one of: {}", country, known.join(", "));
                }
                settings.set(db, KEY_COUNTRY, &country).await?;
                println!("Country set to {}.", country);
            }
            if let Some(category) = category {
                let category = category.trim().to_lowercase();
                let known = db
                    .combined_categories()
                    .await
                    .context("Failed to list categories")?;
                if !category.is_empty() && !known.contains(&category) {
                    anyhow::bail!("Unknown category '{}'. Choose one of: {}", category, known.join(", "));
                }
                settings.set(db, KEY_CATEGORY, &category).await?;
                println!("Category set to {}.", display_category(&category));
            }
            if let Some(language) = language {
                let language = language.trim().to_lowercase();
                if !SEARCH_LANGUAGES.contains(&language.as_str()) {
                    anyhow::bail!(
                        "Unsupported language '{}'. Choose one of: {}",
                        language,
                        SEARCH_LANGUAGES.join(", ")
                    );
                }
                settings.set(db, KEY_LANGUAGE, &language).await?;
                println!("Language set to {}.", language);
            }
        }
    }
    Ok(())
}

fn news_client(config: &Config, api_key: Option<&SecretString>) -> Result<NewsClient> {
    let http = build_http_client(Duration::from_secs(config.request_timeout_secs))
        .context("Failed to create HTTP client")?;
    let api_key = api_key.map(|k| SecretString::from(k.expose_secret().to_string()));
    NewsClient::new(http, &config.base_url, api_key).context("Invalid news service base URL")
}

/// Save the articles at the given 1-based positions.
async fn save_selected(db: &Database, articles: &[NewArticle], positions: &[usize]) {
    if positions.is_empty() {
        return;
    }
    let vm = ArticlesViewModel::new(db.clone());
    for &n in positions {
        match n.checked_sub(1).and_then(|i| articles.get(i)) {
            Some(article) => println!("[{}] {}", n, vm.save(article).await),
            None => eprintln!("[{}] No such result.", n),
        }
    }
}

fn print_new_articles(articles: &[NewArticle]) {
    for (i, article) in articles.iter().enumerate() {
        println!("{:>3}. {}", i + 1, clean_title(&article.title));
        print_byline(article.author.as_deref(), &article.url);
    }
}

fn print_saved_articles(articles: &[Article]) {
    for article in articles {
        println!(
            "{:>5}  {}  {}",
            article.id,
            format_timestamp(article.created_at),
            clean_title(&article.title)
        );
        print_byline(article.author.as_deref(), &article.url);
    }
}

fn print_byline(author: Option<&str>, url: &str) {
    match author.map(clean_line).filter(|a| !a.is_empty()) {
        Some(author) => println!("       {} | {}", author, clean_line(url)),
        None => println!("       {}", clean_line(url)),
    }
}

/// Publisher text can carry escape sequences; never echo them to the terminal.
fn clean_line(s: &str) -> String {
    single_line(&strip_control_chars(s))
}

fn clean_title(title: &str) -> String {
    truncate_to_width(&clean_line(title), TITLE_WIDTH).into_owned()
}

fn display_category(category: &str) -> &str {
    if category.is_empty() {
        "all categories"
    } else {
        category
    }
}

fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
