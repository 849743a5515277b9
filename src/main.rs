use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use news_pager::config::{default_config_path, find_config_file, load_config, Backend, Config};
use news_pager::feed::NewsFeed;
use news_pager::models::Article;
use news_pager::paging::{LoadOutcome, PagingSnapshot, UiState};
use news_pager::settings::{AppEntry, FileSettingsStore, SettingsStore};
use news_pager::sources::SourceRegistry;
use news_pager::ui::{self, LoadSpinner};
use news_pager::utils::{articles_plain, articles_table};
use news_pager::NewsRepository;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// News Pager - Browse and search news headlines page by page
#[derive(Parser, Debug)]
#[command(name = "news-pager")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Browse and search news headlines page by page", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend to query, overriding the configuration
    #[arg(long, value_enum, global = true)]
    backend: Option<BackendArg>,

    /// API key, overriding the configuration and NEWS_API_KEY
    #[arg(long, global = true, env = "NEWS_PAGER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum BackendArg {
    #[value(name = "newsapi")]
    NewsApi,
    #[value(name = "newsdata")]
    NewsData,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::NewsApi => Backend::NewsApi,
            BackendArg::NewsData => Backend::NewsData,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the latest headlines from the configured outlets
    #[command(alias = "h")]
    Headlines {
        /// Number of pages to load
        #[arg(long, short, default_value_t = 1)]
        pages: u32,
    },

    /// Search articles from the configured search outlets
    #[command(alias = "s")]
    Search {
        /// Search query string
        query: String,

        /// Number of pages to load
        #[arg(long, short, default_value_t = 1)]
        pages: u32,
    },

    /// List available backends
    Sources,

    /// Inspect or change the onboarding flag
    Onboarding {
        #[command(subcommand)]
        action: OnboardingAction,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum OnboardingAction {
    /// Show whether onboarding was completed and where the app would start
    Show,
    /// Mark onboarding as completed
    Complete,
    /// Show onboarding again on next start
    Reset,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a configuration file with default values
    Init {
        /// Where to write; defaults to the user config directory
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

/// JSON shape of a listing
#[derive(Serialize)]
struct ListingOutput<'a> {
    state: UiState,
    query: Option<&'a str>,
    end_reached: bool,
    articles: &'a [Article],
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("news_pager={}", level)),
    );

    // Logs go to stderr so that stdout stays machine-readable.
    if config.logging.is_json() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load config from environment".to_string(),
    })?;
    if let Some(backend) = cli.backend {
        config.api.backend = backend.into();
    }

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::debug!("Using config file: {}", path.display());
    }

    match &cli.command {
        Commands::Headlines { pages } => {
            let repository = build_repository(&cli, &config)?;
            let feed = repository.get_news();
            run_listing(&cli, feed, *pages, "Fetching headlines").await
        }

        Commands::Search { query, pages } => {
            let query = query.trim();
            if query.is_empty() {
                bail!("Search query must not be empty");
            }
            let repository = build_repository(&cli, &config)?;
            let search = repository.search_news();
            search.set_query(query);
            search.settled().await;
            let feed = search.feed().clone();
            let result = run_listing(&cli, feed, *pages, "Searching").await;
            search.dispose();
            result
        }

        Commands::Sources => {
            let registry = SourceRegistry::new()?;
            let mut ids: Vec<&str> = registry.ids().collect();
            ids.sort_unstable();
            for id in ids {
                let Some(source) = registry.get(id) else {
                    continue;
                };
                let marker = if id == config.api.backend.id() { "*" } else { " " };
                let search = if source.supports_search() {
                    "browse, search"
                } else {
                    "browse"
                };
                println!("{} {:<10} {:<14} {}", marker, id, source.name(), search);
            }
            Ok(())
        }

        Commands::Onboarding { action } => {
            let path = match &config.settings.path {
                Some(path) => path.clone(),
                None => FileSettingsStore::default_path()
                    .context("Could not determine the user config directory")?,
            };
            let store: Arc<dyn SettingsStore> = Arc::new(FileSettingsStore::open(&path)?);
            let entry = AppEntry::new(store);

            match action {
                OnboardingAction::Show => {}
                OnboardingAction::Complete => entry.save_app_entry()?,
                OnboardingAction::Reset => entry.reset()?,
            }

            if !cli.quiet {
                println!("completed:         {}", entry.is_completed());
                println!("start destination: {}", entry.start_destination());
                println!("settings file:     {}", path.display());
            }
            Ok(())
        }

        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => {
                let path = match path {
                    Some(path) => path.clone(),
                    None => default_config_path()
                        .context("Could not determine the user config directory")?,
                };
                if path.exists() && !force {
                    bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                Config::default().save(&path)?;
                if !cli.quiet {
                    ui::print_success(&format!("Wrote {}", path.display()));
                }
                Ok(())
            }
            ConfigAction::Show => {
                let mut shown = config.clone();
                if shown.api.key.is_some() {
                    shown.api.key = Some("********".to_string());
                }
                print!("{}", toml::to_string_pretty(&shown)?);
                Ok(())
            }
        },
    }
}

fn build_repository(cli: &Cli, config: &Config) -> Result<NewsRepository> {
    let Some(api_key) = cli.api_key.clone().or_else(|| config.api.resolved_key()) else {
        bail!("No API key configured: set [api] key, NEWS_PAGER_API_KEY or NEWS_API_KEY");
    };

    let registry = SourceRegistry::new()?;
    Ok(NewsRepository::from_config(config, &registry, api_key)?)
}

/// Refresh `feed`, load up to `pages` pages and print the result.
async fn run_listing(cli: &Cli, feed: NewsFeed, pages: u32, message: &str) -> Result<()> {
    let spinner = (!cli.quiet).then(|| LoadSpinner::new(message));

    let loading = async {
        // A search feed has already loaded its first page.
        if feed.ui_state() == UiState::Idle {
            feed.refresh().await;
        }
        for page in 2..=pages {
            if let Some(spinner) = &spinner {
                spinner.page_loaded(page - 1, feed.snapshot().len());
            }
            match feed.load_more().await {
                LoadOutcome::Loaded { .. } => {}
                LoadOutcome::Failed(e) => {
                    tracing::warn!(page, "Loading more failed: {}", e);
                    break;
                }
                LoadOutcome::Skipped | LoadOutcome::Cancelled => break,
            }
        }
    };

    tokio::select! {
        _ = loading => {}
        _ = tokio::signal::ctrl_c() => {
            feed.dispose();
            if let Some(spinner) = &spinner {
                spinner.finish_with_error("Interrupted");
            }
            bail!("Interrupted");
        }
    }

    let snapshot = feed.snapshot();
    feed.dispose();

    match snapshot.ui_state() {
        UiState::Error => {
            let cause = snapshot
                .load_states()
                .refresh
                .error()
                .map(|e| e.to_string())
                .unwrap_or_default();
            if let Some(spinner) = &spinner {
                spinner.finish_with_error("Failed to load articles");
            }
            bail!("Failed to load articles: {}", cause);
        }
        UiState::Empty => {
            if let Some(spinner) = &spinner {
                spinner.finish_with_error("No articles found");
            }
            if let Some(e) = snapshot.load_states().refresh.error() {
                bail!("Failed to load articles: {}", e);
            }
        }
        state => {
            if let Some(spinner) = &spinner {
                spinner.finish_with_success(&format!(
                    "{} articles ({})",
                    snapshot.len(),
                    ui::ui_state_badge(state)
                ));
            }
        }
    }

    if let Some(e) = snapshot.append_error() {
        if !cli.quiet {
            ui::print_warning(&format!("Could not load more: {}", e));
        }
    }

    output_listing(&snapshot, cli.output)
}

fn output_listing(snapshot: &PagingSnapshot, format: OutputFormat) -> Result<()> {
    let actual_format = if format == OutputFormat::Auto {
        if ui::is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    };

    match actual_format {
        OutputFormat::Json => {
            let output = ListingOutput {
                state: snapshot.ui_state(),
                query: snapshot.query(),
                end_reached: snapshot.end_reached(),
                articles: snapshot.items(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if !snapshot.is_empty() {
                println!("{}", articles_plain(snapshot.items()));
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            if let Some(query) = snapshot.query() {
                ui::print_section(&format!("Results for \"{}\"", query));
            }
            println!("{}", articles_table(snapshot.items(), 0));
            if snapshot.end_reached() {
                println!("(end of results)");
            }
        }
    }
    Ok(())
}
