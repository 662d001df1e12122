//! STALCRAFT Catalog
//!
//! Terminal browser and command-line tools for the STALCRAFT item database.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use crossterm::event;

use stalcraft_catalog::tui::{
    handle_event, process_state, render, restore_terminal, setup_terminal, AppState,
};
use stalcraft_catalog::{
    config, render_item, render_plain, CatalogClient, Config, ItemRepository, ItemStore,
    RenderOptions,
};

#[derive(Debug, Parser)]
#[command(name = "stalcraft-catalog", version, about)]
struct Cli {
    /// Configuration file (defaults to the user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Cache database file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Language for translated strings (`ru`, `en`, ...).
    #[arg(long, global = true)]
    lang: Option<String>,
    /// Database region (`ru`, `global`, ...).
    #[arg(long, global = true)]
    region: Option<String>,
    /// More logging; repeat for trace output.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Browse the catalog interactively (default).
    Tui {
        /// Do not check for updates on start.
        #[arg(long)]
        offline: bool,
    },
    /// Download the catalog if a newer one is available.
    Refresh {
        /// Download even when the cache is current.
        #[arg(long)]
        force: bool,
    },
    /// Report whether a newer catalog is available.
    Check,
    /// List cached items.
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Show the detail view of one item.
    Show { id: String },
}

fn setup_tracing(verbose: u8, to_file: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("STALCRAFT_LOG").unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("stalcraft_catalog=info,warn"),
        1 => EnvFilter::new("stalcraft_catalog=debug,info"),
        _ => EnvFilter::new("stalcraft_catalog=trace,debug"),
    });

    // The TUI owns the terminal, so its logs go to a file.
    if to_file {
        let file = config::data_dir().ok().and_then(|dir| {
            std::fs::create_dir_all(&dir).ok()?;
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("stalcraft-catalog.log"))
                .ok()
        });
        if let Some(file) = file {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(db) = &cli.db {
        config.database_path = Some(db.clone());
    }
    if let Some(lang) = &cli.lang {
        config.language = lang.clone();
    }
    if let Some(region) = &cli.region {
        config.region = region.clone();
    }
    Ok(config)
}

fn open_repository(config: &Config) -> anyhow::Result<ItemRepository<CatalogClient>> {
    let client = CatalogClient::new(config).context("building HTTP client")?;
    let path = config.database_path()?;
    let store = ItemStore::open(&path)
        .with_context(|| format!("opening cache {}", path.display()))?;
    Ok(ItemRepository::new(client, store))
}

fn run_tui(repo: ItemRepository<CatalogClient>, config: &Config, offline: bool) -> anyhow::Result<()> {
    let mut terminal = setup_terminal()?;
    let mut state = AppState::new(repo, config, offline);

    let result = (|| -> anyhow::Result<()> {
        loop {
            terminal.draw(|f| render(f, &state))?;

            process_state(&mut state);

            if state.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(100))? {
                let event = event::read()?;
                handle_event(event, &mut state);
            }
        }
        Ok(())
    })();

    restore_terminal(&mut terminal)?;
    result
}

fn run_refresh(repo: &mut ItemRepository<CatalogClient>, force: bool) -> anyhow::Result<()> {
    if !force && !repo.needs_update() {
        println!("Catalog is up to date");
        return Ok(());
    }
    let mut stderr = io::stderr();
    let count = repo.refresh(|done, total| {
        let _ = write!(stderr, "\rDownloading {done}/{total}");
        let _ = stderr.flush();
    })?;
    eprintln!();
    println!("Stored {count} items");
    Ok(())
}

fn run_check(repo: &ItemRepository<CatalogClient>) -> anyhow::Result<()> {
    match repo.last_update_display()? {
        Some(date) => println!("Cached catalog: {date}"),
        None => println!("Cached catalog: none"),
    }
    if repo.needs_update() {
        println!("A newer catalog is available");
    } else {
        println!("No update available");
    }
    Ok(())
}

fn run_list(
    repo: &ItemRepository<CatalogClient>,
    category: Option<&str>,
    lang: &str,
) -> anyhow::Result<()> {
    let items = match category {
        Some(category) => repo.items_by_category(category)?,
        None => repo.all_items()?,
    };
    let mut current: Option<&str> = None;
    for item in &items {
        if current != Some(item.category.as_str()) {
            println!("{}", item.category);
            current = Some(item.category.as_str());
        }
        println!("  {:<8} {}", item.id, item.display_name(lang));
    }
    Ok(())
}

fn run_show(
    repo: &ItemRepository<CatalogClient>,
    id: &str,
    options: &RenderOptions,
) -> anyhow::Result<()> {
    let Some(item) = repo.item_by_id(id)? else {
        bail!("no cached item with id {id}");
    };
    print!("{}", render_plain(&render_item(&item, options)));
    if let Some(path) = &item.icon_path {
        println!("Icon: {}", repo.source().icon_url(path));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_command = Command::Tui { offline: false };
    let command = cli.command.as_ref().unwrap_or(&default_command);
    setup_tracing(cli.verbose, matches!(command, Command::Tui { .. }));

    let config = load_config(&cli)?;
    let mut repo = open_repository(&config)?;
    let options = RenderOptions::from(&config);

    match command {
        Command::Tui { offline } => run_tui(repo, &config, *offline),
        Command::Refresh { force } => run_refresh(&mut repo, *force),
        Command::Check => run_check(&repo),
        Command::List { category } => run_list(&repo, category.as_deref(), &options.language),
        Command::Show { id } => run_show(&repo, id, &options),
    }
}
