//! `rshare` - CLI for the local ride board
//!
//! This binary provides the rider and driver pages, history export and a live
//! view that follows changes made from other terminals.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info};

use rshare::board::{ProfileForm, RiderForm};
use rshare::cli::{
    Cli, Command, ConfigCommand, DriverCommand, ExportFormat, HistoryCommand, OutputFormat,
    RiderCommand, WatchCommand,
};
use rshare::sync::{dispatch, Watcher};
use rshare::view::{self, LivePage, PageKind};
use rshare::{export, init_logging, Board, Config, Storage};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

/// Print an error. Mistakes in user input get one line, everything else the full chain.
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<rshare::Error>() {
        Some(inner) if inner.is_user_error() => eprintln!("Error: {inner}"),
        _ => eprintln!("Error: {err:?}"),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load_from(cli.config)?;
    let currency = config.display.currency_symbol.as_str();

    match cli.command {
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
        Command::Sample => {
            let request = open_board(&config)?.quick_sample()?;
            println!("Sample request added ({})", request.id);
            Ok(())
        }
        Command::Rider(rider_cmd) => handle_rider(&open_board(&config)?, currency, rider_cmd),
        Command::Driver(driver_cmd) => handle_driver(&open_board(&config)?, currency, driver_cmd),
        Command::History(history_cmd) => handle_history(&open_board(&config)?, history_cmd),
        Command::Watch(watch_cmd) => handle_watch(&config, &open_board(&config)?, &watch_cmd),
        Command::Status(status_cmd) => handle_status(&open_board(&config)?, status_cmd.json),
    }
}

fn open_board(config: &Config) -> anyhow::Result<Board> {
    let path = config.database_path();
    let storage = Storage::open(&path)
        .with_context(|| format!("failed to open board at {}", path.display()))?;
    Ok(Board::new(storage, config.fare.clone()))
}

fn print_page(
    board: &Board,
    kind: PageKind,
    currency: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let text = view::render_page(board, kind, currency, format.is_json())?;
    println!("{text}");
    Ok(())
}

fn handle_rider(board: &Board, currency: &str, cmd: RiderCommand) -> anyhow::Result<()> {
    match cmd {
        RiderCommand::Request {
            from,
            to,
            name,
            contact,
            id_document,
        } => {
            let request = board.submit_request(&RiderForm {
                from,
                to,
                name,
                contact,
                id_document,
            })?;
            println!(
                "Ride requested: {} → {}  {}{}  ({})",
                request.from, request.to, currency, request.fare, request.id
            );
        }
        RiderCommand::List { format } => print_page(board, PageKind::Rider, currency, format)?,
        RiderCommand::Review { id } => {
            let request = board.find_rider_request(&id)?;
            println!("{}", view::review_request(&request, currency));
        }
        RiderCommand::Close { id } => {
            if board.remove_rider_request(&id)? {
                println!("Request {id} closed");
            } else {
                println!("No rider request {id}");
            }
        }
        RiderCommand::ReviewPost { id } => {
            let post = board.find_driver_post(&id)?;
            println!("{}", view::review_post(&post));
        }
        RiderCommand::ClosePost { id } => {
            if board.remove_driver_post(&id)? {
                println!("Ride {id} removed");
            } else {
                println!("No driver post {id}");
            }
        }
    }
    Ok(())
}

fn handle_driver(board: &Board, currency: &str, cmd: DriverCommand) -> anyhow::Result<()> {
    match cmd {
        DriverCommand::Signup {
            name,
            contact,
            licence,
        } => {
            let profile = board.sign_up(&ProfileForm {
                name,
                contact,
                licence,
            })?;
            println!("Signed up as {} ({})", profile.name, profile.id);
        }
        DriverCommand::Logout => {
            if board.log_out()? {
                println!("Logged out");
            } else {
                println!("No driver profile");
            }
        }
        DriverCommand::Publish { from, to } => {
            let post = board.publish(&from, &to)?;
            println!("Ride published: {} → {}  ({})", post.from, post.to, post.id);
        }
        DriverCommand::List { format } => print_page(board, PageKind::Driver, currency, format)?,
        DriverCommand::Review { id } => {
            let request = board.find_rider_request(&id)?;
            println!("{}", view::review_request(&request, currency));
        }
        DriverCommand::Accept {
            id,
            complete,
            rating,
        } => {
            if complete {
                complete_ride(board, &id, rating.as_deref())?;
            } else {
                let request = board.accept(&id)?;
                println!("Accepted {} → {}  ({})", request.from, request.to, request.id);
            }
        }
        DriverCommand::Complete { id, rating } => complete_ride(board, &id, rating.as_deref())?,
        DriverCommand::Close { id } => {
            if board.remove_rider_request(&id)? {
                println!("Request {id} closed");
            } else {
                println!("No rider request {id}");
            }
        }
        DriverCommand::Unpublish { id } => {
            if board.remove_driver_post(&id)? {
                println!("Ride {id} removed");
            } else {
                println!("No driver post {id}");
            }
        }
    }
    Ok(())
}

fn complete_ride(board: &Board, id: &str, rating: Option<&str>) -> anyhow::Result<()> {
    let entry = board.complete(id, rating)?;
    println!("Completed {} → {}  ({})", entry.from, entry.to, entry.id);
    Ok(())
}

fn handle_history(board: &Board, cmd: HistoryCommand) -> anyhow::Result<()> {
    match cmd {
        HistoryCommand::List { format } => {
            let history = board.history();
            if format.is_json() {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                print!("{}", view::render_history(&history));
            }
        }
        HistoryCommand::Export { format, output } => {
            let history = board.history();
            let (content, default_name) = match format {
                ExportFormat::Csv => (export::history_csv(&history)?, export::CSV_FILE_NAME),
                ExportFormat::Html => (export::history_html(&history)?, export::HTML_FILE_NAME),
            };
            match output {
                Some(path) => {
                    let path = export_target(path, default_name);
                    std::fs::write(&path, content)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("Exported {} rides to {}", history.len(), path.display());
                    println!("Exported {} rides to {}", history.len(), path.display());
                }
                None => println!("{content}"),
            }
        }
        HistoryCommand::Clear { yes } => {
            if yes {
                board.clear_history()?;
                println!("History cleared");
            } else {
                println!("This will delete all completed rides.");
                println!("Use --yes to confirm.");
            }
        }
    }
    Ok(())
}

/// Export into a directory using the default file name.
fn export_target(path: PathBuf, default_name: &str) -> PathBuf {
    if path.is_dir() {
        path.join(default_name)
    } else {
        path
    }
}

fn handle_watch(config: &Config, board: &Board, cmd: &WatchCommand) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(watch(config, board, cmd))
}

async fn watch(config: &Config, board: &Board, cmd: &WatchCommand) -> anyhow::Result<()> {
    let watcher = Watcher::open(board.storage().path(), config.poll_interval())?;
    let handle = watcher.handle();
    let (tx, mut rx) = mpsc::channel(32);
    let task = tokio::spawn(watcher.run(tx));

    let mut page = LivePage::new(
        board,
        cmd.view.into(),
        &config.display.currency_symbol,
        cmd.format.is_json(),
        std::io::stdout(),
    );
    page.refresh()?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => {
                    dispatch(&event, &mut page);
                }
                None => break,
            },
            _ = &mut ctrl_c => {
                debug!("Interrupted; stopping watcher");
                break;
            }
        }
    }

    handle.stop();
    drop(rx);
    task.await.context("watcher task failed")?;
    Ok(())
}

fn handle_status(board: &Board, json: bool) -> anyhow::Result<()> {
    let stats = board.storage().stats()?;
    let requests = board.rider_requests().len();
    let posts = board.driver_posts().len();
    let history = board.history().len();
    let profile = board.profile();

    if json {
        let status = serde_json::json!({
            "database_path": board.storage().path(),
            "total_keys": stats.total_keys,
            "last_revision": stats.last_revision,
            "db_size_bytes": stats.db_size_bytes,
            "rider_requests": requests,
            "driver_posts": posts,
            "history": history,
            "driver": profile.as_ref().map(|p| &p.name),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("rshare status");
        println!("-------------");
        println!("Database:       {}", board.storage().path().display());
        println!("Size:           {} bytes", stats.db_size_bytes);
        println!("Keys:           {}", stats.total_keys);
        println!("Last revision:  {}", stats.last_revision);
        println!();
        println!("Rider requests: {requests}");
        println!("Driver posts:   {posts}");
        println!("Completed:      {history}");
        match profile {
            Some(p) => println!("Driver:         {} ({})", p.name, p.id),
            None => println!("Driver:         not signed up"),
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Sync]");
                println!("  Poll interval (ms): {}", config.sync.poll_interval_ms);
                println!();
                println!("[Fare]");
                println!("  Base:               {}", config.fare.base);
                println!("  Per unit:           {}", config.fare.per_unit);
                println!();
                println!("[Display]");
                println!("  Currency symbol:    {}", config.display.currency_symbol);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
