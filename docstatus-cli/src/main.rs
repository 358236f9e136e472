//! `docstatus`: drives the document verification SDK from a terminal.
//!
//! The session and history are kept under a data directory, so a login
//! survives between invocations just as it does in the app.

mod prompt;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use docstatus_core::{
    session::TokenStore, ClientConfig, DocStatusApp, HistoryRecord, ScanPhase, ScanSnapshot,
    StartDestination, DEFAULT_BASE_URL,
};
use eyre::{eyre, WrapErr};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::prompt::TerminalConfirm;
use crate::store::{FsBlobStore, JsonlHistoryStore};

const HISTORY_FILE: &str = "history.jsonl";

/// Developer CLI for the document verification service
#[derive(Parser)]
#[command(name = "docstatus", version, about)]
struct Cli {
    /// Base URL of the verification service
    #[arg(long, env = "DOCSTATUS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Where the session and history are kept
    #[arg(long, env = "DOCSTATUS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "DOCSTATUS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show whether a session is active
    Status,
    /// Verify a single code and record it in history
    Verify {
        code: String,
        /// Device description sent with the request
        #[arg(long)]
        device_info: Option<String>,
    },
    /// Feed decoded codes from stdin, one per line, through the scanner
    Scan,
    /// List verification history, newest first
    History {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("docstatus=info,docstatus_core=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn data_dir(cli: &Cli) -> eyre::Result<PathBuf> {
    cli.data_dir
        .clone()
        .or_else(|| dirs::data_dir().map(|dir| dir.join("docstatus")))
        .ok_or_else(|| eyre!("could not determine a data directory, pass --data-dir"))
}

fn format_snapshot(snapshot: &ScanSnapshot) -> String {
    let code = snapshot.last_scanned_code.as_deref().unwrap_or("-");
    match snapshot.phase {
        ScanPhase::Idle => "ready".to_string(),
        ScanPhase::Verifying => format!("verifying {code}..."),
        ScanPhase::Result => format!(
            "{code}: {} {}",
            snapshot
                .status
                .map_or_else(|| "?".to_string(), |s| s.to_string()),
            snapshot.details
        ),
    }
}

fn format_record(record: &HistoryRecord) -> String {
    format!(
        "{:>15}  {:<8} {}  {}",
        record.timestamp_ms, record.status, record.code, record.description
    )
}

async fn scan(app: &DocStatusApp) -> eyre::Result<()> {
    let scanner = app.scanner();
    let mut rx = scanner.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line.wrap_err("reading stdin")? {
                    Some(line) => {
                        let code = line.trim();
                        if !code.is_empty() && !scanner.on_code_scanned(code.to_string()).await {
                            tracing::info!(code, "scan ignored");
                        }
                    }
                    None => input_open = false,
                }
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                println!("{}", format_snapshot(&snapshot));
            }
        }

        // stdin is done: leave once the last verdict has been printed
        let pending = rx.has_changed().unwrap_or(false);
        if !input_open && !pending && scanner.snapshot().phase != ScanPhase::Verifying {
            break;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let dir = data_dir(&cli)?;
    let config = ClientConfig::with_base_url(cli.base_url.clone());
    let blobs = Arc::new(FsBlobStore::new(&dir));
    let assume_yes = matches!(cli.command, Command::History { yes: true });
    let app = DocStatusApp::new(
        config.clone(),
        blobs.clone(),
        Arc::new(JsonlHistoryStore::new(dir.join(HISTORY_FILE))),
        Arc::new(TerminalConfirm::new(assume_yes)),
    )?;
    let destination = app.start();

    match cli.command {
        Command::Login { username, password } => {
            let response = app.login(username, password).await?;
            println!("logged in ({} token)", response.token_type);
        }
        Command::Logout => {
            app.logout()?;
            println!("logged out");
        }
        Command::Status => {
            let expires_in = TokenStore::with_ttl(blobs, config.token_ttl).expires_in();
            match (destination, expires_in) {
                (StartDestination::Scanner, Some(left)) => {
                    println!("logged in, session expires in {}s", left.as_secs());
                }
                _ => println!("not logged in"),
            }
        }
        Command::Verify { code, device_info } => {
            if destination == StartDestination::Login {
                tracing::warn!("no active session, the service will likely reject this");
            }
            let outcome = app.verify(code, device_info).await;
            println!("{}: {}", outcome.status, outcome.description);
        }
        Command::Scan => {
            if destination == StartDestination::Login {
                tracing::warn!("no active session, the service will likely reject scans");
            }
            scan(&app).await?;
        }
        Command::History { .. } => {
            for record in app.open_history()? {
                println!("{}", format_record(&record));
            }
        }
    }

    Ok(())
}
