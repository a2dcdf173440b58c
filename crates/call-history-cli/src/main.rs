use std::path::PathBuf;

use anyhow::{Context, Result};
use call_history_cli::cli::{
    build_query, init_tracing, render_row, CliConfig, Fixture, RenderedRow, Session,
};
use call_history_core::models::ConversationId;
use call_history_core::CallRecordId;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "call-history")]
#[command(about = "Page through a call history fixture the way a calls list does")]
struct Cli {
    /// JSON fixture with calls, callLinks and threadTitles
    #[arg(long, short = 'f')]
    fixture: Option<PathBuf>,

    /// Path to JSON config file (contains fixture, loader)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Print rows as JSON
    #[arg(long)]
    json: bool,

    /// Only show missed calls
    #[arg(long)]
    missed_only: bool,

    /// Only show calls in these threads (can be specified multiple times)
    #[arg(long = "thread", short = 't')]
    threads: Vec<i64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List rows, loading older pages first
    List {
        /// Number of pages to load
        #[arg(long, short = 'p', default_value_t = 1)]
        pages: usize,
    },

    /// Show a single row, loading as many pages as needed
    Show {
        /// Row index
        index: usize,
    },

    /// Delete a call and list the rows that remain
    Delete {
        /// Thread the call belongs to
        #[arg(long)]
        in_thread: i64,
        /// Call id within the thread
        call_id: u64,
    },
}

fn print_rows(rows: &[RenderedRow], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(rows).context("Failed to serialize rows")?
        );
    } else {
        for row in rows {
            println!("{}", render_row(row));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let fixture_path = cli
        .fixture
        .clone()
        .or(config.fixture.clone())
        .context("No fixture given; pass --fixture or set fixture in the config file")?;
    let fixture = Fixture::load(&fixture_path)?;

    let query = build_query(cli.missed_only, &cli.threads);
    let mut session = Session::new(fixture, config.loader, query)?;

    match cli.command {
        Commands::List { pages } => {
            session.load_pages(pages).await?;
            let rows = session.rows();
            print_rows(&rows, cli.json)?;
        }
        Commands::Show { index } => {
            let row = session.row(index)?;
            print_rows(std::slice::from_ref(&row), cli.json)?;
        }
        Commands::Delete { in_thread, call_id } => {
            let id = CallRecordId::new(ConversationId::Thread(in_thread), call_id);
            // Load everything so the deletion has rows to prune
            while session.load_pages(1).await? > 0 {}
            let affected = session.delete_call(id)?;
            eprintln!("{} row(s) affected", affected);
            print_rows(&session.rows(), cli.json)?;
        }
    }

    Ok(())
}
