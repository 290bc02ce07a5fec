use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

use aar::playback::{drive, TracingDispatch};
use aar::{util, Config, DirStorage, Player, SessionCodec, SessionId, SessionStore, SessionSummary};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aar")]
#[command(about = "Inspect and replay recorded world sessions", long_about = None)]
#[command(version)]
struct Cli {
    /// Data directory (defaults to ~/.aar)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored sessions and their chunk counts
    List,
    /// Decode a session and summarise its contents
    Inspect {
        /// Session ID
        id: String,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dry-run playback of a session, logging every dispatch
    Replay {
        /// Session ID
        id: String,
    },
    /// Delete one session
    Delete {
        /// Session ID
        id: String,
    },
    /// Delete every stored session
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir);

    // Initialize logging to file (~/.aar/logs/aar.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false) // Disable ANSI colors in log file
        .init();

    let config = Config::load();
    let storage = DirStorage::open(&config.storage_dir).with_context(|| {
        format!(
            "failed to open session storage at {}",
            config.storage_dir.display()
        )
    })?;
    let store = SessionStore::new(
        Arc::new(storage),
        SessionCodec::new(config.max_chunk_chars),
    );

    match cli.command {
        Commands::List => {
            let catalog = store.list()?;
            if catalog.is_empty() {
                println!("no sessions in {}", config.storage_dir.display());
            }
            for (id, chunks) in catalog {
                println!("{id}\t{chunks}");
            }
        }
        Commands::Inspect { id, json } => {
            let id = SessionId::parse(&id)?;
            let chunks = store.chunk_count(&id)?.unwrap_or(0);
            let log = store.load(&id)?;
            let summary = SessionSummary::new(id, chunks, &log);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{summary}");
            }
        }
        Commands::Replay { id } => {
            let dispatch = Arc::new(TracingDispatch::new());
            let player = Arc::new(Player::new(
                store,
                dispatch.clone(),
                Arc::new(aar::SystemClock::new()),
            ));
            player.load_named(&id)?;
            player.play()?;
            println!("{}", player.status());

            let summary = drive(player.clone(), config.tick_interval).await;
            println!(
                "replayed {} events in {} ticks: {} actors created, {} deleted, {} anomalies",
                summary.dispatched,
                summary.ticks,
                dispatch.actors_created(),
                dispatch.actors_deleted(),
                summary.anomalies
            );
        }
        Commands::Delete { id } => {
            let id = SessionId::parse(&id)?;
            let removed = store.delete(&id)?;
            println!("deleted {removed} chunks of {id}");
        }
        Commands::Purge => {
            let removed = store.purge()?;
            println!("deleted {removed} entries");
        }
    }

    Ok(())
}
