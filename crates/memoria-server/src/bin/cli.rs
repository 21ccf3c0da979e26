//! memoria admin CLI: local administration alongside the two server
//! binaries (`memoria-mcp`, `memoria-rest`) — register a user, run a
//! backup, trigger a reindex pass, or print statistics.

use clap::{Parser, Subcommand};
use memoria_core::Config;
use memoria_server::{auth, startup};

#[derive(Parser)]
#[command(name = "memoria")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Admin CLI for the memoria persistent memory store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new user and print their id.
    CreateUser {
        username: String,
        password: String,
    },

    /// Show memory statistics for one owner.
    Stats {
        owner_id: String,
    },

    /// Copy the SQLite database file to a backup path.
    Backup {
        output: std::path::PathBuf,
    },

    /// Run one pass of the background reindex worker immediately and
    /// print how many embeddings it converged.
    Reindex {
        #[arg(long, default_value = "100")]
        batch_size: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    startup::init_logging();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::CreateUser { username, password } => run_create_user(config, &username, &password).await,
        Commands::Stats { owner_id } => run_stats(config, &owner_id).await,
        Commands::Backup { output } => run_backup(config, &output),
        Commands::Reindex { batch_size } => run_reindex(config, batch_size).await,
    }
}

async fn run_create_user(config: Config, username: &str, password: &str) -> anyhow::Result<()> {
    let engine = startup::build_engine(config).await?;
    let hash = auth::hash_password(password)?;
    let user = engine.storage().create_user(username, &hash)?;
    println!("created user {} ({})", user.username, user.id);
    Ok(())
}

async fn run_stats(config: Config, owner_id: &str) -> anyhow::Result<()> {
    let engine = startup::build_engine(config).await?;
    let stats = engine.get_memory_statistics(owner_id)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn run_backup(config: Config, output: &std::path::Path) -> anyhow::Result<()> {
    let db_path = config.data_dir.join("memoria.db");
    std::fs::copy(&db_path, output)?;
    println!("backed up {} to {}", db_path.display(), output.display());
    Ok(())
}

async fn run_reindex(config: Config, batch_size: usize) -> anyhow::Result<()> {
    let engine = startup::build_engine(config).await?;
    let reindexed = engine.reindex_stale_embeddings(batch_size).await?;
    println!("reindexed {reindexed} memories");
    Ok(())
}
