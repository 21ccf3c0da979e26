//! memoria-mcp: the stdio MCP server binary.
//!
//! Since the MCP surface is Non-goal-scoped away from multi-tenant
//! access control, the owner id for every tool call in a session is
//! resolved once at startup (`--owner-id` or `MEMORIA_OWNER_ID`,
//! defaulting to `"local"`) rather than per-request. The REST binary
//! resolves a caller's owner id per-request from its JWT instead.

use std::path::PathBuf;

use memoria_core::Config;
use memoria_server::protocol::stdio::StdioTransport;
use memoria_server::server::McpServer;
use memoria_server::startup;
use tracing::{error, info};

struct Args {
    data_dir: Option<PathBuf>,
    owner_id: String,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut data_dir: Option<PathBuf> = None;
    let mut owner_id = std::env::var("MEMORIA_OWNER_ID").unwrap_or_else(|_| "local".to_string());
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!("memoria-mcp v{}", env!("CARGO_PKG_VERSION"));
                println!();
                println!("MCP stdio server for the memoria persistent memory store.");
                println!();
                println!("USAGE:");
                println!("    memoria-mcp [OPTIONS]");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help              Print help information");
                println!("    -V, --version           Print version information");
                println!("    --data-dir <PATH>       Custom data directory");
                println!("    --owner-id <ID>         Fixed owner id for this session (default: local)");
                println!();
                println!("ENVIRONMENT:");
                println!("    RUST_LOG                Log level filter (e.g., debug, info, warn, error)");
                println!("    MEMORIA_OWNER_ID         Same as --owner-id");
                println!("    MEMORIA_REINDEX_INTERVAL_SECONDS   Background reindex interval (default: 300)");
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("memoria-mcp {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--data-dir" => {
                i += 1;
                match args.get(i) {
                    Some(path) => data_dir = Some(PathBuf::from(path)),
                    None => {
                        eprintln!("error: --data-dir requires a path argument");
                        std::process::exit(1);
                    }
                }
            }
            "--owner-id" => {
                i += 1;
                match args.get(i) {
                    Some(id) => owner_id = id.clone(),
                    None => {
                        eprintln!("error: --owner-id requires an id argument");
                        std::process::exit(1);
                    }
                }
            }
            arg if arg.starts_with("--data-dir=") => {
                data_dir = Some(PathBuf::from(arg.trim_start_matches("--data-dir=")));
            }
            arg if arg.starts_with("--owner-id=") => {
                owner_id = arg.trim_start_matches("--owner-id=").to_string();
            }
            arg => {
                eprintln!("error: unknown argument '{arg}'");
                eprintln!("Try 'memoria-mcp --help' for more information.");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    Args { data_dir, owner_id }
}

#[tokio::main]
async fn main() {
    let args = parse_args();
    startup::init_logging();

    info!("memoria-mcp v{} starting (owner_id={})", env!("CARGO_PKG_VERSION"), args.owner_id);

    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    if let Some(data_dir) = args.data_dir {
        config.vector_store_path = data_dir.join("vectors");
        config.data_dir = data_dir;
    }

    let engine = match startup::build_engine(config).await {
        Ok(engine) => engine,
        Err(e) => {
            error!("failed to initialize memory engine: {e}");
            std::process::exit(1);
        }
    };

    startup::spawn_reindex_worker(engine.clone());

    let server = McpServer::new(engine, args.owner_id);
    let transport = StdioTransport::new();

    info!("listening on stdio");
    if let Err(e) = transport.run(server).await {
        error!("server error: {e}");
        std::process::exit(1);
    }

    info!("memoria-mcp shutting down");
}
