use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "msync")]
#[command(about = "MCP registry to on-chain agent ledger synchronizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize snapshots, reconcile against ledger + remote, submit the plan
    Sync {
        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Which registry snapshots to read: all | official | smithery
        #[arg(long, default_value = "all")]
        source: String,

        /// Submit at most this many plan items
        #[arg(long)]
        limit: Option<usize>,

        /// Only plan records that have an endpoint
        #[arg(long, default_value_t = false)]
        require_endpoint: bool,

        /// Only plan records that expose at least one tool
        #[arg(long, default_value_t = false)]
        require_tools: bool,

        /// Preview only: no submissions, no ledger writes, no credentials needed
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Local ledger utilities
    Ledger {
        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        #[command(subcommand)]
        cmd: LedgerCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum LedgerCmd {
    /// Entry count and most recent write time
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Optional; a missing file is fine.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Sync {
            config_paths,
            source,
            limit,
            require_endpoint,
            require_tools,
            dry_run,
        } => {
            let args = commands::sync::SyncArgs {
                config_paths,
                source,
                limit,
                require_endpoint,
                require_tools,
                dry_run,
            };
            commands::sync::run(args).await?;
        }

        Commands::Ledger { config_paths, cmd } => match cmd {
            LedgerCmd::Status => commands::ledger::status(&config_paths)?,
        },

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = msync_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries only `key=value` results.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
