// Site Tailor command line entry point

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use site_tailor::utils::paths::default_config_path;
use site_tailor::{DocumentStore, EngineConfig, ModificationEngine, ModificationResult};

/// Apply natural-language edits to cloned websites
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding one folder per domain
    #[arg(long, value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FileArgs {
    #[arg(long)]
    domain: String,
    #[arg(long)]
    file: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply an instruction to one file, or to every page
    Modify {
        #[arg(long)]
        domain: String,
        /// Target file; defaults to the @file token or every page
        #[arg(long)]
        file: Option<String>,
        instruction: String,
    },
    /// Run the plan/design/code/test pipeline over every page
    Pipeline {
        #[arg(long)]
        domain: String,
        instruction: String,
    },
    /// List domains in the workspace
    Domains,
    /// List HTML files of a domain
    Files {
        #[arg(long)]
        domain: String,
    },
    /// List snapshots of a file
    Versions(FileArgs),
    /// Restore a snapshot
    Restore {
        #[command(flatten)]
        target: FileArgs,
        #[arg(long)]
        version: String,
    },
    /// Show what changed since a snapshot
    Diff {
        #[command(flatten)]
        target: FileArgs,
        #[arg(long)]
        version: String,
    },
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("site_tailor=info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let path = cli.config.clone().or_else(default_config_path);
    let mut config = match path {
        Some(path) => EngineConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config = config.with_env_overrides()?;
    if let Some(workspace) = &cli.workspace {
        config.workspace_root = workspace.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Print progress events as JSON lines until the operation finishes.
fn spawn_progress_printer(engine: &ModificationEngine) -> tokio::task::JoinHandle<()> {
    let mut rx = engine.progress().subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Ok(line) = serde_json::to_string(&event) {
                        println!("{}", line);
                    }
                    if event.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[cli] dropped {} progress event(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn print_result(result: &ModificationResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);
    let config = load_config(&cli)?;
    let store = DocumentStore::new(config.workspace_root.clone(), config.versions_dir_name.clone());

    match cli.command {
        Commands::Modify {
            domain,
            file,
            instruction,
        } => {
            let engine = ModificationEngine::from_config(&config)?;
            let printer = spawn_progress_printer(&engine);
            let result = engine.modify(&domain, file.as_deref(), &instruction).await;
            let _ = printer.await;
            print_result(&result)?;
        }
        Commands::Pipeline { domain, instruction } => {
            let engine = ModificationEngine::from_config(&config)?;
            let printer = spawn_progress_printer(&engine);
            let result = engine.run_pipeline(&domain, &instruction).await;
            let _ = printer.await;
            print_result(&result)?;
        }
        Commands::Domains => {
            for domain in store.list_domains().await? {
                println!("{}", domain);
            }
        }
        Commands::Files { domain } => {
            for file in store.list_files(&domain).await? {
                println!("{}", file);
            }
        }
        Commands::Versions(target) => {
            for version in store.list_versions(&target.domain, &target.file).await? {
                println!("{}", serde_json::to_string(&version)?);
            }
        }
        Commands::Restore { target, version } => {
            let snapshot = store
                .restore_version(&target.domain, &target.file, &version)
                .await?;
            match snapshot {
                Some(previous) => println!("Restored {}; previous content saved as {}", version, previous.id),
                None => println!("Restored {}", version),
            }
        }
        Commands::Diff { target, version } => {
            print!("{}", store.diff_version(&target.domain, &target.file, &version).await?);
        }
    }

    Ok(())
}
