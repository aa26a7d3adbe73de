use anyhow::{Context, Result};
use beady::integrations::beads::{BdClient, IssueSource};
use beady::{config, tui};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Parser, Debug)]
#[command(name = "bdy")]
#[command(about = "Terminal browser for beads issue trackers")]
#[command(version)]
struct Args {
    /// Project directory containing .beads (defaults to the current directory)
    dir: Option<PathBuf>,

    /// Path to config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify that bd is installed and the directory is initialized
    Check,
}

/// Log to `<cache>/bdy.log`; stderr belongs to the alternate screen.
fn init_logging() -> Result<()> {
    let Some(file) = config::cache_dir()
        .ok()
        .and_then(|dir| std::fs::create_dir_all(&dir).ok().map(|_| dir))
        .and_then(|dir| std::fs::File::create(dir.join("bdy.log")).ok())
    else {
        return Ok(());
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("beady=info".parse()?),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn resolve_dir(dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().context("Could not determine current directory")?,
    };
    dir.canonicalize()
        .with_context(|| format!("Directory not found: {}", dir.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging()?;

    let config = config::load(args.config.as_deref())?;
    let work_dir = resolve_dir(args.dir.as_deref())?;

    let client = BdClient::new(config.bd.binary.clone(), &work_dir);
    client.check_available().await?;

    if let Some(Command::Check) = args.command {
        println!("ok: beads available in {}", work_dir.display());
        return Ok(());
    }

    tracing::info!("starting in {}", work_dir.display());
    tui::run(&work_dir, config).await
}
