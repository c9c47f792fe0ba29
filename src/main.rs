use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use recordsync::{Commands, Container, ContainerConfig, Router, Settings};

#[derive(Parser)]
#[command(name = "recordsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use deterministic mock embeddings instead of a real model
    #[arg(long, global = true)]
    mock_embeddings: bool,

    /// Keep vectors in process memory instead of Qdrant
    #[arg(long, global = true)]
    memory_storage: bool,

    /// Overrides QDRANT_URL
    #[arg(long, global = true)]
    qdrant_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let container = Container::new(ContainerConfig {
        settings: Settings::from_env(),
        mock_embeddings: cli.mock_embeddings,
        memory_storage: cli.memory_storage,
        qdrant_url: cli.qdrant_url,
    })?;

    let router = Router::new(&container);
    let output = router.route(cli.command).await?;
    println!("{}", output);

    Ok(())
}
