use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use wojtek_core::ImageSlot;

mod commands;

#[derive(Parser)]
#[command(name = "wojtek")]
#[command(about = "Wojtek Germanek - mentor resetu", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat with Wojtek
    Chat {
        /// Start in storytelling mode
        #[arg(long)]
        story: bool,
    },
    /// Ask a single question and print the answer
    Ask {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        #[arg(long)]
        story: bool,
    },
    /// Say something in Wojtek's voice
    Speak {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Generate a humorous image
    Imagine {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
        /// Write the decoded image to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Compress an image and store it in a gallery slot
    Upload { slot: ImageSlot, file: PathBuf },
    /// Show what a gallery slot holds
    Show {
        slot: ImageSlot,
        /// Write the stored image to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show both gallery slots, painting missing ones
    Gallery,
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Already initialized is fine
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { story } => commands::chat::run(story).await?,
        Commands::Ask { text, story } => commands::oneshot::ask(&text.join(" "), story).await?,
        Commands::Speak { text } => commands::oneshot::speak(&text.join(" ")).await?,
        Commands::Imagine { prompt, out } => {
            commands::oneshot::imagine(&prompt.join(" "), out.as_deref()).await?
        }
        Commands::Upload { slot, file } => commands::images::upload(slot, &file).await?,
        Commands::Show { slot, out } => commands::images::show(slot, out.as_deref()).await?,
        Commands::Gallery => commands::images::gallery().await?,
    }

    Ok(())
}
