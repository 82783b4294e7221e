//! Catalog CLI - database migrations and media tools.
//!
//! # Usage
//!
//! ```bash
//! # Run catalog database migrations
//! catalog-cli migrate
//!
//! # Recompress an image the way `compressed` media mode does
//! catalog-cli compress photo.png photo.jpg --width 800 --quality 20
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `compress` - Resize and re-encode a single image as JPEG

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use catalog_api::media::CompressionSettings;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(author, version, about = "Catalog CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Resize and re-encode an image as JPEG
    Compress {
        /// Source image
        input: PathBuf,

        /// Destination JPEG
        output: PathBuf,

        /// Output width in pixels (narrower images keep their width)
        #[arg(short, long, default_value_t = CompressionSettings::default().target_width,
              value_parser = clap::value_parser!(u32).range(1..))]
        width: u32,

        /// JPEG quality (1-100)
        #[arg(short, long, default_value_t = CompressionSettings::default().quality,
              value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Compress {
            input,
            output,
            width,
            quality,
        } => {
            let settings = CompressionSettings {
                target_width: width,
                quality,
            };
            commands::compress::run(&input, &output, settings).await?;
        }
    }
    Ok(())
}
