mod commands;
mod runtime;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;

use podium_deck_client::{ClientConfig, DeckId};

#[derive(Parser)]
#[command(name = "podium", about = "Follow, present and react to live decks")]
struct Cli {
    #[arg(long, env = "PODIUM_BASE_URL", default_value = "http://localhost:3001")]
    base_url: String,

    #[arg(long, env = "PODIUM_DECK_ID")]
    deck: DeckId,

    #[arg(long, env = "PODIUM_CONTROL_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror the presenter's slide and live reactions
    Follow {
        #[arg(long, default_value_t = 1000)]
        slides: u32,
    },
    /// Drive the deck from stdin: n, p, a slide number or `r <emoji>`
    Present {
        #[arg(long, default_value_t = 0)]
        start: u32,
        #[arg(long, default_value_t = 1000)]
        slides: u32,
    },
    /// Send one reaction per emoji, waiting out the rate limit
    React {
        #[arg(required = true)]
        emoji: Vec<String>,
    },
    /// Advance automatically once the narration has been covered
    Autopilot {
        #[arg(long)]
        narration: PathBuf,
        #[arg(long, default_value_t = 0)]
        start: u32,
        #[arg(long, default_value_t = 1000)]
        slides: u32,
        #[arg(long, default_value_t = 0.55)]
        threshold: f64,
        #[arg(long, default_value_t = 1500)]
        grace_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,podium_deck_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::new(cli.base_url, cli.deck);
    if let Some(token) = cli.token {
        config = config.with_control_token(token);
    }

    match cli.command {
        Commands::Follow { slides } => {
            commands::follow::run(commands::follow::Args {
                config,
                total_slides: slides,
            })
            .await
        }
        Commands::Present { start, slides } => {
            commands::present::run(commands::present::Args {
                config,
                start,
                total_slides: slides,
            })
            .await
        }
        Commands::React { emoji } => {
            commands::react::run(commands::react::Args { config, emoji }).await
        }
        Commands::Autopilot {
            narration,
            start,
            slides,
            threshold,
            grace_ms,
        } => {
            commands::autopilot::run(commands::autopilot::Args {
                config,
                narration,
                start,
                total_slides: slides,
                threshold,
                grace: std::time::Duration::from_millis(grace_ms),
            })
            .await
        }
    }
}
