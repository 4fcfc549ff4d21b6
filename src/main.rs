use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use tourguide::{Orchestrator, QueryResult, TourGuideConfig, TourGuideError, render, render_narrative, telemetry, web};

const QUIT_WORDS: &[&str] = &["quit", "exit", "q"];

#[derive(Debug, Parser)]
#[command(
    name = "tourguide",
    version,
    about = "Weather, places and travel tips for a place or a travel question"
)]
struct Cli {
    /// Config file (defaults to the user config dir, then ./config.toml)
    #[arg(long, short)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Command {
    /// Answer one query and exit
    Ask {
        #[arg(required = true, value_name = "QUERY")]
        query: Vec<String>,
    },
    /// Run the HTTP API
    Serve {
        /// Overrides server.port
        #[arg(long, short)]
        port: Option<u16>,
    },
}

/// The rendered answer followed by any generated narrative
fn answer(result: &QueryResult) -> String {
    let rendered = render(result);
    match render_narrative(&result.narrative) {
        Some(narrative) => format!("{rendered}\n\n{narrative}"),
        None => rendered,
    }
}

async fn interactive(orchestrator: &Orchestrator) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let limit = orchestrator.attraction_limit();

    println!("TourGuide v{}", tourguide::VERSION);
    loop {
        print!("Enter a place name (or 'quit' to exit): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            println!("Please enter a valid place name.");
            continue;
        }
        if QUIT_WORDS.contains(&input.to_lowercase().as_str()) {
            println!("Goodbye!");
            break;
        }

        let result = orchestrator.process(input, limit).await;
        println!("\n{}\n", answer(&result));
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = TourGuideConfig::load_from_path(cli.config)?;
    let telemetry = telemetry::init(&config.logging)?;
    info!("TourGuide v{} starting", tourguide::VERSION);

    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);
    let outcome = match cli.command {
        Some(Command::Ask { query }) => {
            let result = orchestrator
                .process(&query.join(" "), orchestrator.attraction_limit())
                .await;
            println!("{}", answer(&result));
            Ok(())
        }
        Some(Command::Serve { port }) => {
            let port = port.unwrap_or(config.server.port);
            web::run(orchestrator, &config.server.host, port).await
        }
        None => interactive(&orchestrator).await,
    };

    telemetry.shutdown();
    outcome
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<TourGuideError>() {
            Some(error) => eprintln!("{}", error.user_message()),
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}
