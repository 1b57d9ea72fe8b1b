use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod control;
mod data;
mod group;
mod html;
mod parser;
mod server;
mod types;
mod view;

#[derive(Parser, Debug)]
#[command(name = "cronovista")]
#[command(about = "Render scheduled activities as a collapsible date-grouped timeline")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the activity dataset (JSON array or SpreadsheetML export)
    #[arg(short, long, default_value = "activities.json", global = true)]
    data: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Render the timeline to a static HTML file (no server)
    Build {
        /// Output path for the generated page
        #[arg(short, long, default_value = "index.html")]
        output: PathBuf,
    },

    /// Parse a dataset and list the records it contains
    Inspect {
        /// Path to the dataset file
        file: PathBuf,
    },
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level))
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("tower_http=warn".parse().unwrap());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_max_level(Level::TRACE)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level);

    match args.command {
        // Default to serve if no command specified
        None => {
            server::serve(8080, args.data).await?;
        }
        Some(Commands::Serve { port }) => {
            server::serve(port, args.data).await?;
        }
        Some(Commands::Build { output }) => {
            let records = data::load_activities(&args.data)?;
            let mut timeline = control::TimelineControl::init();
            timeline.update_view(records);
            html::generate_html(timeline.markup(), &output)?;
            info!(path = %output.display(), "Timeline saved");
        }
        Some(Commands::Inspect { file }) => {
            let records = data::load_activities(&file)?;
            info!(count = records.len(), file = %file.display(), "Found records");
            for record in &records {
                info!(
                    start = %record.display_start(),
                    status = ?record.status(),
                    subject = %record.display_subject(),
                    "Record"
                );
            }
        }
    }

    Ok(())
}
