//! Trellis route inspector.
//!
//! Loads a route configuration and answers questions about it:
//! which routes exist, which route a request would hit, and what URL a
//! named route generates.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use trellis::config::load_config;
use trellis::observability::{logging, metrics};
use trellis::routing::{Method, Router};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Inspect a trellis route table", long_about = None)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, global = true, default_value = "trellis.toml")]
    config: PathBuf,

    /// Print Prometheus metrics after the command.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered routes
    Routes {
        /// Only routes for this method
        #[arg(short, long)]
        method: Option<String>,
    },
    /// Show the route a request would match
    Match { method: String, uri: String },
    /// Generate the URL of a named route
    Url { name: String, params: Vec<String> },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    logging::init_logging(&config.observability);

    let handle = if cli.metrics || config.observability.metrics_enabled {
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let router = Router::from_config(&config)?.freeze();
    tracing::info!(config = %cli.config.display(), routes = router.routes().len(), "Routes loaded");

    match cli.command {
        Commands::Routes { method } => {
            let methods = match method {
                Some(method) => vec![method.parse::<Method>()?],
                None => Method::ALL.to_vec(),
            };
            for method in methods {
                for route in router.routes().routes_for_method(method) {
                    println!(
                        "{:<8} {:<40} {:<32} {}",
                        route.method.as_str(),
                        route.uri,
                        route.action.uses,
                        route.action.name.as_deref().unwrap_or("")
                    );
                }
            }
        }
        Commands::Match { method, uri } => {
            let method: Method = method.parse()?;
            match router.route(method, &uri) {
                Some(route) => println!("{}", serde_json::to_string_pretty(&route)?),
                None => println!("404 Not Found: {} {}", method, uri),
            }
        }
        Commands::Url { name, params } => {
            println!("{}", router.url_to_route(&name, &params)?);
        }
    }

    if let Some(handle) = handle {
        print!("{}", handle.render());
    }
    Ok(())
}
