//! mega-launch - start a service and hold it to its health checks

use clap::Parser;
use mega_launch_cli::cli::Cli;
use mega_launch_cli::commands;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    if let Err(e) = cli.run().await {
        match commands::error_json(&e) {
            Ok(doc) if json => println!("{doc}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}
