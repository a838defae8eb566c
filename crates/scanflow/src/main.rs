mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scanflow")]
#[command(about = "Remote Docker image building and vulnerability scanning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the image remotely and scan it for vulnerabilities
    Scan {
        /// Path to the build context
        #[arg(short, long, default_value = ".")]
        context: PathBuf,

        /// Path to the Dockerfile, relative to the build context
        #[arg(short, long, default_value = "Dockerfile")]
        file: PathBuf,

        /// Minimum severity shown in the printed table
        /// (CRITICAL, HIGH, MEDIUM, LOW, UNKNOWN)
        #[arg(short, long, env = "SCANFLOW_SEVERITY")]
        severity: Option<String>,
    },
    /// Lint the Dockerfile remotely
    Lint {
        /// Path to the build context
        #[arg(short, long, default_value = ".")]
        context: PathBuf,

        /// Path to the Dockerfile, relative to the build context
        #[arg(short, long, default_value = "Dockerfile")]
        file: PathBuf,
    },
    /// Create a .scanflow.env configuration file
    Init,
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    // Version and Init need no configuration
    if matches!(cli.command, Commands::Version) {
        println!("scanflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if matches!(cli.command, Commands::Init) {
        return commands::init::handle();
    }

    let config = scanflow_config::Config::load()?;

    match cli.command {
        Commands::Scan {
            context,
            file,
            severity,
        } => commands::scan::handle(&config, &context, &file, severity).await,
        Commands::Lint { context, file } => commands::lint::handle(&config, &context, &file).await,
        Commands::Init | Commands::Version => unreachable!("handled above"),
    }
}
