//! Arvak Zone Command-Line Interface
//!
//! Loads a multi-zone device description and an operation list, routes the
//! operations through the zones and prints the shuttle-annotated program.
//!
//! ```text
//! arvak-zone route --device device.yaml --ops circuit.json
//! arvak-zone paths --device device.yaml
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use arvak_zone::ResidencyPolicy;
use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{paths, route, version};

/// Arvak Zone - placement and shuttle routing for multi-zone ion traps
#[derive(Parser)]
#[command(name = "arvak-zone")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route an operation list through the zones of a device
    Route {
        /// Device description (YAML or JSON)
        #[arg(short, long)]
        device: String,

        /// Operation list (JSON or YAML)
        #[arg(long)]
        ops: String,

        /// Write the routed operation list to a file
        #[arg(short, long)]
        output: Option<String>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Residency policy (adjacent, persistent); overrides the device file
        #[arg(long, env = "ARVAK_ZONE_RESIDENCY")]
        residency: Option<ResidencyPolicy>,
    },

    /// Print the zone graph and its shortest-path table
    Paths {
        /// Device description (YAML or JSON)
        #[arg(short, long)]
        device: String,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Route {
            device,
            ops,
            output,
            format,
            residency,
        } => route::execute(&device, &ops, output.as_deref(), &format, residency),

        Commands::Paths { device } => paths::execute(&device),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
