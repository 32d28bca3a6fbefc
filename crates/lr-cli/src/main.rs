//! # lr
//!
//! Command-line front end for lite-runner model blobs.
//!
//! ## Usage
//! ```bash
//! # Print the slot table and weight table of a blob
//! lr inspect --model ./model.lrtm
//!
//! # Feed constant inputs through an identity primitive
//! lr echo --model ./model.lrtm --value 5.0 --dynamic-size 1
//! ```

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lr", about = "Quantization-aware tensor inference runner", version)]
struct Cli {
    /// Enable verbose logging (repeat for more: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a blob's declared input and output slots and its weights.
    Inspect {
        /// Path to the model blob.
        #[arg(short, long)]
        model: PathBuf,
    },

    /// Run constant-valued inputs through an identity primitive.
    Echo {
        /// Path to the model blob.
        #[arg(short, long)]
        model: PathBuf,

        /// Real value every input element is set to.
        #[arg(long, default_value_t = 1.0)]
        value: f32,

        /// Size substituted for every dynamic dimension.
        #[arg(long, default_value_t = 1)]
        dynamic_size: usize,

        /// Path to a runner TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { model } => commands::inspect::execute(model),
        Commands::Echo {
            model,
            value,
            dynamic_size,
            config,
        } => commands::echo::execute(model, value, dynamic_size, config),
    }
}
