//! adaptest CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "adaptest", version, about = "IRT adaptive testing engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Monte Carlo simulation of adaptive sessions
    Simulate {
        /// Item bank JSON; omitted runs against a synthetic bank
        #[arg(long)]
        bank: Option<PathBuf>,

        /// IRT parameter JSON; required when --bank is given
        #[arg(long)]
        params: Option<PathBuf>,

        /// Blueprint TOML to constrain every session
        #[arg(long)]
        blueprint: Option<PathBuf>,

        /// Use the built-in reference blueprint at this length
        #[arg(long, conflicts_with = "blueprint")]
        blueprint_length: Option<usize>,

        /// Number of simulated sessions
        #[arg(long, default_value = "100")]
        sessions: usize,

        /// Max concurrent sessions
        #[arg(long, default_value = "8")]
        parallelism: usize,

        /// Master RNG seed
        #[arg(long, default_value = "7")]
        seed: u64,

        /// Hard cap on items per session
        #[arg(long)]
        max_items: Option<usize>,

        /// Stop a session once its standard error drops below this
        #[arg(long, default_value = "0.25")]
        se_threshold: f64,

        /// Write the full JSON report here
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the integer quota targets a blueprint allocates
    Targets {
        /// Blueprint TOML; omitted uses the built-in reference blueprint
        #[arg(long)]
        blueprint: Option<PathBuf>,

        /// Test length for the built-in blueprint
        #[arg(long, default_value = "52")]
        length: usize,
    },

    /// Generate a synthetic item bank and parameter table
    GenerateBank {
        /// Directory to write items.json and params.json into
        #[arg(long, default_value = ".")]
        output: PathBuf,

        /// Items generated per skill
        #[arg(long, default_value = "20")]
        items_per_skill: usize,

        /// RNG seed
        #[arg(long, default_value = "7")]
        seed: u64,
    },

    /// Check an item bank against its parameter table
    Validate {
        /// Item bank JSON
        #[arg(long)]
        bank: PathBuf,

        /// IRT parameter JSON
        #[arg(long)]
        params: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adaptest=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            bank,
            params,
            blueprint,
            blueprint_length,
            sessions,
            parallelism,
            seed,
            max_items,
            se_threshold,
            output,
        } => {
            commands::simulate::execute(
                bank,
                params,
                blueprint,
                blueprint_length,
                sessions,
                parallelism,
                seed,
                max_items,
                se_threshold,
                output,
            )
            .await
        }
        Commands::Targets { blueprint, length } => commands::targets::execute(blueprint, length),
        Commands::GenerateBank {
            output,
            items_per_skill,
            seed,
        } => commands::generate_bank::execute(output, items_per_skill, seed),
        Commands::Validate { bank, params } => commands::validate::execute(bank, params),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
