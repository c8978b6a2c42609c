//! QLT Command-Line Interface
//!
//! The main entry point for the `qlt` tool.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use qlt_cli::commands::{
    add_energies, init_config, lottery, merge, overparam, pruning_sweep, version, weight_decay,
};
use qlt_cli::config::ExperimentConfig;
use qlt_cli::experiment::Problem;
use qlt_optimize::OptimizerKind;

/// QLT - lottery tickets and pruning in variational quantum circuits
#[derive(Parser)]
#[command(name = "qlt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to ~/.qlt/config.yaml if present)
    #[arg(short, long, global = true, env = "QLT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the lottery-ticket protocol
    Lottery {
        /// Problem to train
        #[arg(short, long, value_enum)]
        problem: Problem,

        /// Number of qubits (fixed to 2 for compiling)
        #[arg(short, long)]
        qubits: Option<usize>,

        /// Number of ansatz layers
        #[arg(short, long)]
        layers: usize,

        /// Number of trials (defaults to the configured count)
        #[arg(short, long)]
        trials: Option<usize>,

        /// Optimizer (lbfgsb, cma-es, cobyla)
        #[arg(long)]
        optimizer: Option<OptimizerKind>,

        /// Result file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Retrain a QCBM over a range of pruning percentages
    PruningSweep {
        /// Number of qubits
        #[arg(short, long)]
        qubits: usize,

        /// Number of ansatz layers
        #[arg(short, long)]
        layers: usize,

        /// Number of trials (defaults to the configured count)
        #[arg(short, long)]
        trials: Option<usize>,

        /// Result file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Train unpruned VQE circuits of growing depth
    Overparam {
        /// Problem to train (vqe-j1j2, vqe-tfim)
        #[arg(short, long, value_enum)]
        problem: Problem,

        /// Number of qubits
        #[arg(short, long)]
        qubits: usize,

        /// Layer counts, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        layers: Vec<usize>,

        /// Repetitions per layer count (defaults to the configured count)
        #[arg(short, long)]
        trials: Option<usize>,

        /// Optimizer (lbfgsb, cma-es, cobyla)
        #[arg(long)]
        optimizer: Option<OptimizerKind>,

        /// Result file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Train unpruned VQE circuits with each configured weight decay
    WeightDecay {
        /// Problem to train (vqe-j1j2, vqe-tfim)
        #[arg(short, long, value_enum)]
        problem: Problem,

        /// Number of qubits
        #[arg(short, long)]
        qubits: usize,

        /// Number of ansatz layers
        #[arg(short, long)]
        layers: usize,

        /// Repetitions per weight decay (defaults to the configured count)
        #[arg(short, long)]
        trials: Option<usize>,

        /// Optimizer (lbfgsb, cma-es, cobyla)
        #[arg(long)]
        optimizer: Option<OptimizerKind>,

        /// Result file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add plain energies to weight-decay results
    AddEnergies {
        /// Problem the results belong to
        #[arg(short, long, value_enum)]
        problem: Problem,

        /// Number of qubits
        #[arg(short, long)]
        qubits: usize,

        /// Number of ansatz layers
        #[arg(short, long)]
        layers: usize,

        /// Optimizer the results were produced with
        #[arg(long)]
        optimizer: Option<OptimizerKind>,

        /// Result file
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Merge the top-level keys of one result file into another
    Merge {
        /// File to merge from
        first: PathBuf,

        /// File to merge into; its keys win
        second: PathBuf,
    },

    /// Write the default configuration file
    InitConfig {
        /// Destination (defaults to ~/.qlt/config.yaml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show version information
    Version,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Commands that do not need a configuration
    match &cli.command {
        Commands::Merge { first, second } => return merge::execute(first, second),
        Commands::InitConfig { path, force } => return init_config::execute(path.as_deref(), *force),
        Commands::Version => {
            version::execute();
            return Ok(());
        }
        _ => {}
    }

    let config = ExperimentConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Lottery {
            problem,
            qubits,
            layers,
            trials,
            optimizer,
            output,
        } => lottery::execute(
            &config,
            &lottery::LotteryArgs {
                problem,
                qubits,
                layers,
                trials,
                optimizer,
                output,
            },
        ),

        Commands::PruningSweep {
            qubits,
            layers,
            trials,
            output,
        } => pruning_sweep::execute(
            &config,
            &pruning_sweep::SweepArgs {
                qubits,
                layers,
                trials,
                output,
            },
        ),

        Commands::Overparam {
            problem,
            qubits,
            layers,
            trials,
            optimizer,
            output,
        } => overparam::execute(
            &config,
            &overparam::OverparamArgs {
                problem,
                qubits,
                layers,
                trials,
                optimizer,
                output,
            },
        ),

        Commands::WeightDecay {
            problem,
            qubits,
            layers,
            trials,
            optimizer,
            output,
        } => weight_decay::execute(
            &config,
            &weight_decay::WeightDecayArgs {
                problem,
                qubits,
                layers,
                trials,
                optimizer,
                output,
            },
        ),

        Commands::AddEnergies {
            problem,
            qubits,
            layers,
            optimizer,
            input,
        } => add_energies::execute(
            &config,
            &add_energies::AddEnergiesArgs {
                problem,
                qubits,
                layers,
                optimizer,
                input,
            },
        ),

        Commands::Merge { .. } | Commands::InitConfig { .. } | Commands::Version => Ok(()),
    }
}

fn main() {
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
        .init();

    // Handle errors
    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
