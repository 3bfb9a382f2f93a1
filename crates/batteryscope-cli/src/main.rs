//! CLI for batteryscope: summarize captured randomness test battery runs.

mod commands;
mod manifest;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "batteryscope")]
#[command(about = "batteryscope: aggregate randomness test battery output into per-subtest results")]
#[command(version = batteryscope_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build results for every test in a run manifest and print a summary.
    /// Tests sharing a logic name are aggregated together.
    Analyze {
        /// Path to the JSON run manifest
        manifest: String,

        /// Write the full result tree as JSON
        #[arg(long)]
        output: Option<String>,

        /// JSON pass policy overriding the manifest's `policy`
        #[arg(long)]
        policy: Option<String>,
    },

    /// List warning and error lines detected in a captured standard output log
    Classify {
        /// Captured standard output
        stdout: String,

        /// Captured standard error (kept for reference, never scanned)
        #[arg(long)]
        stderr: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            manifest,
            output,
            policy,
        } => commands::analyze::run(commands::analyze::AnalyzeCommandConfig {
            manifest_path: &manifest,
            output_path: output.as_deref(),
            policy_path: policy.as_deref(),
        }),
        Commands::Classify { stdout, stderr } => {
            commands::classify::run(&stdout, stderr.as_deref())
        }
    }
}
