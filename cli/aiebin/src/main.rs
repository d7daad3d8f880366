//! aiebin: build AIE device programs into NPU boot images and xclbin containers.

mod commands;
mod config;

use std::process;

use aiebin_toolchain::ProcessEnv;
use clap::{Parser, Subcommand};

use commands::build::BuildArgs;
use config::ProjectConfig;

#[derive(Parser)]
#[command(name = "aiebin", version, about = "AIE device program to NPU binary builder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a device program into a boot image or xclbin container
    Build(BuildArgs),
    /// Report toolchain discovery results
    Doctor {
        /// Echo discovery details
        #[arg(long)]
        verbose: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Build(args) => args.verbose,
        Commands::Doctor { verbose } => *verbose,
    };
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Build(args) => {
            let project = match &args.config {
                Some(path) => Some(ProjectConfig::load(path)?),
                None => ProjectConfig::find_and_load(&cwd)?,
            };
            let config = project.map(|p| p.build).unwrap_or_default();
            commands::build::run(config, &args, &ProcessEnv)
        }
        Commands::Doctor { .. } => commands::doctor::run(&cwd, &ProcessEnv),
    }
}
