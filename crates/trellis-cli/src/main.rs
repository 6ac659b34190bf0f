//! # trellis CLI
//!
//! Command-line access to Trellis state files, presets and mask history.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use trellis_config::logging::{init_logging, LogLevel};
use trellis_config::path::normalize_or_original;
use trellis_config::{log_cli_debug, Config};

mod mask;
mod state;

/// Trellis - thread-safe training state and mask history tools
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read values from a JSON state file
    Get {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Dot-separated paths, e.g. `optimizer.learning_rate`
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,
    },

    /// Write values into a JSON state file
    Set {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// `PATH=VALUE` pairs; VALUE is parsed as JSON, else taken as a string
        #[arg(value_name = "PATH=VALUE", required = true)]
        assignments: Vec<String>,
    },

    /// List presets in a directory
    Presets {
        /// Presets directory (default: `presets.dir` from config)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Do not list the default preset
        #[arg(long)]
        no_default: bool,
    },

    /// Apply edits to a grayscale mask image
    Mask {
        #[arg(value_name = "IN")]
        input: PathBuf,

        #[arg(value_name = "OUT")]
        output: PathBuf,

        /// Edit ops, applied in order (e.g. `stroke:0,0,10,10,3` `commit` `undo`)
        #[arg(value_name = "OP", required = true)]
        ops: Vec<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print config file locations
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("warning: ignoring config: {}", e);
        Config::default()
    });
    init_logging(LogLevel::parse(&config.logging.level).unwrap_or(LogLevel::Warn));
    log_cli_debug!("Config loaded", presets_dir = tracing::field::debug(&config.presets.dir));

    match cli.command {
        Commands::Get { file, paths } => state::cmd_get(&file, &paths),
        Commands::Set { file, assignments } => state::cmd_set(&file, &assignments),
        Commands::Presets { dir, no_default } => {
            let dir = normalize_or_original(dir.unwrap_or_else(|| config.presets.dir.clone()));
            state::cmd_presets(&dir, config.presets.include_default && !no_default)
        }
        Commands::Mask { input, output, ops } => {
            let ops = ops
                .iter()
                .map(|op| op.parse())
                .collect::<Result<Vec<mask::MaskOp>>>()?;
            mask::cmd_mask(&input, &output, &ops, &config.mask)
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                print!("{}", config.to_toml());
                Ok(())
            }
            ConfigCommands::Path => {
                match Config::global_config_path() {
                    Some(path) => println!("Global:  {}", path.display()),
                    None => println!("Global:  (no home directory)"),
                }
                println!("Project: {}", Config::project_config_path().display());
                Ok(())
            }
        },
    }
}
