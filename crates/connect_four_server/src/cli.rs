//! Command-line interface for connect_four.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Connect Four - play or simulate games against the engine
#[derive(Parser, Debug)]
#[command(name = "connect_four")]
#[command(about = "Connect-four game engine and service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Random seed (overrides config and environment)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play an AI-only game and print it turn by turn
    Simulate {
        /// Number of AI players
        #[arg(short, long, default_value = "2")]
        players: usize,

        /// Print the final game snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play against AI opponents, entering columns on stdin
    Play {
        /// Your display name
        #[arg(short, long, default_value = "You")]
        name: String,

        /// Number of AI opponents
        #[arg(short, long, default_value = "1")]
        opponents: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_defaults() {
        let cli = Cli::parse_from(["connect_four", "simulate"]);
        assert!(matches!(cli.command, Command::Simulate { players: 2, json: false }));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_seed_after_subcommand() {
        let cli = Cli::parse_from(["connect_four", "play", "--name", "Ann", "--seed", "9"]);
        assert_eq!(cli.seed, Some(9));
        let Command::Play { name, opponents } = cli.command else {
            panic!("expected play");
        };
        assert_eq!(name, "Ann");
        assert_eq!(opponents, 1);
    }
}
