//! CLI interface for market-pulse
//!
//! Provides subcommands for:
//! - `run`: Poll live feeds and log scores
//! - `onchain`: Print a synthesized on-chain report
//! - `config`: Show the effective configuration

mod onchain;
mod run;

pub use onchain::OnChainArgs;
pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "market-pulse")]
#[command(about = "Market sentiment synthesis and live-feed polling for a trading dashboard")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll live feeds and log scores until Ctrl-C
    Run(RunArgs),
    /// Print a synthesized on-chain report as JSON
    Onchain(OnChainArgs),
    /// Show the effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::Timeframe;

    #[test]
    fn test_parse_onchain() {
        let cli = Cli::try_parse_from([
            "market-pulse",
            "onchain",
            "--symbol",
            "eth",
            "--timeframe",
            "1y",
        ])
        .unwrap();
        match cli.command {
            Commands::Onchain(args) => {
                assert_eq!(args.symbol, "eth");
                assert_eq!(args.timeframe, Timeframe::Year);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.config, "config.toml");
    }

    #[test]
    fn test_parse_run_background() {
        let cli =
            Cli::try_parse_from(["market-pulse", "-c", "custom.toml", "run", "--background"])
                .unwrap();
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Run(RunArgs { background: true, .. })));
    }

    #[test]
    fn test_rejects_unknown_timeframe() {
        let result = Cli::try_parse_from(["market-pulse", "onchain", "--timeframe", "2W"]);
        assert!(result.is_err());
    }
}
