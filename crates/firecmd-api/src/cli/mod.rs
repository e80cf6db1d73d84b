//! CLI command definitions for the `firecmd` binary.

pub mod ask;
pub mod load;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Fire-command assistant: gateway, agent runtime and offline tooling.
#[derive(Parser)]
#[command(name = "firecmd", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config.toml (defaults to FIRECMD_CONFIG, then the user config dir).
    #[arg(long, global = true, env = "FIRECMD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP gateway (`POST /analyze`) in front of the agent runtime.
    Serve {
        /// Listen address, overriding `gateway.bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run the agent runtime server (`POST /invocations`, `GET /ping`).
    Runtime {
        /// Listen address, overriding `runtime.bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Ask the agent one question in-process and print the answer.
    Ask {
        /// The incident description or question.
        prompt: String,

        #[arg(long, default_value = "default-user1")]
        actor: String,

        #[arg(long, default_value = "default-session1")]
        session: String,
    },

    /// Embed reference rows from a CSV or JSON Lines file into the vector index.
    Load {
        #[arg(value_enum)]
        dataset: Dataset,

        /// Input file: `.csv` (UTF-8 or EUC-KR, Korean headers), otherwise JSON Lines.
        #[arg(long, short)]
        input: PathBuf,

        /// Vector bucket, overriding the configured one.
        #[arg(long)]
        bucket: Option<String>,

        /// Index name, overriding the configured one.
        #[arg(long)]
        index: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dataset {
    /// Fire stations and safety centers.
    Stations,
    /// Traffic CCTV cameras.
    Cctv,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_arguments() {
        let cli = Cli::try_parse_from(["firecmd", "load", "stations", "--input", "rows.jsonl", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Load { dataset, input, bucket, .. } => {
                assert_eq!(dataset, Dataset::Stations);
                assert_eq!(input, PathBuf::from("rows.jsonl"));
                assert!(bucket.is_none());
            }
            _ => panic!("expected load"),
        }
    }

    #[test]
    fn test_ask_defaults() {
        let cli = Cli::try_parse_from(["firecmd", "ask", "서초구 화재"]).unwrap();
        match cli.command {
            Commands::Ask { prompt, actor, session } => {
                assert_eq!(prompt, "서초구 화재");
                assert_eq!(actor, "default-user1");
                assert_eq!(session, "default-session1");
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }
}
