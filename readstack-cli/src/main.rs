use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

mod commands;
mod config;
mod error;
mod sources;

use commands::render::RenderArgs;
use config::Config;
use error::CliError;

#[derive(Parser)]
#[command(name = "readstack")]
#[command(about = "readstack - alignment pileup stacking and rendering")]
#[command(version)]
#[command(long_about = "
readstack stacks aligned reads into non-overlapping rows and renders the
pileup of one or more genomic regions to PNG.

Examples:
  readstack render --alignments reads.sam --region chr1:10000-12000 --out pileup.png
  readstack render --alignments reads.sam.gz --reference ref.fa --paired \\
      --region chr1:10000-10200 --region chr5:500-700 --meta pileup.json --out pileup.png
  readstack config --example > readstack.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (defaults to ./readstack.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a pileup PNG for one or more regions
    Render(RenderArgs),

    /// Show or write the configuration
    Config {
        /// Print an example configuration with every default
        #[arg(long)]
        example: bool,

        /// Write the active configuration to this file
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Render(args) => commands::render::execute(&config, args),
        Commands::Config { example, write } => commands::config::execute(&config, example, write),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level(cli.verbose, cli.quiet)))
        .format_timestamp_secs()
        .init();

    match run(cli) {
        Err(e) => match e.downcast_ref::<CliError>() {
            Some(cli_error) => error::print_error_and_exit(cli_error),
            None => Err(e),
        },
        ok => ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render_arguments() {
        let cli = Cli::try_parse_from([
            "readstack", "-v", "render", "--alignments", "r.sam", "--region", "chr1:1-100", "--region",
            "chr2:5-50", "--reverse", "1", "--paired", "--window", "0:3", "--out", "p.png",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.regions, vec!["chr1:1-100", "chr2:5-50"]);
        assert_eq!(args.reverse, vec![1]);
        assert!(args.paired);
        assert_eq!(args.window.as_deref(), Some("0:3"));
    }

    #[test]
    fn test_render_requires_region() {
        assert!(Cli::try_parse_from(["readstack", "render", "--alignments", "r.sam", "--out", "p.png"]).is_err());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0, false), "info");
        assert_eq!(log_level(2, false), "trace");
        assert_eq!(log_level(2, true), "error");
    }
}
