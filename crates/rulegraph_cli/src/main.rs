//! Rulegraph CLI: generates build files for a multi-module project.
//!
//! `rulegraph generate` reads the project manifest, caches external
//! artifacts by content and writes one build file per module plus the shared
//! prebuilt and processor files. `rulegraph clean` removes everything a
//! previous run generated.

#![warn(missing_docs)]

mod clean;
mod generate;
mod pipeline;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "RULEGRAPH_LOG";

/// Rulegraph: a build-graph generator with a content-addressed dependency cache.
#[derive(Parser, Debug)]
#[command(name = "rulegraph", version, about = "Rulegraph build-file generator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root. Defaults to the nearest directory holding `rulegraph.toml`
    /// or `rulegraph.json`.
    #[arg(long, global = true)]
    pub project_root: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate build files from the project manifest.
    Generate(GenerateArgs),
    /// Remove generated build files, the dependency cache and the store.
    Clean,
}

/// Arguments for the `rulegraph generate` subcommand.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Project manifest (default: `rulegraph.json` in the project root).
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Worker threads (0 = one per core). Overrides `generate.jobs`.
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Explicit project root, if given.
    pub project_root: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        project_root: cli.project_root,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Generate(ref args) => generate::run(args, &global),
        Command::Clean => clean::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `RULEGRAPH_LOG` wins over the flags.
fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(global)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn default_log_level(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_generate_default() {
        let cli = Cli::parse_from(["rulegraph", "generate"]);
        match cli.command {
            Command::Generate(ref args) => {
                assert!(args.manifest.is_none());
                assert!(args.jobs.is_none());
            }
            _ => panic!("expected Generate command"),
        }
        assert!(cli.project_root.is_none());
    }

    #[test]
    fn parse_generate_with_args() {
        let cli = Cli::parse_from([
            "rulegraph",
            "generate",
            "--manifest",
            "build/project.json",
            "-j",
            "4",
        ]);
        match cli.command {
            Command::Generate(ref args) => {
                assert_eq!(args.manifest, Some(PathBuf::from("build/project.json")));
                assert_eq!(args.jobs, Some(4));
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn parse_clean() {
        let cli = Cli::parse_from(["rulegraph", "clean"]);
        assert!(matches!(cli.command, Command::Clean));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["rulegraph", "--quiet", "--project-root", "/tmp/p", "clean"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.project_root, Some(PathBuf::from("/tmp/p")));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["rulegraph", "generate", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn log_levels() {
        let mut global = GlobalArgs {
            quiet: false,
            verbose: false,
            project_root: None,
        };
        assert_eq!(default_log_level(&global), "warn");
        global.verbose = true;
        assert_eq!(default_log_level(&global), "debug");
        global.quiet = true;
        assert_eq!(default_log_level(&global), "error");
    }

    #[test]
    fn invalid_jobs_rejected() {
        assert!(Cli::try_parse_from(["rulegraph", "generate", "-j", "many"]).is_err());
    }
}
