//! Binary entry point for promptmem.
//!
//! This binary provides the CLI interface for the promptmem enhancement
//! pipeline.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use promptmem::cli::{self, EnhanceArgs, OutputFormat, SearchArgs};
use promptmem::{AiConfig, EnhanceService, PatternStore};
use std::path::PathBuf;
use std::process::ExitCode;

/// Promptmem - memory-augmented prompt enhancement.
#[derive(Parser)]
#[command(name = "promptmem")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the memory pattern directory.
    #[arg(long, global = true, env = "PROMPTMEM_MEMORY_DIR")]
    memory_dir: Option<PathBuf>,

    /// Path to the model configuration file.
    #[arg(long, global = true, env = "PROMPTMEM_AI_CONFIG")]
    ai_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Rank memory patterns against a query.
    Search {
        /// The search query.
        query: String,

        /// Body text matched alongside the query.
        #[arg(long)]
        content: Option<String>,

        /// Category to include in the query context.
        #[arg(short, long)]
        category: Option<String>,

        /// Tags to include in the query context (comma-separated).
        #[arg(short, long)]
        tags: Option<String>,

        /// Minimum relevance score.
        #[arg(long, default_value_t = cli::SEARCH_MIN_RELEVANCE)]
        threshold: f32,

        /// Maximum number of results.
        #[arg(short, long, default_value_t = cli::SEARCH_LIMIT)]
        limit: usize,

        /// Output format: text or json.
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Enhance a prompt, grounded in matching memory patterns.
    Enhance {
        /// The prompt to enhance.
        prompt: String,

        /// Category of the prompt.
        #[arg(short, long)]
        category: Option<String>,

        /// Tags for the prompt (comma-separated).
        #[arg(short, long)]
        tags: Option<String>,

        /// Model index from `promptmem models`.
        #[arg(short, long)]
        model: Option<usize>,

        /// Restrict grounding to these pattern IDs (comma-separated).
        #[arg(short, long)]
        patterns: Option<String>,

        /// Skip memory retrieval entirely.
        #[arg(long)]
        no_memory: bool,
    },

    /// List the configured generation models.
    Models {
        /// Output format: text or json.
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let result = run_command(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Initializes tracing to stderr, keeping stdout clean for command output.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_directive = if verbose { "promptmem=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the selected command.
fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = cli
        .memory_dir
        .map_or_else(PatternStore::from_env, PatternStore::new);

    match cli.command {
        Commands::Search {
            query,
            content,
            category,
            tags,
            threshold,
            limit,
            format,
        } => {
            let mut args = SearchArgs::new(query)
                .with_threshold(threshold)
                .with_limit(limit)
                .with_format(OutputFormat::parse(&format));
            if let Some(content) = content {
                args = args.with_content(content);
            }
            if let Some(category) = category {
                args = args.with_category(category);
            }
            if let Some(tags) = tags {
                args = args.with_tags(tags);
            }
            cli::cmd_search(&store, &args)
        },

        Commands::Enhance {
            prompt,
            category,
            tags,
            model,
            patterns,
            no_memory,
        } => {
            let service = load_service(cli.ai_config.as_deref())?;

            let mut args = EnhanceArgs::new(prompt).with_no_memory(no_memory);
            if let Some(category) = category {
                args = args.with_category(category);
            }
            if let Some(tags) = tags {
                args = args.with_tags(tags);
            }
            if let Some(index) = model {
                args = args.with_model(index);
            }
            if let Some(ids) = patterns {
                args = args.with_patterns(ids);
            }
            cli::cmd_enhance(&store, &service, &args)
        },

        Commands::Models { format } => {
            let service = load_service(cli.ai_config.as_deref())?;
            cli::cmd_models(&service, OutputFormat::parse(&format))
        },
    }
}

/// Loads the model configuration and builds the enhancement service.
fn load_service(path: Option<&std::path::Path>) -> Result<EnhanceService, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AiConfig::load_from_file(path)?,
        None => AiConfig::load()?,
    };
    Ok(EnhanceService::new(config.custom_models))
}
