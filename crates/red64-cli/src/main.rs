mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, hook::HookSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "red64",
    about = "Task-aware context injection and standards enforcement for coding-agent hooks",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .red64/ or .git/)
    #[arg(long, global = true, env = "RED64_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hook entry points (payload on stdin, JSON on stdout)
    Hook {
        #[command(subcommand)]
        subcommand: HookSubcommand,
    },

    /// Show the detected task type and file signals for a prompt
    Classify { prompt: String },

    /// Show which enabled standards match the given file signals
    Standards {
        /// Signals such as `.ts`, `app.ts`, or `src/components/`
        #[arg(required = true)]
        signals: Vec<String>,

        /// Plugins directory (default: <root>/plugins)
        #[arg(long)]
        plugins_dir: Option<PathBuf>,
    },

    /// Fit a JSON list of context items (stdin) into the token budget
    Budget {
        /// Override token_budget.max_tokens
        #[arg(long)]
        max_tokens: Option<u32>,
    },

    /// Render the product context (mission summary and current roadmap item)
    Product,

    /// Inspect and validate .red64/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    // Hook stdout must stay a single JSON object, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let explicit_root = cli.root.as_deref();
    let root = root::resolve_root(explicit_root, &root::current_dir());

    let result = match cli.command {
        Commands::Hook { subcommand } => match cmd::hook::run(explicit_root, subcommand) {
            Ok(code) => std::process::exit(code),
            Err(e) => Err(e),
        },
        Commands::Classify { prompt } => cmd::classify::run(&prompt, cli.json),
        Commands::Standards {
            signals,
            plugins_dir,
        } => cmd::standards::run(&root, &signals, plugins_dir, cli.json),
        Commands::Budget { max_tokens } => cmd::budget::run(&root, max_tokens, cli.json),
        Commands::Product => cmd::product::run(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
