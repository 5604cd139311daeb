mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "devcrew",
    about = "Persistent four-role software team — drive projects through milestones with durable state and per-role memory",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from .devcrew/ or .git/)
    #[arg(long, global = true, env = "DEVCREW_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new project from a name and free-text requirements
    New {
        /// Human-readable project name; the identity slug is derived from it
        name: String,
        /// Requirements text
        #[arg(long, conflicts_with = "requirements_file")]
        requirements: Option<String>,
        /// Read requirements from a file instead
        #[arg(long, value_name = "PATH")]
        requirements_file: Option<PathBuf>,
    },

    /// List known project identities
    List,

    /// Resume a project: re-expose its state and all four role memories
    Resume { slug: String },

    /// Process one milestone through the team (CEO → CTO → Coder → Tester)
    Run {
        /// Project identity
        slug: String,
        /// Milestone description
        text: String,
        /// Claude model name
        #[arg(long)]
        model: Option<String>,
        /// Maximum agentic turns per role
        #[arg(long)]
        max_turns: Option<u32>,
        /// Maximum budget in USD per role invocation
        #[arg(long)]
        max_budget_usd: Option<f64>,
        /// Custom path to the claude binary
        #[arg(long, value_name = "PATH")]
        claude_path: Option<PathBuf>,
    },

    /// Show a project's persisted state
    Show { slug: String },

    /// Show one role's persisted memory for a project
    Memory {
        slug: String,
        /// One of: ceo, cto, coder, tester
        role: String,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::New {
            name,
            requirements,
            requirements_file,
        } => cmd::project::new(
            &root,
            &name,
            requirements.as_deref(),
            requirements_file.as_deref(),
            cli.json,
        ),
        Commands::List => cmd::project::list(&root, cli.json),
        Commands::Resume { slug } => cmd::project::resume(&root, &slug, cli.json),
        Commands::Run {
            slug,
            text,
            model,
            max_turns,
            max_budget_usd,
            claude_path,
        } => cmd::milestone::run(
            &root,
            &slug,
            &text,
            cmd::milestone::BackendArgs {
                model,
                max_turns,
                max_budget_usd,
                claude_path,
            },
            cli.json,
        ),
        Commands::Show { slug } => cmd::project::show(&root, &slug, cli.json),
        Commands::Memory { slug, role } => cmd::memory::show(&root, &slug, &role, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
