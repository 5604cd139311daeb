use crate::output::print_json;
use anyhow::Context;
use devcrew_claude::{ClaudeBackend, QueryConfig};
use devcrew_core::project::MilestoneStatus;
use devcrew_core::team::SoftwareTeam;
use std::path::{Path, PathBuf};

pub struct BackendArgs {
    pub model: Option<String>,
    pub max_turns: Option<u32>,
    pub max_budget_usd: Option<f64>,
    pub claude_path: Option<PathBuf>,
}

pub fn run(
    root: &Path,
    slug: &str,
    text: &str,
    backend_args: BackendArgs,
    json: bool,
) -> anyhow::Result<()> {
    let backend = ClaudeBackend::new(QueryConfig {
        model: backend_args.model,
        max_turns: backend_args.max_turns,
        max_budget_usd: backend_args.max_budget_usd,
        system_prompt: None,
        path_to_executable: backend_args.claude_path,
        cwd: None,
    });

    let mut team = SoftwareTeam::new(root, &backend);
    team.resume_project(slug)
        .with_context(|| format!("failed to resume project '{slug}'"))?;

    let record = team
        .process_milestone(text)
        .with_context(|| format!("failed to process milestone for '{slug}'"))?;

    if json {
        print_json(&record)?;
    } else {
        println!("Milestone {}: {}", record.index, record.description);
        for (role, output) in &record.outputs {
            println!("\n── {role} ──────────────────────────────────");
            println!("{output}");
        }
        println!();
    }

    match &record.status {
        MilestoneStatus::Completed => Ok(()),
        MilestoneStatus::Failed { stage, reason } => {
            anyhow::bail!("milestone {} failed at {stage}: {reason}", record.index)
        }
    }
}
