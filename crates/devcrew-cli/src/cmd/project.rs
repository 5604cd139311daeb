use crate::output::{print_json, print_table};
use anyhow::Context;
use devcrew_claude::ClaudeBackend;
use devcrew_core::project::{MilestoneStatus, Project};
use devcrew_core::team::SoftwareTeam;
use std::path::Path;

pub fn new(
    root: &Path,
    name: &str,
    requirements: Option<&str>,
    requirements_file: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let requirements = match (requirements, requirements_file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("provide --requirements or --requirements-file"),
    };

    let backend = ClaudeBackend::default();
    let mut team = SoftwareTeam::new(root, &backend);
    let project = team
        .start_new_project(name, &requirements)
        .with_context(|| format!("failed to start project '{name}'"))?;

    if json {
        print_json(&serde_json::json!({
            "slug": project.slug,
            "name": project.name,
            "stage": project.stage,
        }))?;
    } else {
        println!("Created project '{}' (id: {}).", project.name, project.slug);
    }
    Ok(())
}

pub fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let slugs = SoftwareTeam::list_projects(root).context("failed to list projects")?;

    if json {
        print_json(&slugs)?;
        return Ok(());
    }
    if slugs.is_empty() {
        println!("No projects.");
        return Ok(());
    }

    let mut rows = Vec::new();
    for slug in &slugs {
        match Project::load(root, slug) {
            Ok(p) => rows.push(vec![
                slug.clone(),
                p.name.clone(),
                p.stage.to_string(),
                p.milestones.len().to_string(),
            ]),
            Err(e) => rows.push(vec![slug.clone(), format!("({e})"), "?".into(), "?".into()]),
        }
    }
    print_table(&["ID", "NAME", "STAGE", "MILESTONES"], rows);
    Ok(())
}

pub fn resume(root: &Path, slug: &str, json: bool) -> anyhow::Result<()> {
    let backend = ClaudeBackend::default();
    let mut team = SoftwareTeam::new(root, &backend);
    let report = team
        .resume_project(slug)
        .with_context(|| format!("failed to resume project '{slug}'"))?;

    if json {
        print_json(&report)?;
        return Ok(());
    }

    println!("Resumed '{}' (id: {}).", report.name, report.slug);
    println!("Stage:      {}", report.stage);
    println!("Milestones: {}", report.milestone_count);
    for (role, count) in &report.memory_entries {
        println!("  {role} memory: {count} entr{}", if *count == 1 { "y" } else { "ies" });
    }
    Ok(())
}

pub fn show(root: &Path, slug: &str, json: bool) -> anyhow::Result<()> {
    let project =
        Project::load(root, slug).with_context(|| format!("project '{slug}' not found"))?;

    if json {
        print_json(&project)?;
        return Ok(());
    }

    println!("Project:      {} (id: {})", project.name, project.slug);
    println!("Stage:        {}", project.stage);
    println!("Created:      {}", project.created_at);
    println!("Updated:      {}", project.updated_at);
    println!("Requirements: {}", project.requirements);
    if project.milestones.is_empty() {
        println!("Milestones:   (none)");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = project
        .milestones
        .iter()
        .map(|m| {
            let status = match &m.status {
                MilestoneStatus::Completed => "completed".to_string(),
                MilestoneStatus::Failed { stage, .. } => format!("failed at {stage}"),
            };
            vec![
                m.index.to_string(),
                m.description.clone(),
                status,
                m.started_at.to_rfc3339(),
            ]
        })
        .collect();
    println!();
    print_table(&["#", "DESCRIPTION", "STATUS", "STARTED"], rows);
    Ok(())
}
