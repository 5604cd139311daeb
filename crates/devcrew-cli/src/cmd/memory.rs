use crate::output::{print_json, print_table};
use anyhow::Context;
use devcrew_claude::ClaudeBackend;
use devcrew_core::team::SoftwareTeam;
use devcrew_core::Role;
use std::path::Path;

pub fn show(root: &Path, slug: &str, role: &str, json: bool) -> anyhow::Result<()> {
    let role = Role::parse(role)
        .with_context(|| format!("unknown role '{role}' (expected ceo, cto, coder, or tester)"))?;

    let backend = ClaudeBackend::default();
    let team = SoftwareTeam::new(root, &backend);
    let entries = team
        .role_memory(slug, role)
        .with_context(|| format!("failed to load {role} memory for '{slug}'"))?;

    if json {
        print_json(&entries)?;
        return Ok(());
    }

    if entries.is_empty() {
        println!("No {role} memory for '{slug}'.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            let preview: String = e.summary.chars().take(72).collect();
            vec![
                e.milestone.map_or("-".into(), |i| i.to_string()),
                e.recorded_at.to_rfc3339(),
                preview,
            ]
        })
        .collect();
    print_table(&["MILESTONE", "RECORDED", "SUMMARY"], rows);
    Ok(())
}
