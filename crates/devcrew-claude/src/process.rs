use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::ClaudeBackendError;
use crate::types::{QueryConfig, QueryOutcome};
use crate::Result;

/// Run one blocking `claude --print` query and parse its JSON result.
///
/// The prompt is written to stdin rather than passed as an argument, so
/// arbitrarily long milestone text never hits argv limits. Stderr is captured
/// and surfaced on a non-zero exit.
pub(crate) fn run_query(prompt: &str, config: &QueryConfig) -> Result<QueryOutcome> {
    let mut cmd = build_command(config)?;
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(stdin) = child.stdin.take() {
        let mut stdin = stdin;
        stdin.write_all(prompt.as_bytes())?;
        // Dropping stdin closes it, signalling end of input.
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let msg = match output.status.code() {
            Some(code) if stderr.trim().is_empty() => {
                format!("claude exited with code {code}")
            }
            Some(code) => format!("claude exited with code {code}\nstderr: {}", stderr.trim()),
            None => "claude terminated by signal".to_string(),
        };
        return Err(ClaudeBackendError::Process(msg));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    serde_json::from_str(trimmed).map_err(|source| ClaudeBackendError::Parse {
        output: trimmed.to_string(),
        source,
    })
}

/// Resolve the `claude` executable and assemble the argument list.
///
/// `CLAUDECODE` is removed from the environment so the driver works both from
/// a terminal and from inside a running Claude session.
pub(crate) fn build_command(config: &QueryConfig) -> Result<Command> {
    let exe: PathBuf = match &config.path_to_executable {
        Some(p) => p.clone(),
        None => which::which("claude")?,
    };

    let mut cmd = Command::new(exe);
    cmd.env_remove("CLAUDECODE");
    cmd.arg("--print").arg("--output-format").arg("json");

    if let Some(model) = &config.model {
        cmd.arg("--model").arg(model);
    }
    if let Some(max_turns) = config.max_turns {
        cmd.arg("--max-turns").arg(max_turns.to_string());
    }
    if let Some(budget) = config.max_budget_usd {
        cmd.arg("--max-budget-usd").arg(budget.to_string());
    }
    if let Some(sp) = &config.system_prompt {
        cmd.arg("--system-prompt").arg(sp);
    }
    if let Some(cwd) = &config.cwd {
        cmd.current_dir(cwd);
    }

    // The prompt is NOT a positional arg — it is sent via stdin.
    Ok(cmd)
}
