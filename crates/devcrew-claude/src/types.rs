use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ─── Query configuration ──────────────────────────────────────────────────

/// Options for one `claude --print` invocation.
#[derive(Debug, Clone, Default)]
pub struct QueryConfig {
    /// Claude model name (e.g. `"claude-sonnet-4-6"`).
    pub model: Option<String>,
    /// Maximum agentic turns before the run stops with `error_max_turns`.
    pub max_turns: Option<u32>,
    /// Maximum budget in USD before the run stops with `error_max_budget_usd`.
    pub max_budget_usd: Option<f64>,
    /// System prompt override.
    pub system_prompt: Option<String>,
    /// Custom path to the `claude` binary (default: resolved from PATH).
    pub path_to_executable: Option<PathBuf>,
    /// Working directory for the subprocess.
    pub cwd: Option<PathBuf>,
}

// ─── Query outcome ────────────────────────────────────────────────────────

/// The single JSON object `claude --print --output-format json` writes to
/// stdout. Discriminated by `subtype`; the outer `"type": "result"` field is
/// ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum QueryOutcome {
    Success(QuerySuccess),
    ErrorDuringExecution(QueryFailure),
    ErrorMaxTurns(QueryFailure),
    ErrorMaxBudgetUsd(QueryFailure),
}

impl QueryOutcome {
    pub fn is_error(&self) -> bool {
        !matches!(self, QueryOutcome::Success(_))
    }

    /// The final text. `None` for error subtypes.
    pub fn result_text(&self) -> Option<&str> {
        if let QueryOutcome::Success(s) = self {
            Some(&s.result)
        } else {
            None
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            QueryOutcome::Success(s) => &s.session_id,
            QueryOutcome::ErrorDuringExecution(f)
            | QueryOutcome::ErrorMaxTurns(f)
            | QueryOutcome::ErrorMaxBudgetUsd(f) => &f.session_id,
        }
    }

    pub fn subtype(&self) -> &'static str {
        match self {
            QueryOutcome::Success(_) => "success",
            QueryOutcome::ErrorDuringExecution(_) => "error_during_execution",
            QueryOutcome::ErrorMaxTurns(_) => "error_max_turns",
            QueryOutcome::ErrorMaxBudgetUsd(_) => "error_max_budget_usd",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuerySuccess {
    pub session_id: String,
    pub result: String,
    pub is_error: bool,
    pub num_turns: u32,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub total_cost_usd: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryFailure {
    pub session_id: String,
    pub is_error: bool,
    pub num_turns: u32,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub total_cost_usd: f64,
    #[serde(default)]
    pub errors: Vec<String>,
}

// ─── Tests ────────────────────────────────────────────────────────────────
