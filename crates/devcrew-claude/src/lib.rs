//! `devcrew-claude` — blocking driver for the `claude` CLI subprocess.
//!
//! Implements the model capability the devcrew core consumes: one
//! `claude --print --output-format json` invocation per agent call, with a
//! typed result object and the role's charter passed as the system prompt.
//!
//! ```text
//! QueryConfig
//!     │
//!     ▼
//! build_command   ← resolves `claude` via PATH, assembles flags
//!     │
//!     ▼
//! run_query       ← prompt via stdin, result JSON from stdout
//!     │
//!     ▼
//! QueryOutcome    ← typed success/error result
//! ```

pub mod error;
pub mod types;

pub(crate) mod process;

pub use error::ClaudeBackendError;
pub use types::{QueryConfig, QueryFailure, QueryOutcome, QuerySuccess};

use devcrew_core::agent::{BackendError, ModelBackend};
use devcrew_core::Role;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ClaudeBackendError>;

/// A [`ModelBackend`] that shells out to the Claude CLI.
///
/// The per-role system prompt supplied by the core overrides whatever is in
/// `config.system_prompt`.
#[derive(Debug, Clone, Default)]
pub struct ClaudeBackend {
    config: QueryConfig,
}

impl ClaudeBackend {
    pub fn new(config: QueryConfig) -> Self {
        Self { config }
    }

    /// Backend with the given model and everything else defaulted.
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            config: QueryConfig {
                model: Some(model.into()),
                ..Default::default()
            },
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }
}

impl ModelBackend for ClaudeBackend {
    fn complete(
        &self,
        role: Role,
        system_prompt: &str,
        prompt: &str,
    ) -> std::result::Result<String, BackendError> {
        let mut config = self.config.clone();
        config.system_prompt = Some(system_prompt.to_string());

        tracing::debug!(%role, model = ?config.model, "querying claude");
        let outcome = process::run_query(prompt, &config)?;

        match outcome.result_text() {
            Some(text) => Ok(text.to_string()),
            None => Err(format!(
                "claude run ended with {} (session {})",
                outcome.subtype(),
                outcome.session_id()
            )
            .into()),
        }
    }
}
