use crate::role::Role;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrewError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("project already exists: {0}")]
    ProjectExists(String),

    #[error(
        "project busy: {slug} (another milestone is being processed{})",
        match .holder {
            Some(pid) => format!(", lock held by pid {pid}"),
            None => String::new(),
        }
    )]
    ProjectBusy { slug: String, holder: Option<u32> },

    #[error("no project loaded: start or resume a project first")]
    NoProjectLoaded,

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("corrupt project state at {path}: {source}")]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("corrupt memory at {path}: {source}")]
    CorruptMemory {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{role} agent invocation failed: {cause}")]
    AgentInvocationFailed { role: Role, cause: String },

    #[error("failed to persist {what}: {source}")]
    PersistenceFailed {
        what: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CrewError>;
