use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaudeBackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("claude executable not found: {0}")]
    ExecutableNotFound(#[from] which::Error),

    #[error("failed to parse claude output: {source}\n  output: {output}")]
    Parse {
        output: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("claude process error: {0}")]
    Process(String),
}
