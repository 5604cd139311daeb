use crate::error::{CrewError, Result};
use crate::memory::MemoryEntry;
use crate::role::Role;
use serde_json::json;
use std::collections::BTreeMap;

/// How many trailing memory entries are inlined into a prompt. Older entries
/// stay on disk; the prompt only carries the recent tail.
const MEMORY_WINDOW: usize = 5;

/// Error type produced by a model backend. Backends live outside this crate,
/// so the boundary is an opaque error.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// The external model capability the core consumes. One call per agent
/// invocation; implementations may shell out, call an API, or be scripted.
pub trait ModelBackend {
    fn complete(
        &self,
        role: Role,
        system_prompt: &str,
        prompt: &str,
    ) -> std::result::Result<String, BackendError>;
}

/// Read-only view of the project handed to an agent invocation.
#[derive(Debug, Clone, Copy)]
pub struct ProjectContext<'a> {
    pub name: &'a str,
    pub requirements: &'a str,
    /// Latest artifact per role from prior milestones.
    pub artifacts: &'a BTreeMap<Role, String>,
}

/// The current milestone text plus upstream role outputs, in pipeline order.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub milestone_index: u64,
    pub description: String,
    pub upstream: BTreeMap<Role, String>,
}

impl TaskInput {
    pub fn new(milestone_index: u64, description: impl Into<String>) -> Self {
        Self {
            milestone_index,
            description: description.into(),
            upstream: BTreeMap::new(),
        }
    }
}

/// A validated agent output plus the memory delta to append for the role.
/// The delta is only applied by the caller after the output is accepted, so
/// a failed invocation never mutates memory.
#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub text: String,
    pub memory_delta: MemoryEntry,
}

/// One role's behavior bound to a model backend.
///
/// All four roles share this single invoke contract; they differ only in
/// their system prompt and their position in the pipeline.
pub struct Agent<'a> {
    role: Role,
    backend: &'a dyn ModelBackend,
}

impl<'a> Agent<'a> {
    pub fn new(role: Role, backend: &'a dyn ModelBackend) -> Self {
        Self { role, backend }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Invoke the role over its memory and the accumulated task input.
    ///
    /// Fails with `AgentInvocationFailed` if the backend errors or produces
    /// an empty output.
    pub fn invoke(
        &self,
        ctx: &ProjectContext<'_>,
        memory: &[MemoryEntry],
        task: &TaskInput,
    ) -> Result<AgentOutput> {
        let prompt = self.build_prompt(ctx, memory, task);
        tracing::debug!(role = %self.role, milestone = task.milestone_index, "invoking agent");

        let text = self
            .backend
            .complete(self.role, self.role.system_prompt(), &prompt)
            .map_err(|e| CrewError::AgentInvocationFailed {
                role: self.role,
                cause: e.to_string(),
            })?;

        if text.trim().is_empty() {
            return Err(CrewError::AgentInvocationFailed {
                role: self.role,
                cause: "backend returned an empty output".into(),
            });
        }

        let memory_delta = MemoryEntry::new(Some(task.milestone_index), text.clone());
        Ok(AgentOutput { text, memory_delta })
    }

    fn build_prompt(
        &self,
        ctx: &ProjectContext<'_>,
        memory: &[MemoryEntry],
        task: &TaskInput,
    ) -> String {
        let tail = memory.len().saturating_sub(MEMORY_WINDOW);
        let recent: Vec<&str> = memory[tail..].iter().map(|e| e.summary.as_str()).collect();

        let context = json!({
            "project": ctx.name,
            "requirements": ctx.requirements,
            "artifacts": ctx.artifacts,
            "recent_memory": recent,
            "upstream_outputs": task.upstream,
        });
        let formatted = serde_json::to_string_pretty(&context).unwrap_or_else(|_| context.to_string());

        format!(
            "Project Context:\n{formatted}\n\n\
             Current Task (milestone {index}):\n{description}\n\n\
             Please provide your response considering the project history and current context.\n\
             Include any learnings or improvements for the project.",
            index = task.milestone_index,
            description = task.description,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedBackend;

    fn ctx_fixture(artifacts: &BTreeMap<Role, String>) -> ProjectContext<'_> {
        ProjectContext {
            name: "demo",
            requirements: "build a CSV analyzer",
            artifacts,
        }
    }

    #[test]
    fn invoke_returns_output_and_delta() {
        let backend = ScriptedBackend::echo();
        let artifacts = BTreeMap::new();
        let agent = Agent::new(Role::Ceo, &backend);
        let out = agent
            .invoke(&ctx_fixture(&artifacts), &[], &TaskInput::new(2, "ship v1"))
            .unwrap();
        assert!(out.text.contains("CEO"));
        assert_eq!(out.memory_delta.milestone, Some(2));
        assert_eq!(out.memory_delta.summary, out.text);
    }

    #[test]
    fn backend_error_becomes_invocation_failure() {
        let backend = ScriptedBackend::failing_at(Role::Coder);
        let artifacts = BTreeMap::new();
        let agent = Agent::new(Role::Coder, &backend);
        let err = agent
            .invoke(&ctx_fixture(&artifacts), &[], &TaskInput::new(0, "x"))
            .unwrap_err();
        assert!(matches!(
            err,
            CrewError::AgentInvocationFailed { role: Role::Coder, .. }
        ));
    }

    #[test]
    fn empty_output_is_rejected() {
        let backend = ScriptedBackend::blank();
        let artifacts = BTreeMap::new();
        let agent = Agent::new(Role::Cto, &backend);
        assert!(matches!(
            agent.invoke(&ctx_fixture(&artifacts), &[], &TaskInput::new(0, "x")),
            Err(CrewError::AgentInvocationFailed { role: Role::Cto, .. })
        ));
    }

    #[test]
    fn prompt_carries_recent_memory_tail() {
        let backend = ScriptedBackend::echo();
        let artifacts = BTreeMap::new();
        let agent = Agent::new(Role::Tester, &backend);
        let memory: Vec<MemoryEntry> = (0..8)
            .map(|i| MemoryEntry::new(Some(i), format!("note {i}")))
            .collect();
        let prompt = agent.build_prompt(&ctx_fixture(&artifacts), &memory, &TaskInput::new(8, "t"));
        assert!(!prompt.contains("note 2"), "old entries stay out of the prompt");
        assert!(prompt.contains("note 3"));
        assert!(prompt.contains("note 7"));
    }
}
