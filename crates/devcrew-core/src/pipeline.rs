use crate::agent::{Agent, ModelBackend, ProjectContext, TaskInput};
use crate::error::{CrewError, Result};
use crate::memory::MemoryStore;
use crate::project::{MilestoneRecord, MilestoneStatus, Project};
use crate::role::Role;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Pipeline stage for one milestone run.
///
/// Transitions are strictly sequential and forward-only:
/// Received → CeoReview → CtoPlanning → Coding → Testing → Completed.
/// Failed is reachable from any in-progress stage and halts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    CeoReview,
    CtoPlanning,
    Coding,
    Testing,
    Completed,
    Failed,
}

impl Stage {
    /// The in-progress stages in execution order.
    pub const WORK: [Stage; 4] = [
        Stage::CeoReview,
        Stage::CtoPlanning,
        Stage::Coding,
        Stage::Testing,
    ];

    /// The role that acts in this stage, if any.
    pub fn role(self) -> Option<Role> {
        match self {
            Stage::CeoReview => Some(Role::Ceo),
            Stage::CtoPlanning => Some(Role::Cto),
            Stage::Coding => Some(Role::Coder),
            Stage::Testing => Some(Role::Tester),
            Stage::Received | Stage::Completed | Stage::Failed => None,
        }
    }

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Received => Some(Stage::CeoReview),
            Stage::CeoReview => Some(Stage::CtoPlanning),
            Stage::CtoPlanning => Some(Stage::Coding),
            Stage::Coding => Some(Stage::Testing),
            Stage::Testing => Some(Stage::Completed),
            Stage::Completed | Stage::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::CeoReview => "ceo_review",
            Stage::CtoPlanning => "cto_planning",
            Stage::Coding => "coding",
            Stage::Testing => "testing",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Drives one milestone through the four roles and commits the result.
///
/// Write discipline: each role's memory delta is appended durably right after
/// its output is accepted, but the project state is written exactly once, at
/// the end, as an atomic commit. A crash or failure anywhere leaves the
/// durable project state as it was before the run, so the milestone is
/// re-runnable; the blast radius is "redo this milestone", never "lose this
/// project".
pub struct Pipeline<'a> {
    backend: &'a dyn ModelBackend,
    memories: &'a MemoryStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(backend: &'a dyn ModelBackend, memories: &'a MemoryStore) -> Self {
        Self { backend, memories }
    }

    /// Run one milestone. Returns the record in terminal status:
    /// `Completed` records are appended to the project and persisted;
    /// `Failed` records are returned to the caller only and leave the
    /// durable project state untouched.
    pub fn run(
        &self,
        root: &Path,
        project: &mut Project,
        description: &str,
    ) -> Result<MilestoneRecord> {
        let index = project.next_milestone_index();
        let mut record = MilestoneRecord::begin(index, description);
        let mut task = TaskInput::new(index, description);

        tracing::info!(slug = %project.slug, milestone = index, "milestone started");

        for stage in Stage::WORK {
            let Some(role) = stage.role() else { continue };
            let memory = self.memories.load(&project.slug, role)?;
            let ctx = ProjectContext {
                name: &project.name,
                requirements: &project.requirements,
                artifacts: &project.artifacts,
            };
            let agent = Agent::new(role, self.backend);
            match agent.invoke(&ctx, &memory, &task) {
                Ok(out) => {
                    // Output accepted: the delta becomes durable before the
                    // next stage runs.
                    self.memories.append(&project.slug, role, out.memory_delta)?;
                    record.outputs.insert(role, out.text.clone());
                    task.upstream.insert(role, out.text);
                    tracing::debug!(slug = %project.slug, milestone = index, %stage, "stage done");
                }
                Err(CrewError::AgentInvocationFailed { role, cause }) => {
                    tracing::warn!(
                        slug = %project.slug,
                        milestone = index,
                        %stage,
                        %role,
                        %cause,
                        "milestone failed"
                    );
                    record.status = MilestoneStatus::Failed {
                        stage,
                        reason: cause,
                    };
                    record.finished_at = Some(Utc::now());
                    return Ok(record);
                }
                Err(e) => return Err(e),
            }
        }

        record.status = MilestoneStatus::Completed;
        record.finished_at = Some(Utc::now());

        // Single combined commit: the milestone is not durably completed
        // until this write succeeds.
        let next = project.with_milestone(record.clone());
        next.save(root)?;
        *project = next;

        tracing::info!(slug = %project.slug, milestone = index, "milestone completed");
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedBackend;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> (Project, MemoryStore) {
        let project = Project::create(dir.path(), "demo", "build a CSV analyzer").unwrap();
        (project, MemoryStore::new(dir.path()))
    }

    #[test]
    fn stage_machine_is_forward_only() {
        let mut stage = Stage::Received;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            stage = next;
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                Stage::Received,
                Stage::CeoReview,
                Stage::CtoPlanning,
                Stage::Coding,
                Stage::Testing,
                Stage::Completed,
            ]
        );
        assert!(Stage::Completed.is_terminal());
        assert!(Stage::Failed.next().is_none());
    }

    #[test]
    fn successful_run_appends_exactly_one_record() {
        let dir = TempDir::new().unwrap();
        let (mut project, memories) = setup(&dir);
        let backend = ScriptedBackend::echo();

        let record = Pipeline::new(&backend, &memories)
            .run(dir.path(), &mut project, "implement CSV upload")
            .unwrap();

        assert!(record.is_completed());
        assert_eq!(record.index, 0);
        assert_eq!(record.outputs.len(), 4);
        assert_eq!(backend.call_log(), Role::ALL.to_vec());

        // Durable state carries the record and the per-role artifacts.
        let loaded = Project::load(dir.path(), "demo").unwrap();
        assert_eq!(loaded.milestones.len(), 1);
        assert_eq!(loaded.stage, Stage::Completed);
        assert!(loaded.artifacts[&Role::Tester].starts_with("Tester response"));

        // Next milestone takes the next index.
        let record2 = Pipeline::new(&backend, &memories)
            .run(dir.path(), &mut project, "add visualizations")
            .unwrap();
        assert_eq!(record2.index, 1);
        assert_eq!(Project::load(dir.path(), "demo").unwrap().milestones.len(), 2);
    }

    #[test]
    fn failure_at_coding_halts_and_persists_nothing() {
        let dir = TempDir::new().unwrap();
        let (mut project, memories) = setup(&dir);
        let backend = ScriptedBackend::failing_at(Role::Coder);

        let record = Pipeline::new(&backend, &memories)
            .run(dir.path(), &mut project, "implement CSV upload")
            .unwrap();

        match &record.status {
            MilestoneStatus::Failed { stage, reason } => {
                assert_eq!(*stage, Stage::Coding);
                assert!(reason.contains("scripted failure"));
            }
            other => panic!("expected failed record, got {other:?}"),
        }
        // The Tester never ran.
        assert_eq!(backend.call_log(), vec![Role::Ceo, Role::Cto, Role::Coder]);

        // Upstream roles kept their memory; the failing role and everything
        // after it appended nothing.
        assert_eq!(memories.load("demo", Role::Ceo).unwrap().len(), 1);
        assert_eq!(memories.load("demo", Role::Cto).unwrap().len(), 1);
        assert!(memories.load("demo", Role::Coder).unwrap().is_empty());
        assert!(memories.load("demo", Role::Tester).unwrap().is_empty());

        // Durable project state is exactly as before the run.
        let loaded = Project::load(dir.path(), "demo").unwrap();
        assert!(loaded.milestones.is_empty());
        assert_eq!(loaded.stage, Stage::Received);
    }

    #[test]
    fn corrupt_memory_aborts_before_any_agent_runs() {
        let dir = TempDir::new().unwrap();
        let (mut project, memories) = setup(&dir);
        let path = crate::paths::memory_file(dir.path(), "demo", Role::Ceo);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "garbage").unwrap();

        let backend = ScriptedBackend::echo();
        let err = Pipeline::new(&backend, &memories)
            .run(dir.path(), &mut project, "x")
            .unwrap_err();
        assert!(matches!(err, CrewError::CorruptMemory { .. }));
        assert!(backend.call_log().is_empty());
        assert!(Project::load(dir.path(), "demo").unwrap().milestones.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn commit_failure_leaves_project_state_unchanged() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let (mut project, memories) = setup(&dir);
        let backend = ScriptedBackend::echo();

        // All four agents will run, then the combined commit must fail.
        let projects_dir = crate::paths::projects_dir(dir.path());
        std::fs::set_permissions(&projects_dir, std::fs::Permissions::from_mode(0o555)).unwrap();

        let err = Pipeline::new(&backend, &memories)
            .run(dir.path(), &mut project, "implement CSV upload")
            .unwrap_err();
        assert!(matches!(err, CrewError::PersistenceFailed { .. }));
        assert_eq!(backend.call_log().len(), 4);

        std::fs::set_permissions(&projects_dir, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Milestone count unchanged: the run is re-runnable.
        let loaded = Project::load(dir.path(), "demo").unwrap();
        assert!(loaded.milestones.is_empty());
        assert_eq!(loaded.stage, Stage::Received);
    }
}
