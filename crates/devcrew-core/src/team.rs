use crate::agent::ModelBackend;
use crate::error::{CrewError, Result};
use crate::lock::ProjectLock;
use crate::memory::{MemoryEntry, MemoryStore};
use crate::pipeline::{Pipeline, Stage};
use crate::project::{MilestoneRecord, Project};
use crate::role::Role;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Summary returned by [`SoftwareTeam::resume_project`].
///
/// Resume re-exposes persisted state and memories for the next call; it never
/// replays or auto-retries an interrupted milestone.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeReport {
    pub slug: String,
    pub name: String,
    pub stage: Stage,
    pub milestone_count: usize,
    pub memory_entries: BTreeMap<Role, usize>,
}

/// The orchestrator façade: loads or creates project state, binds the four
/// agents to their memory stores, and drives the milestone pipeline.
///
/// One explicit instance per invocation; there is no process-wide state.
pub struct SoftwareTeam<'a> {
    root: PathBuf,
    backend: &'a dyn ModelBackend,
    memories: MemoryStore,
    project: Option<Project>,
}

impl<'a> SoftwareTeam<'a> {
    pub fn new(root: impl Into<PathBuf>, backend: &'a dyn ModelBackend) -> Self {
        let root = root.into();
        let memories = MemoryStore::new(&root);
        Self {
            root,
            backend,
            memories,
            project: None,
        }
    }

    /// Create a project at stage `Received` with an empty milestone sequence
    /// and persist it. Fails with `ProjectExists` on identity collision.
    pub fn start_new_project(&mut self, name: &str, requirements: &str) -> Result<&Project> {
        let project = Project::create(&self.root, name, requirements)?;
        Ok(self.project.insert(project))
    }

    /// Load a persisted project and all four role memories, making them
    /// available for the next `process_milestone` call.
    pub fn resume_project(&mut self, slug: &str) -> Result<ResumeReport> {
        let project = Project::load(&self.root, slug)?;
        let memories = self.memories.load_all(slug)?;
        let report = ResumeReport {
            slug: project.slug.clone(),
            name: project.name.clone(),
            stage: project.stage,
            milestone_count: project.milestones.len(),
            memory_entries: memories.iter().map(|(r, m)| (*r, m.len())).collect(),
        };
        tracing::info!(slug, milestones = report.milestone_count, "project resumed");
        self.project = Some(project);
        Ok(report)
    }

    /// Drive the milestone pipeline once over the loaded project.
    ///
    /// Not reentrant per project identity: a concurrent call on the same
    /// project observes `ProjectBusy`. Returns the completed or failed
    /// milestone record; a failed record is not persisted, so retrying with
    /// equivalent input is always safe.
    pub fn process_milestone(&mut self, description: &str) -> Result<MilestoneRecord> {
        let project = self.project.as_mut().ok_or(CrewError::NoProjectLoaded)?;
        let _lock = ProjectLock::acquire(&self.root, &project.slug)?;
        Pipeline::new(self.backend, &self.memories).run(&self.root, project, description)
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    /// One role's persisted memory for the loaded or named project.
    pub fn role_memory(&self, slug: &str, role: Role) -> Result<Vec<MemoryEntry>> {
        self.memories.load(slug, role)
    }

    /// All known project identities under this root.
    pub fn list_projects(root: &Path) -> Result<Vec<String>> {
        Project::list(root)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::MilestoneStatus;
    use crate::test_support::ScriptedBackend;
    use tempfile::TempDir;

    #[test]
    fn start_then_resume_round_trip() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::echo();
        let mut team = SoftwareTeam::new(dir.path(), &backend);
        team.start_new_project("Data Analysis Web App", "upload CSVs").unwrap();

        let mut team2 = SoftwareTeam::new(dir.path(), &backend);
        let report = team2.resume_project("data-analysis-web-app").unwrap();
        assert_eq!(report.stage, Stage::Received);
        assert_eq!(report.milestone_count, 0);
        assert_eq!(report.memory_entries[&Role::Ceo], 0);
    }

    #[test]
    fn duplicate_start_fails_without_overwriting() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::echo();
        let mut team = SoftwareTeam::new(dir.path(), &backend);
        team.start_new_project("My App", "original reqs").unwrap();
        assert!(matches!(
            team.start_new_project("my app", "other reqs"),
            Err(CrewError::ProjectExists(_))
        ));
        assert_eq!(
            Project::load(dir.path(), "my-app").unwrap().requirements,
            "original reqs"
        );
    }

    #[test]
    fn resume_missing_project_is_not_found() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::echo();
        let mut team = SoftwareTeam::new(dir.path(), &backend);
        assert!(matches!(
            team.resume_project("ghost"),
            Err(CrewError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn milestone_requires_loaded_project() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::echo();
        let mut team = SoftwareTeam::new(dir.path(), &backend);
        assert!(matches!(
            team.process_milestone("x"),
            Err(CrewError::NoProjectLoaded)
        ));
    }

    #[test]
    fn milestone_advances_only_its_own_project() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::echo();

        let mut team = SoftwareTeam::new(dir.path(), &backend);
        team.start_new_project("alpha", "a").unwrap();
        let mut other = SoftwareTeam::new(dir.path(), &backend);
        other.start_new_project("beta", "b").unwrap();

        let record = team.process_milestone("ship v1").unwrap();
        assert!(record.is_completed());
        assert_eq!(record.index, 0);

        assert_eq!(Project::load(dir.path(), "alpha").unwrap().milestones.len(), 1);
        assert!(Project::load(dir.path(), "beta").unwrap().milestones.is_empty());
    }

    #[test]
    fn concurrent_call_observes_busy() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::echo();
        let mut team = SoftwareTeam::new(dir.path(), &backend);
        team.start_new_project("alpha", "a").unwrap();

        let _held = ProjectLock::acquire(dir.path(), "alpha").unwrap();
        assert!(matches!(
            team.process_milestone("ship v1"),
            Err(CrewError::ProjectBusy { .. })
        ));
        // Rejected before any agent ran or wrote.
        assert!(backend.call_log().is_empty());
        assert!(team.role_memory("alpha", Role::Ceo).unwrap().is_empty());
    }

    #[test]
    fn lock_is_released_after_a_run() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::echo();
        let mut team = SoftwareTeam::new(dir.path(), &backend);
        team.start_new_project("alpha", "a").unwrap();
        team.process_milestone("one").unwrap();
        team.process_milestone("two").unwrap();
        assert_eq!(team.project().unwrap().milestones.len(), 2);
    }

    #[test]
    fn failed_milestone_can_be_retried_after_resume() {
        let dir = TempDir::new().unwrap();

        let failing = ScriptedBackend::failing_at(Role::Tester);
        let mut team = SoftwareTeam::new(dir.path(), &failing);
        team.start_new_project("alpha", "a").unwrap();
        let record = team.process_milestone("ship v1").unwrap();
        assert!(matches!(record.status, MilestoneStatus::Failed { .. }));

        // Resume re-exposes state; the failed milestone was never persisted
        // and the upstream roles kept what they learned.
        let healthy = ScriptedBackend::echo();
        let mut team2 = SoftwareTeam::new(dir.path(), &healthy);
        let report = team2.resume_project("alpha").unwrap();
        assert_eq!(report.milestone_count, 0);
        assert_eq!(report.memory_entries[&Role::Ceo], 1);
        assert_eq!(report.memory_entries[&Role::Tester], 0);

        let retried = team2.process_milestone("ship v1").unwrap();
        assert!(retried.is_completed());
        assert_eq!(retried.index, 0);
    }

    #[test]
    fn list_projects_enumerates_identities() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::echo();
        let mut team = SoftwareTeam::new(dir.path(), &backend);
        team.start_new_project("beta", "b").unwrap();
        team.start_new_project("alpha", "a").unwrap();
        assert_eq!(
            SoftwareTeam::list_projects(dir.path()).unwrap(),
            vec!["alpha", "beta"]
        );
    }
}
