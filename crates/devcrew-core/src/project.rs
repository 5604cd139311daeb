use crate::error::{CrewError, Result};
use crate::paths;
use crate::pipeline::Stage;
use crate::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// MilestoneRecord
// ---------------------------------------------------------------------------

/// Terminal outcome of one milestone run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MilestoneStatus {
    Completed,
    Failed { stage: Stage, reason: String },
}

/// One unit of requested work, driven through all four roles.
///
/// Immutable once appended to a project; its index is the position in the
/// project's milestone sequence and is never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneRecord {
    pub index: u64,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Per-role output captured during this run, in pipeline order.
    pub outputs: BTreeMap<Role, String>,
    pub status: MilestoneStatus,
}

impl MilestoneRecord {
    pub fn begin(index: u64, description: impl Into<String>) -> Self {
        Self {
            index,
            description: description.into(),
            started_at: Utc::now(),
            finished_at: None,
            outputs: BTreeMap::new(),
            status: MilestoneStatus::Failed {
                stage: Stage::Received,
                reason: "not yet run".into(),
            },
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MilestoneStatus::Completed
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// Durable record of a project: requirements, pipeline stage, milestone
/// history, and the latest artifact each role produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub slug: String,
    pub name: String,
    pub requirements: String,
    pub stage: Stage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub milestones: Vec<MilestoneRecord>,
    /// Latest artifact per role (goal statement, plan, code, test report).
    /// This is the only channel through which roles see each other's work.
    #[serde(default)]
    pub artifacts: BTreeMap<Role, String>,
}

impl Project {
    pub fn new(slug: impl Into<String>, name: impl Into<String>, requirements: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            slug: slug.into(),
            name: name.into(),
            requirements: requirements.into(),
            stage: Stage::Received,
            created_at: now,
            updated_at: now,
            milestones: Vec::new(),
            artifacts: BTreeMap::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Create and persist a new project. The identity is derived from `name`;
    /// a collision with an already persisted project fails with
    /// `ProjectExists` and overwrites nothing.
    pub fn create(root: &Path, name: &str, requirements: &str) -> Result<Self> {
        let slug = paths::slugify(name)?;
        let path = paths::project_file(root, &slug);
        if path.exists() {
            return Err(CrewError::ProjectExists(slug));
        }
        let project = Self::new(slug, name, requirements);
        project.save(root)?;
        tracing::info!(slug = %project.slug, "project created");
        Ok(project)
    }

    pub fn load(root: &Path, slug: &str) -> Result<Self> {
        paths::validate_slug(slug)?;
        let path = paths::project_file(root, slug);
        if !path.exists() {
            return Err(CrewError::ProjectNotFound(slug.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(|source| CrewError::CorruptState { path, source })
    }

    /// Durable, all-or-nothing write. Saving the same value twice leaves
    /// identical persisted bytes.
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::project_file(root, &self.slug);
        let data = serde_json::to_vec_pretty(self)?;
        crate::io::atomic_write(&path, &data).map_err(|source| CrewError::PersistenceFailed {
            what: format!("project state for '{}'", self.slug),
            source,
        })
    }

    /// List all persisted project identities, sorted.
    pub fn list(root: &Path) -> Result<Vec<String>> {
        let dir = paths::projects_dir(root);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut slugs = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    slugs.push(stem.to_string());
                }
            }
        }
        slugs.sort();
        Ok(slugs)
    }

    // -----------------------------------------------------------------------
    // Transformations
    // -----------------------------------------------------------------------

    /// Pure transformation: the next project version with `record` appended.
    /// The record's outputs become the new per-role artifacts. `self` is
    /// untouched, so a failed save leaves the caller's value consistent.
    pub fn with_milestone(&self, record: MilestoneRecord) -> Self {
        let mut next = self.clone();
        for (role, output) in &record.outputs {
            next.artifacts.insert(*role, output.clone());
        }
        next.stage = match record.status {
            MilestoneStatus::Completed => Stage::Completed,
            MilestoneStatus::Failed { .. } => Stage::Failed,
        };
        next.milestones.push(record);
        next.updated_at = Utc::now();
        next
    }

    /// Index the next milestone will take.
    pub fn next_milestone_index(&self) -> u64 {
        self.milestones.len() as u64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
