use crate::error::{CrewError, Result};
use crate::paths;
use crate::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// MemoryEntry
// ---------------------------------------------------------------------------

/// One durable entry in a role's long-term memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub recorded_at: DateTime<Utc>,
    /// Index of the milestone that produced this entry, if any.
    #[serde(default)]
    pub milestone: Option<u64>,
    pub summary: String,
}

impl MemoryEntry {
    pub fn new(milestone: Option<u64>, summary: impl Into<String>) -> Self {
        Self {
            recorded_at: Utc::now(),
            milestone,
            summary: summary.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Durable, append-only store of per-(project, role) memory.
///
/// One JSON file per (project, role) under `.devcrew/memories/<slug>/`.
/// Roles never read each other's files; cross-role information flows only
/// through project artifacts.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    root: PathBuf,
}

impl MemoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load a role's full memory. A missing file is an empty memory, not an
    /// error; an unparseable file is surfaced as `CorruptMemory` so the
    /// caller decides whether to abort or start fresh.
    pub fn load(&self, slug: &str, role: Role) -> Result<Vec<MemoryEntry>> {
        paths::validate_slug(slug)?;
        let path = paths::memory_file(&self.root, slug, role);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(|source| CrewError::CorruptMemory { path, source })
    }

    /// Append one entry, atomically rewriting the role's file. A crash loses
    /// at most the in-flight entry, never prior ones.
    pub fn append(&self, slug: &str, role: Role, entry: MemoryEntry) -> Result<()> {
        let mut entries = self.load(slug, role)?;
        entries.push(entry);
        let path = paths::memory_file(&self.root, slug, role);
        let data = serde_json::to_vec_pretty(&entries)?;
        crate::io::atomic_write(&path, &data).map_err(|source| CrewError::PersistenceFailed {
            what: format!("{role} memory for '{slug}'"),
            source,
        })?;
        tracing::debug!(%role, slug, entries = entries.len(), "memory appended");
        Ok(())
    }

    /// Load every role's memory for a project.
    pub fn load_all(&self, slug: &str) -> Result<BTreeMap<Role, Vec<MemoryEntry>>> {
        let mut all = BTreeMap::new();
        for role in Role::ALL {
            all.insert(role, self.load(slug, role)?);
        }
        Ok(all)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
