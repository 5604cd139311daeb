use crate::error::{CrewError, Result};
use crate::role::Role;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DEVCREW_DIR: &str = ".devcrew";
pub const PROJECTS_DIR: &str = ".devcrew/projects";
pub const MEMORIES_DIR: &str = ".devcrew/memories";
pub const LOCKS_DIR: &str = ".devcrew/locks";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn devcrew_dir(root: &Path) -> PathBuf {
    root.join(DEVCREW_DIR)
}

pub fn projects_dir(root: &Path) -> PathBuf {
    root.join(PROJECTS_DIR)
}

pub fn project_file(root: &Path, slug: &str) -> PathBuf {
    projects_dir(root).join(format!("{slug}.json"))
}

pub fn memory_dir(root: &Path, slug: &str) -> PathBuf {
    root.join(MEMORIES_DIR).join(slug)
}

pub fn memory_file(root: &Path, slug: &str, role: Role) -> PathBuf {
    memory_dir(root, slug).join(format!("{}.json", role.as_str()))
}

pub fn lock_file(root: &Path, slug: &str) -> PathBuf {
    root.join(LOCKS_DIR).join(format!("{slug}.lock"))
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(CrewError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Derive a project's stable identity from its human-entered name.
///
/// Lowercases, maps every non-alphanumeric run to a single hyphen, and trims
/// leading/trailing hyphens. The result is validated, so a name with no
/// usable characters is rejected rather than producing an empty identity.
pub fn slugify(name: &str) -> Result<String> {
    let mut slug = String::with_capacity(name.len());
    let mut last_hyphen = true; // suppress a leading hyphen
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug.truncate(64);
    while slug.ends_with('-') {
        slug.pop();
    }
    validate_slug(&slug)?;
    Ok(slug)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
