//! File-backed entity store.
//!
//! Each entity type gets one directory under the storage home:
//!
//! ```text
//! <home>/schemas/index.json    <home>/schemas/{uuid}.json
//! <home>/projects/index.json   <home>/projects/{uuid}.json
//! <home>/sheets/index.json     <home>/sheets/{uuid}.json
//! ```
//!
//! Entity files are keyed by UUID; `index.json` maps names to UUIDs and
//! holds listing summaries. Every write lands in a temp file in the
//! destination directory and is renamed into place, so readers never see
//! partial JSON. There is no locking; concurrent writers are
//! last-write-wins at file granularity.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::models::{ConfigSheet, Entity, EntitySummary, Index, Project, Schema};
use crate::{Error, Result};

/// Index file name within each entity directory.
pub const INDEX_FILE: &str = "index.json";

/// A type persisted by the catalog: entity accessors plus the directory
/// it lives in and the label used in error messages.
pub trait Record: Serialize + DeserializeOwned {
    /// Directory name under the storage home.
    const DIR: &'static str;

    /// Singular human label, e.g. `"schema"`.
    const LABEL: &'static str;

    fn entity(&self) -> &Entity;
    fn entity_mut(&mut self) -> &mut Entity;
}

impl Record for Schema {
    const DIR: &'static str = "schemas";
    const LABEL: &'static str = "schema";

    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

impl Record for Project {
    const DIR: &'static str = "projects";
    const LABEL: &'static str = "project";

    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

impl Record for ConfigSheet {
    const DIR: &'static str = "sheets";
    const LABEL: &'static str = "config sheet";

    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

/// A problem found by the integrity check.
#[derive(Debug, Clone, Serialize)]
pub struct StoreIssue {
    /// Entity type label
    pub kind: String,
    /// UUID, name, or alias the problem is about
    pub subject: String,
    /// What is wrong
    pub problem: String,
}

impl fmt::Display for StoreIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.subject, self.problem)
    }
}

/// Typed store over one entity directory.
pub struct Store<T: Record> {
    dir: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Record> Store<T> {
    /// Open the store, creating its directory if needed.
    pub fn open(home: &Path) -> Result<Self> {
        let dir = home.join(T::DIR);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            _marker: PhantomData,
        })
    }

    /// Directory holding this store's files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entity_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Load the index; a missing file reads as an empty index.
    pub fn load_index(&self) -> Result<Index> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(Index::default());
        }
        read_json(&path)
    }

    fn save_index(&self, index: &Index) -> Result<()> {
        write_json_atomic(&self.index_path(), index)
    }

    /// Materialize the index file even when empty.
    pub fn ensure_index(&self) -> Result<()> {
        if !self.index_path().exists() {
            self.save_index(&Index::default())?;
        }
        Ok(())
    }

    /// Load an entity by UUID.
    pub fn load(&self, id: &str) -> Result<T> {
        let path = self.entity_path(id);
        if !path.exists() {
            return Err(Error::NotFound(format!("{} '{}'", T::LABEL, id)));
        }
        read_json(&path)
    }

    /// Persist an entity and refresh its index entry.
    pub fn save(&self, value: &T) -> Result<()> {
        write_json_atomic(&self.entity_path(&value.entity().id), value)?;
        let mut index = self.load_index()?;
        index.upsert(value.entity());
        self.save_index(&index)
    }

    /// Resolve a name or UUID to the canonical UUID.
    pub fn resolve_id(&self, name_or_id: &str) -> Result<String> {
        self.load_index()?
            .resolve(name_or_id)
            .map(String::from)
            .ok_or_else(|| Error::NotFound(format!("{} '{}'", T::LABEL, name_or_id)))
    }

    /// Load an entity by name or UUID.
    pub fn get(&self, name_or_id: &str) -> Result<T> {
        let id = self.resolve_id(name_or_id)?;
        self.load(&id)
    }

    /// True when a name or UUID is present in the index.
    pub fn exists(&self, name_or_id: &str) -> Result<bool> {
        Ok(self.load_index()?.contains(name_or_id))
    }

    /// Store a new entity, rejecting duplicate names.
    pub fn create(&self, value: T) -> Result<T> {
        let index = self.load_index()?;
        if index.name_to_id.contains_key(&value.entity().name) {
            return Err(Error::AlreadyExists(format!(
                "{} '{}'",
                T::LABEL,
                value.entity().name
            )));
        }
        self.save(&value)?;
        Ok(value)
    }

    /// Load, mutate, bump `updated_at`, and persist.
    pub fn update<F>(&self, name_or_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut T) -> Result<()>,
    {
        let mut value = self.get(name_or_id)?;
        f(&mut value)?;
        value.entity_mut().touch();
        self.save(&value)?;
        Ok(value)
    }

    /// Delete an entity file and every index entry pointing at it.
    /// Returns the deleted entity.
    pub fn delete(&self, name_or_id: &str) -> Result<T> {
        let value = self.get(name_or_id)?;
        let mut index = self.load_index()?;
        index.remove(&value.entity().id);
        self.save_index(&index)?;
        let path = self.entity_path(&value.entity().id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(value)
    }

    /// Listing summaries sorted by name.
    pub fn list(&self) -> Result<Vec<EntitySummary>> {
        let index = self.load_index()?;
        let mut summaries: Vec<EntitySummary> = index.summaries.into_values().collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    /// UUIDs of entity files present on disk.
    fn file_ids(&self) -> Result<BTreeSet<String>> {
        let mut ids = BTreeSet::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == INDEX_FILE {
                continue;
            }
            if let Some(stem) = name.strip_suffix(".json") {
                ids.insert(stem.to_string());
            }
        }
        Ok(ids)
    }

    /// Cross-check the index against the files on disk.
    pub fn check(&self) -> Result<Vec<StoreIssue>> {
        let index = self.load_index()?;
        let files = self.file_ids()?;
        let mut issues = Vec::new();

        for (id, summary) in &index.summaries {
            if !files.contains(id) {
                issues.push(StoreIssue {
                    kind: T::LABEL.to_string(),
                    subject: id.clone(),
                    problem: format!("indexed as '{}' but the entity file is missing", summary.name),
                });
            } else if let Err(e) = self.load(id) {
                issues.push(StoreIssue {
                    kind: T::LABEL.to_string(),
                    subject: id.clone(),
                    problem: format!("entity file cannot be read: {}", e),
                });
            }
            if !index.name_to_id.values().any(|mapped| mapped == id) {
                issues.push(StoreIssue {
                    kind: T::LABEL.to_string(),
                    subject: id.clone(),
                    problem: format!("summary '{}' has no name alias", summary.name),
                });
            }
        }

        for id in &files {
            if !index.summaries.contains_key(id) {
                issues.push(StoreIssue {
                    kind: T::LABEL.to_string(),
                    subject: id.clone(),
                    problem: "entity file is not in the index".to_string(),
                });
            }
        }

        for (name, id) in &index.name_to_id {
            if !index.summaries.contains_key(id) {
                issues.push(StoreIssue {
                    kind: T::LABEL.to_string(),
                    subject: name.clone(),
                    problem: format!("name alias points at unknown id '{}'", id),
                });
            }
        }

        Ok(issues)
    }
}

/// The three entity stores rooted at one storage home.
pub struct Catalog {
    home: PathBuf,
    pub schemas: Store<Schema>,
    pub projects: Store<Project>,
    pub sheets: Store<ConfigSheet>,
}

impl Catalog {
    /// Open (creating directories as needed) the catalog at `home`.
    pub fn open(home: &Path) -> Result<Self> {
        fs::create_dir_all(home)?;
        Ok(Self {
            home: home.to_path_buf(),
            schemas: Store::open(home)?,
            projects: Store::open(home)?,
            sheets: Store::open(home)?,
        })
    }

    /// Storage home this catalog is rooted at.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Materialize all three index files.
    pub fn ensure_indexes(&self) -> Result<()> {
        self.schemas.ensure_index()?;
        self.projects.ensure_index()?;
        self.sheets.ensure_index()
    }

    /// Run the integrity check across all three stores.
    pub fn check(&self) -> Result<Vec<StoreIssue>> {
        let mut issues = self.schemas.check()?;
        issues.extend(self.projects.check()?);
        issues.extend(self.sheets.check()?);
        Ok(issues)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|e| {
        use serde::de::Error as _;
        Error::Json(serde_json::Error::custom(format!(
            "{}: {}",
            path.display(),
            e
        )))
    })
}

/// Write JSON through a temp file and rename it into place.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::InvalidInput(format!("no parent directory for {}", path.display())))?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
