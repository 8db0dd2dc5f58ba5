//! Dedupe state for the importer, persisted as a JSON array of keys.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Keys of the transactions imported so far. Saved after every insert
/// so an aborted run never re-imports what it already created.
#[derive(Debug)]
pub struct ImportState {
    path: PathBuf,
    imported: BTreeSet<String>,
}

impl ImportState {
    /// Loads the state file; a missing file is an empty state.
    pub fn load(path: &Path) -> Result<Self> {
        let imported = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(error) => return Err(error.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            imported,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.imported.contains(key)
    }

    pub fn insert(&mut self, key: String) -> Result<()> {
        self.imported.insert(key);
        self.save()
    }

    fn save(&self) -> Result<()> {
        let raw = serde_json::to_string_pretty(&self.imported)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}
