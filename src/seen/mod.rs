//! Durable record of identifiers already notified
//!
//! Persisted as a human-readable JSON array of strings, fully rewritten on
//! every mutation. The set is monotonic: there is no removal operation.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::warn;

use crate::extract::AssetId;

pub struct SeenSet {
    path: PathBuf,
    ids: HashSet<AssetId>,
}

impl SeenSet {
    /// Load the seen-set from `path`.
    ///
    /// An absent file yields an empty set; malformed content yields an empty
    /// set plus a warning. Never fatal.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Vec<serde_json::Value>>(&contents) {
                Ok(entries) => entries
                    .into_iter()
                    .filter_map(|entry| match entry {
                        serde_json::Value::String(s) => Some(AssetId::new(s)),
                        serde_json::Value::Number(n) => Some(AssetId::new(n.to_string())),
                        _ => None,
                    })
                    .collect(),
                Err(err) => {
                    warn!("could not parse {}, starting fresh: {err}", path.display());
                    HashSet::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashSet::new(),
            Err(err) => {
                warn!("could not read {}, starting fresh: {err}", path.display());
                HashSet::new()
            }
        };
        Self { path, ids }
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.ids.contains(id)
    }

    /// Record an identifier in memory. Call [`save`] afterwards; a mutation
    /// is not durable until the file has been rewritten.
    ///
    /// [`save`]: SeenSet::save
    pub fn insert(&mut self, id: AssetId) -> bool {
        self.ids.insert(id)
    }

    /// Rewrite the backing file with the current set.
    pub fn save(&self) -> io::Result<()> {
        let mut entries: Vec<&str> = self.ids.iter().map(AssetId::as_str).collect();
        entries.sort_unstable();
        let serialized = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, serialized)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[cfg(test)]
    pub fn ids(&self) -> &HashSet<AssetId> {
        &self.ids
    }
}

impl std::fmt::Debug for SeenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeenSet")
            .field("path", &self.path)
            .field("len", &self.ids.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absent_file_yields_empty_set() {
        let dir = tempdir().unwrap();
        let seen = SeenSet::load(dir.path().join("seen.json"));
        assert!(seen.is_empty());
    }

    #[test]
    fn malformed_file_yields_empty_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seen.json");
        fs::write(&path, "{not json").unwrap();
        let seen = SeenSet::load(&path);
        assert!(seen.is_empty());
    }

    #[test]
    fn non_array_content_yields_empty_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seen.json");
        fs::write(&path, r#"{"oops": true}"#).unwrap();
        assert!(SeenSet::load(&path).is_empty());
    }

    #[test]
    fn numeric_entries_coerce_to_strings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seen.json");
        fs::write(&path, r#"[123, "456"]"#).unwrap();
        let seen = SeenSet::load(&path);
        assert!(seen.contains(&AssetId::new("123")));
        assert!(seen.contains(&AssetId::new("456")));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seen.json");

        let mut seen = SeenSet::load(&path);
        for id in ["9", "5", "7"] {
            seen.insert(AssetId::new(id));
        }
        seen.save().unwrap();

        let reloaded = SeenSet::load(&path);
        assert_eq!(reloaded.ids(), seen.ids());
    }

    #[test]
    fn insert_reports_novelty() {
        let dir = tempdir().unwrap();
        let mut seen = SeenSet::load(dir.path().join("seen.json"));
        assert!(seen.insert(AssetId::new("1")));
        assert!(!seen.insert(AssetId::new("1")));
    }
}
