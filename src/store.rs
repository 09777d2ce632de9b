use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::fs::type_label;
use crate::walker;

/// In-memory index: absolute path → type label ("Folder", an uppercase
/// extension, or "File").
///
/// A store is populated wholesale by [`EntryStore::rebuild`] and replaced,
/// never merged; modified times are deliberately not stored and are re-read
/// from disk at query time.
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    root: Option<PathBuf>,
    built_utc: Option<i64>,
    entries: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct PersistedIndex<'a> {
    root: Option<&'a Path>,
    built_utc: Option<i64>,
    entries: &'a BTreeMap<String, String>,
}

/// Indexes written by older builds are a bare path→label object with no
/// root or build timestamp; keep loading those.
#[derive(Deserialize)]
#[serde(untagged)]
enum LoadedIndex {
    Envelope {
        #[serde(default)]
        root: Option<PathBuf>,
        #[serde(default)]
        built_utc: Option<i64>,
        entries: BTreeMap<String, String>,
    },
    Legacy(BTreeMap<String, String>),
}

#[derive(Debug)]
pub enum StoreError {
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Persist {
        path: PathBuf,
        message: String,
    },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Corrupt { path, source } => {
                write!(f, "corrupt index file {}: {source}", path.display())
            }
            StoreError::Io { path, source } => {
                write!(f, "failed to read index file {}: {source}", path.display())
            }
            StoreError::Persist { path, message } => {
                write!(f, "failed to write index file {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl EntryStore {
    /// Walks `root` and returns a brand-new store covering exactly that
    /// subtree. The result replaces any prior store; re-indexing a narrower
    /// subtree shrinks effective coverage, which the recorded root makes
    /// observable.
    pub fn rebuild(root: &Path) -> Self {
        let mut entries = BTreeMap::new();
        for entry in walker::walk(root) {
            let label = type_label(&entry.path, entry.kind);
            entries.insert(entry.path.to_string_lossy().into_owned(), label);
        }

        info!("indexed {} entries under {}", entries.len(), root.display());

        Self {
            root: Some(root.to_path_buf()),
            built_utc: Some(Utc::now().timestamp()),
            entries,
        }
    }

    /// Loads a persisted store. A missing file is `Ok(None)`; unreadable or
    /// malformed content is an error the caller degrades to an empty store
    /// plus a warning, never a fatal abort.
    pub fn load(path: &Path) -> Result<Option<Self>, StoreError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        let loaded: LoadedIndex =
            serde_json::from_str(&data).map_err(|err| StoreError::Corrupt {
                path: path.to_path_buf(),
                source: err,
            })?;

        let store = match loaded {
            LoadedIndex::Envelope {
                root,
                built_utc,
                entries,
            } => Self {
                root,
                built_utc,
                entries,
            },
            LoadedIndex::Legacy(entries) => {
                debug!("loaded legacy index without root metadata");
                Self {
                    root: None,
                    built_utc: None,
                    entries,
                }
            }
        };

        Ok(Some(store))
    }

    /// Persists the full store, atomically replacing any prior file via
    /// write-to-temp-then-rename so a crash mid-write never leaves a
    /// truncated index behind.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let persist_err = |message: String| StoreError::Persist {
            path: path.to_path_buf(),
            message,
        };

        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent).map_err(|err| persist_err(err.to_string()))?;
        }

        let json = serde_json::to_string(&PersistedIndex {
            root: self.root.as_deref(),
            built_utc: self.built_utc,
            entries: &self.entries,
        })
        .map_err(|err| persist_err(err.to_string()))?;

        let dir = parent.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        let mut temp = NamedTempFile::new_in(&dir).map_err(|err| persist_err(err.to_string()))?;
        temp.write_all(json.as_bytes())
            .map_err(|err| persist_err(err.to_string()))?;
        temp.persist(path)
            .map_err(|err| persist_err(err.to_string()))?;

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Root the index was built from, if this store recorded one.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn built_utc(&self) -> Option<i64> {
        self.built_utc
    }

    pub fn label_of(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(path, label)| (path.as_str(), label.as_str()))
    }
}

/// Default persisted-index location under the platform data directory.
pub fn default_index_path() -> PathBuf {
    let mut base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push("findex");
    base.push("index.json");
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips_the_mapping() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("a")).expect("mkdir");
        std::fs::write(dir.path().join("a/x.txt"), "x").expect("write");
        std::fs::write(dir.path().join("a/y"), "y").expect("write");

        let store = EntryStore::rebuild(dir.path());
        let index_path = dir.path().join("index.json");
        store.save(&index_path).expect("save");

        let loaded = EntryStore::load(&index_path)
            .expect("load")
            .expect("present");

        assert_eq!(loaded.len(), store.len());
        assert_eq!(loaded.root(), Some(dir.path()));
        for (path, label) in store.iter() {
            assert_eq!(loaded.label_of(path), Some(label));
        }
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = EntryStore::load(&dir.path().join("absent.json")).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn corrupt_file_is_reported_not_swallowed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let index_path = dir.path().join("index.json");
        std::fs::write(&index_path, "{ not json").expect("write");

        match EntryStore::load(&index_path) {
            Err(StoreError::Corrupt { path, .. }) => assert_eq!(path, index_path),
            other => panic!("expected corrupt error, got {other:?}"),
        }
    }

    #[test]
    fn legacy_flat_mapping_still_loads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let index_path = dir.path().join("index.json");
        std::fs::write(
            &index_path,
            r#"{"/old/path/report.txt": "TXT", "/old/path": "Folder"}"#,
        )
        .expect("write");

        let loaded = EntryStore::load(&index_path)
            .expect("load")
            .expect("present");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.label_of("/old/path"), Some("Folder"));
        assert_eq!(loaded.root(), None);
    }

    #[test]
    fn save_replaces_a_prior_index_wholesale() {
        let dir = tempfile::tempdir().expect("tempdir");
        let index_path = dir.path().join("index.json");
        std::fs::write(&index_path, r#"{"/stale": "File"}"#).expect("write");

        std::fs::write(dir.path().join("fresh.txt"), "f").expect("write");
        let store = EntryStore::rebuild(dir.path());
        store.save(&index_path).expect("save");

        let loaded = EntryStore::load(&index_path)
            .expect("load")
            .expect("present");
        assert_eq!(loaded.label_of("/stale"), None);
    }

    #[test]
    fn rebuild_classifies_kinds_and_extensions() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("a")).expect("mkdir");
        std::fs::write(dir.path().join("a/x.txt"), "x").expect("write");
        std::fs::write(dir.path().join("a/y"), "y").expect("write");

        let store = EntryStore::rebuild(dir.path());
        let key = |p: &Path| p.to_string_lossy().into_owned();

        assert_eq!(store.len(), 3);
        assert_eq!(store.label_of(&key(&dir.path().join("a"))), Some("Folder"));
        assert_eq!(
            store.label_of(&key(&dir.path().join("a/x.txt"))),
            Some("TXT")
        );
        assert_eq!(store.label_of(&key(&dir.path().join("a/y"))), Some("File"));
    }
}
