use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::fs::type_label;
use crate::matcher::NameMatcher;
use crate::sort::SortSpec;
use crate::store::EntryStore;
use crate::util::format_modified;
use crate::walker;

/// One query execution's input. Ephemeral; never persisted.
#[derive(Debug, Clone)]
pub struct Query {
    pub term: String,
    pub root: PathBuf,
    pub sort: SortSpec,
}

/// One matched filesystem object, formatted for display. Hits are owned
/// snapshots; callers never hold a reference into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub path: PathBuf,
    pub type_label: String,
    pub modified: String,
}

/// Which strategy served a query. Index presence silently widens scope from
/// "live walk of the chosen root" to "whole indexed tree", so the boundary
/// reports the mode for the caller to surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Indexed,
    Live,
}

/// Runs one query and returns the unordered hits plus the mode that served
/// them; ordering is the sorter's job.
///
/// Index-backed when the store is non-empty: every stored pair is filtered
/// by base-name match, then each survivor is re-stat'ed for a fresh modified
/// time. A stat failure (typically a path deleted since indexing) excludes
/// the entry rather than failing the query. Live otherwise: the root is
/// walked and labels derived per surviving entry.
pub fn execute(query: &Query, store: &EntryStore) -> (Vec<Hit>, SearchMode) {
    let Some(matcher) = NameMatcher::new(&query.term) else {
        // Callers reject empty terms before dispatch; nothing matches here.
        return (Vec::new(), SearchMode::Live);
    };

    if store.is_empty() {
        (live_search(&query.root, &matcher), SearchMode::Live)
    } else {
        (indexed_search(store, &matcher), SearchMode::Indexed)
    }
}

fn indexed_search(store: &EntryStore, matcher: &NameMatcher) -> Vec<Hit> {
    let mut hits = Vec::new();
    for (path_str, label) in store.iter() {
        let path = Path::new(path_str);
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !matcher.matches(name) {
            continue;
        }

        // Fresh mtime from disk; the index never stores one.
        let modified = match fs::metadata(path) {
            Ok(metadata) => metadata.modified().ok(),
            Err(err) => {
                debug!("dropping stale index entry {path_str}: {err}");
                continue;
            }
        };

        hits.push(Hit {
            path: path.to_path_buf(),
            type_label: label.to_string(),
            modified: format_modified(modified),
        });
    }
    hits
}

fn live_search(root: &Path, matcher: &NameMatcher) -> Vec<Hit> {
    walker::walk(root)
        .filter(|entry| matcher.matches(&entry.file_name))
        .map(|entry| Hit {
            type_label: type_label(&entry.path, entry.kind),
            modified: format_modified(entry.modified),
            path: entry.path,
        })
        .collect()
}
