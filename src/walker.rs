use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::fs::{Entry, EntryKind};

/// Lazily yields an [`Entry`] for every filesystem object strictly below
/// `root`, directories before their children. Per-entry access failures
/// (permission denied, broken links) are skipped, never surfaced: a partial
/// subtree is not a fatal condition for either indexing or search.
///
/// Symbolic links are not followed and are reported as files; there is no
/// cycle detection beyond the OS link-depth limit.
pub fn walk(root: &Path) -> impl Iterator<Item = Entry> + '_ {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|result| match result {
            Ok(dir_entry) => classify(dir_entry),
            Err(err) => {
                if let Some(path) = err.path() {
                    debug!("walk skipping {}: {err}", path.display());
                } else {
                    debug!("walk error: {err}");
                }
                None
            }
        })
}

fn classify(dir_entry: walkdir::DirEntry) -> Option<Entry> {
    let path = dir_entry.path().to_path_buf();
    let kind = if dir_entry.file_type().is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };

    let modified = match dir_entry.metadata() {
        Ok(metadata) => metadata.modified().ok(),
        Err(err) => {
            debug!("walk metadata unavailable for {}: {err}", path.display());
            None
        }
    };

    let file_name = dir_entry.file_name().to_string_lossy().into_owned();

    Some(Entry {
        path,
        file_name,
        kind,
        modified,
    })
}
