use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Label used for directories.
pub const FOLDER_LABEL: &str = "Folder";

/// Label used for files without an extension.
pub const PLAIN_FILE_LABEL: &str = "File";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    File,
    Directory,
}

/// One filesystem object as observed during a walk.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: PathBuf,
    pub file_name: String,
    pub kind: EntryKind,
    pub modified: Option<SystemTime>,
}

/// Derives the type label for an entry: directories become "Folder", files
/// become their uppercased extension without the dot, and files without an
/// extension fall back to the plain-file sentinel.
///
/// The label is a pure function of the path and the observed kind; it never
/// looks at the search pattern.
pub fn type_label(path: &Path, kind: EntryKind) -> String {
    match kind {
        EntryKind::Directory => FOLDER_LABEL.to_string(),
        EntryKind::File => match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if !ext.is_empty() => ext.to_uppercase(),
            _ => PLAIN_FILE_LABEL.to_string(),
        },
    }
}
