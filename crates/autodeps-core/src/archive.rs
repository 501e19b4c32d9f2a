use crate::error::{AutodepsError, Result};
use crate::CLASS_SUFFIX;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Lazily yields the fully-qualified class names stored in a jar.
///
/// Entries are visited by index without decompressing them; only names
/// ending in `.class` come out, converted from `com/x/Foo.class` to `com.x.Foo`.
pub struct ArchiveClasses {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    next: usize,
}

impl ArchiveClasses {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_count(&self) -> usize {
        self.archive.len()
    }
}

impl Iterator for ArchiveClasses {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.archive.len();
        while self.next < len {
            let idx = self.next;
            self.next += 1;

            let entry = match self.archive.by_index_raw(idx) {
                Ok(entry) => entry,
                Err(e) => {
                    // A broken central directory entry leaves the rest unreliable.
                    self.next = len;
                    return Some(Err(unreadable(&self.path, e)));
                }
            };
            if entry.is_dir() {
                continue;
            }
            if let Some(class) = class_name_from_entry(entry.name()) {
                return Some(Ok(class));
            }
        }
        None
    }
}

/// Opens `path` and returns an iterator over its classes.
pub fn list_classes(path: &Path) -> Result<ArchiveClasses> {
    let file = File::open(path).map_err(|e| unreadable(path, e))?;
    let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| unreadable(path, e))?;
    Ok(ArchiveClasses {
        path: path.to_path_buf(),
        archive,
        next: 0,
    })
}

pub fn collect_classes(path: &Path) -> Result<Vec<String>> {
    list_classes(path)?.collect()
}

pub fn class_name_from_entry(entry: &str) -> Option<String> {
    let stem = entry.strip_suffix(CLASS_SUFFIX)?;
    if stem.is_empty() || stem.ends_with('/') {
        return None;
    }
    Some(stem.replace(['/', '\\'], "."))
}

fn unreadable(path: &Path, err: impl std::fmt::Display) -> AutodepsError {
    AutodepsError::ArchiveUnreadable {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
