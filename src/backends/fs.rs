// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem probe used by device name resolution
//!
//! Name resolution only ever needs three questions answered: what does this
//! file contain, what is in this directory, and where does this link point.
//! A missing file or directory is not an error here; it tells the caller the
//! lookup strategy that needed it does not apply.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

/// Read-only filesystem queries
pub trait FileSystem: Send + Sync {
    /// Contents of a file, or `None` if it cannot be read
    fn read_to_string(&self, path: &str) -> Option<String>;

    /// Names of the entries of a directory, or `None` if it cannot be listed
    fn list_dir(&self, dir: &str) -> Option<Vec<String>>;

    /// Path with symlinks resolved, or `None` if it does not exist
    fn canonicalize(&self, path: &str) -> Option<String>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFileSystem;

impl FileSystem for HostFileSystem {
    fn read_to_string(&self, path: &str) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }

    fn list_dir(&self, dir: &str) -> Option<Vec<String>> {
        let entries = std::fs::read_dir(dir).ok()?;
        Some(
            entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect(),
        )
    }

    fn canonicalize(&self, path: &str) -> Option<String> {
        std::fs::canonicalize(path)
            .ok()
            .map(|p| p.to_string_lossy().to_string())
    }
}

/// In-memory filesystem made of absolute file paths and their contents
///
/// Directories exist implicitly as ancestors of files. Paths are normalized
/// lexically, so `a/b/../c` and `a/c` name the same file.
#[derive(Debug, Clone, Default)]
pub struct FakeFileSystem {
    files: BTreeMap<String, String>,
}

impl FakeFileSystem {
    pub fn new<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: AsRef<str>,
        C: Into<String>,
    {
        let mut fs = Self::default();
        for (path, contents) in files {
            fs.add_file(path.as_ref(), contents);
        }
        fs
    }

    pub fn add_file(&mut self, path: &str, contents: impl Into<String>) {
        self.files.insert(normalize(path), contents.into());
    }

    fn is_dir(&self, path: &str) -> bool {
        let prefix = dir_prefix(path);
        self.files.keys().any(|f| f.starts_with(&prefix))
    }
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &str) -> Option<String> {
        self.files.get(&normalize(path)).cloned()
    }

    fn list_dir(&self, dir: &str) -> Option<Vec<String>> {
        let prefix = dir_prefix(dir);
        let entries: BTreeSet<String> = self
            .files
            .keys()
            .filter_map(|f| f.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        if entries.is_empty() {
            None
        } else {
            Some(entries.into_iter().collect())
        }
    }

    fn canonicalize(&self, path: &str) -> Option<String> {
        let normalized = normalize(path);
        if self.files.contains_key(&normalized) || self.is_dir(&normalized) {
            Some(normalized)
        } else {
            None
        }
    }
}

fn dir_prefix(dir: &str) -> String {
    let normalized = normalize(dir);
    if normalized.ends_with('/') {
        normalized
    } else {
        format!("{}/", normalized)
    }
}

/// Resolve `.` and `..` lexically without touching the disk
fn normalize(path: &str) -> String {
    let mut out = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out.to_string_lossy().to_string()
}
