//! Path helpers for preset files and state snapshots.
//!
//! Preset names come from user input (UI text fields, CLI arguments), so they
//! are sanitized before they touch the filesystem.

use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

/// Characters that are never allowed in a preset file name.
const UNSAFE_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Join `name` onto `dir` and lexically normalize the result.
///
/// `.` components are dropped and `..` pops the previous component, without
/// touching the filesystem. Absolute `name`s are still joined under `dir`.
///
/// # Example
/// ```
/// use trellis_config::path::canonical_join;
/// use std::path::PathBuf;
///
/// assert_eq!(canonical_join("presets/./a", "../#.json"), PathBuf::from("presets/#.json"));
/// ```
pub fn canonical_join(dir: impl AsRef<Path>, name: impl AsRef<Path>) -> PathBuf {
    let name = name.as_ref();
    let relative = name.strip_prefix("/").unwrap_or(name);
    lexical_normalize(&dir.as_ref().join(relative))
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Turn an arbitrary display name into a safe file stem.
///
/// Path separators and reserved characters become `_`, surrounding whitespace
/// and dots are trimmed, and an empty result becomes `"unnamed"`.
pub fn safe_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if UNSAFE_FILENAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim().trim_matches('.');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalize path, falling back to the original if canonicalization fails.
pub fn normalize_or_original(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Write `bytes` to `path` atomically (temp file in the same directory, then rename).
///
/// Readers of `path` observe either the old content or the new content, never
/// a partial write.
pub fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
