//! Named JSON presets stored side by side in one directory.

use std::path::{Path, PathBuf};

use trellis_config::path::{canonical_join, safe_filename};
use trellis_config::DEFAULT_PRESET_FILE;

use crate::container::StateContainer;
use crate::error::Result;

/// `(name, path)` for every `*.json` preset in `dir`, sorted by name.
///
/// With `include_default`, the default preset is listed as `("", dir/#.json)`
/// whether or not the file exists yet. A missing directory yields only that
/// entry (or nothing).
pub fn available_presets(dir: impl AsRef<Path>, include_default: bool) -> Vec<(String, PathBuf)> {
    let dir = dir.as_ref();
    let mut presets = Vec::new();
    if include_default {
        presets.push((String::new(), canonical_join(dir, DEFAULT_PRESET_FILE)));
    }

    let Ok(entries) = std::fs::read_dir(dir) else {
        return presets;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if entry.file_name() == DEFAULT_PRESET_FILE || !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            presets.push((stem.to_string(), canonical_join(dir, entry.file_name())));
        }
    }

    presets.sort();
    presets
}

/// Path a preset called `name` is stored at.
pub fn preset_path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    canonical_join(dir, format!("{}.json", safe_filename(name)))
}

/// Save the container under `name` in `dir`. Returns the file written.
pub fn save_preset(state: &StateContainer, dir: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
    let path = preset_path(dir, name);
    state.save_json(&path)?;
    Ok(path)
}

/// Overlay the preset called `name` from `dir` onto the container.
pub fn load_preset(state: &StateContainer, dir: impl AsRef<Path>, name: &str) -> Result<()> {
    state.load_json(preset_path(dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_dir() {
        let presets = available_presets("/nonexistent/presets", true);
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].0, "");
        assert!(presets[0].1.ends_with("#.json"));

        assert!(available_presets("/nonexistent/presets", false).is_empty());
    }

    #[test]
    fn test_lists_json_files_sorted() {
        let temp = tempdir().unwrap();
        for name in ["zeta.json", "alpha.json", "#.json", "notes.txt"] {
            std::fs::write(temp.path().join(name), "{}").unwrap();
        }
        std::fs::create_dir(temp.path().join("dir.json")).unwrap();

        let names: Vec<_> = available_presets(temp.path(), true)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["", "alpha", "zeta"]);
    }

    #[test]
    fn test_preset_path_is_sanitized() {
        let path = preset_path("presets", "../escape");
        assert_eq!(path, PathBuf::from("presets/_escape.json"));
    }
}
