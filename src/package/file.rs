//! Package file-system helpers.
//!
//! Discovery is deterministic: files come back sorted by path so log output
//! and import order are stable between runs.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use serde_json::Value;
use walkdir::WalkDir;

use super::types::ElementKind;
use crate::error::{Error, Result};

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn is_json_file_name(name: &str) -> bool {
    !is_hidden(name)
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// All non-hidden `*.json` files under `dir`, recursively, sorted.
///
/// A missing directory yields an empty list.
#[must_use]
pub fn find_json_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()))
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file() && is_json_file_name(&e.file_name().to_string_lossy()))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Non-hidden `*.json` files directly inside `dir`, sorted.
#[must_use]
pub fn top_level_json_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .filter(|e| is_json_file_name(&e.file_name().to_string_lossy()))
        .map(|e| e.path())
        .collect();
    files.sort();
    files
}

/// Compile an import `--include` glob.
///
/// `*` does not cross `/`; use `**` for nested folders.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` if the pattern is not a valid glob.
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern.trim_start_matches("./"))
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| Error::InvalidArgument(format!("invalid include pattern '{pattern}': {e}")))
}

/// JSON files under `root` whose path relative to `root` matches `pattern`.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` if the pattern is not a valid glob.
pub fn find_matching_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = compile_glob(pattern)?;
    Ok(find_json_files(root)
        .into_iter()
        .filter(|path| {
            path.strip_prefix(root)
                .is_ok_and(|relative| matcher.is_match(relative))
        })
        .collect())
}

/// Read and parse a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid JSON.
pub fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write `value` as 2-space pretty JSON with a trailing newline.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json_pretty(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Refuse to export into a location that already holds element files.
///
/// Only the top level of each element folder is checked.
///
/// # Errors
///
/// Returns `Error::ExportDirNotEmpty` naming the first offending folder.
pub fn check_export_dir(location: &Path) -> Result<()> {
    for kind in ElementKind::ALL {
        let folder = location.join(kind.folder());
        if !top_level_json_files(&folder).is_empty() {
            return Err(Error::ExportDirNotEmpty { path: folder });
        }
    }
    Ok(())
}

/// Create the export location and its element folders.
///
/// # Errors
///
/// Returns an error if a directory cannot be created.
pub fn prepare_export_dirs(location: &Path) -> Result<()> {
    for kind in ElementKind::ALL {
        fs::create_dir_all(location.join(kind.folder()))?;
    }
    Ok(())
}

/// Display `path` relative to `root` when possible.
#[must_use]
pub fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_find_json_files_recursive_sorted() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("b.json"));
        touch(&dir.path().join("a.json"));
        touch(&dir.path().join("nested/c.json"));
        touch(&dir.path().join(".hidden.json"));
        touch(&dir.path().join(".git/x.json"));
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = find_json_files(dir.path());
        let names: Vec<_> = files
            .iter()
            .map(|p| relative_display(p, dir.path()))
            .collect();
        assert_eq!(names, vec!["a.json", "b.json", "nested/c.json"]);
        assert!(find_json_files(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn test_find_matching_files_uses_glob() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("dashboards/test-a.json"));
        touch(&dir.path().join("dashboards/prod.json"));
        touch(&dir.path().join("dashboards/sub/test-b.json"));
        touch(&dir.path().join("events/test-c.json"));

        let found = find_matching_files(dir.path(), "dashboards/**/test-*.json").unwrap();
        let names: Vec<_> = found.iter().map(|p| relative_display(p, dir.path())).collect();
        assert_eq!(names, vec!["dashboards/sub/test-b.json", "dashboards/test-a.json"]);

        let found = find_matching_files(dir.path(), "dashboards/*.json").unwrap();
        assert_eq!(found.len(), 2);

        assert!(find_matching_files(dir.path(), "dashboards/[").is_err());
    }

    #[test]
    fn test_check_export_dir() {
        let dir = TempDir::new().unwrap();
        assert!(check_export_dir(dir.path()).is_ok());

        touch(&dir.path().join("events/.hidden.json"));
        touch(&dir.path().join("entities/nested/deep.json"));
        assert!(check_export_dir(dir.path()).is_ok());

        touch(&dir.path().join("smart-alerts/alert.json"));
        match check_export_dir(dir.path()) {
            Err(Error::ExportDirNotEmpty { path }) => {
                assert!(path.ends_with("smart-alerts"));
            }
            other => panic!("expected ExportDirNotEmpty, got {other:?}"),
        }
    }

    #[test]
    fn test_write_json_pretty_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/x.json");
        write_json_pretty(&path, &json!({"a": [1, 2]})).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n  \"a\": [\n    1,\n    2\n  ]\n}\n");
        assert_eq!(read_json(&path).unwrap(), json!({"a": [1, 2]}));
    }
}
