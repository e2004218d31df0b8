//! File discovery and loading.
//!
//! Settings files are looked up by name in every [`SearchPath`], lowest
//! priority first. All files found are returned in order so the caller can
//! layer them; missing files are skipped and only real I/O errors propagate.
//!
//! Configuration trees and entry lists are read and written here too. A tree
//! file is JSON or TOML, picked by extension; an entry list is always JSON.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::HereditasError;
use crate::types::{DiffEntry, SearchPath};

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// `app_name` names the platform config directory (e.g. `~/.config/{app_name}/`
/// on Linux). Returns `None` when the directory cannot be determined.
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Read `{dir}/{file_name}` from each search path that resolves, in order.
pub fn load_settings_files(
    search_paths: &[SearchPath],
    file_name: &str,
    app_name: &str,
) -> Result<Vec<(PathBuf, String)>, HereditasError> {
    let mut results = Vec::new();
    for dir in search_paths
        .iter()
        .filter_map(|sp| resolve_search_path(sp, app_name))
    {
        let file_path = dir.join(file_name);
        match std::fs::read_to_string(&file_path) {
            Ok(content) => {
                debug!(path = %file_path.display(), "found settings file");
                results.push((file_path, content));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(HereditasError::IoError {
                    path: file_path,
                    source: e,
                });
            }
        }
    }
    Ok(results)
}

/// On-disk encoding of a configuration tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeFormat {
    Json,
    Toml,
}

impl TreeFormat {
    /// Pick the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, HereditasError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(TreeFormat::Json),
            Some("toml") => Ok(TreeFormat::Toml),
            _ => Err(HereditasError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

fn read(path: &Path) -> Result<String, HereditasError> {
    std::fs::read_to_string(path).map_err(|e| HereditasError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write(path: &Path, content: &str) -> Result<(), HereditasError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| HereditasError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| HereditasError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load a configuration tree. The root must be a map.
pub fn load_tree(path: &Path) -> Result<Map<String, Value>, HereditasError> {
    let content = read(path)?;
    let value: Value = match TreeFormat::from_path(path)? {
        TreeFormat::Json => {
            serde_json::from_str(&content).map_err(|e| HereditasError::JsonError {
                path: path.to_path_buf(),
                source: e,
            })?
        }
        TreeFormat::Toml => toml::from_str(&content).map_err(|e| HereditasError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?,
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(HereditasError::NotATree {
            path: path.to_path_buf(),
        }),
    }
}

/// Serialize a tree in the format its path names.
pub fn render_tree(tree: &Map<String, Value>, format: TreeFormat) -> Result<String, HereditasError> {
    match format {
        TreeFormat::Json => {
            serde_json::to_string_pretty(tree).map_err(|e| HereditasError::InvalidValue {
                key: "<tree>".into(),
                reason: e.to_string(),
            })
        }
        // TOML has no null; trees holding one fail here.
        TreeFormat::Toml => {
            toml::to_string_pretty(tree).map_err(|e| HereditasError::InvalidValue {
                key: "<tree>".into(),
                reason: e.to_string(),
            })
        }
    }
}

/// Write a tree, creating parent directories as needed.
pub fn write_tree(path: &Path, tree: &Map<String, Value>) -> Result<(), HereditasError> {
    let content = render_tree(tree, TreeFormat::from_path(path)?)?;
    write(path, &content)?;
    debug!(path = %path.display(), keys = tree.len(), "wrote tree");
    Ok(())
}

/// Load a decided entry list (JSON array of entries).
pub fn load_entries(path: &Path) -> Result<Vec<DiffEntry>, HereditasError> {
    let content = read(path)?;
    serde_json::from_str(&content).map_err(|e| HereditasError::JsonError {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{current_tree, tree};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn resolve_explicit_path() {
        let p = PathBuf::from("/tmp/hereditas");
        let resolved = resolve_search_path(&SearchPath::Path(p.clone()), "ignored");
        assert_eq!(resolved, Some(p));
    }

    #[test]
    fn load_no_files_exist() {
        let dir = TempDir::new().unwrap();
        let paths = vec![SearchPath::Path(dir.path().to_path_buf())];
        let files = load_settings_files(&paths, "nonexistent.toml", "test").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn load_multiple_files_in_order() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();
        let dir3 = TempDir::new().unwrap();
        fs::write(dir1.path().join("h.toml"), "strict = false\n").unwrap();
        fs::write(dir3.path().join("h.toml"), "advanced = true\n").unwrap();

        let paths = vec![
            SearchPath::Path(dir1.path().to_path_buf()),
            SearchPath::Path(dir2.path().to_path_buf()),
            SearchPath::Path(dir3.path().to_path_buf()),
        ];
        let files = load_settings_files(&paths, "h.toml", "test").unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].1.contains("strict"));
        assert!(files[1].1.contains("advanced"));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_returns_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("h.toml");
        fs::write(&file_path, "strict = true\n").unwrap();
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits.
        let readable = fs::read_to_string(&file_path).is_ok();
        let paths = vec![SearchPath::Path(dir.path().to_path_buf())];
        let result = load_settings_files(&paths, "h.toml", "test");
        assert_eq!(result.is_err(), !readable);

        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            TreeFormat::from_path(Path::new("a/koishi.JSON")).unwrap(),
            TreeFormat::Json
        );
        assert_eq!(
            TreeFormat::from_path(Path::new("koishi.toml")).unwrap(),
            TreeFormat::Toml
        );
        assert!(matches!(
            TreeFormat::from_path(Path::new("koishi.yml")),
            Err(HereditasError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn json_tree_round_trip_keeps_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("tree.json");
        let original = current_tree();
        write_tree(&path, &original).unwrap();
        let loaded = load_tree(&path).unwrap();
        assert_eq!(
            loaded.keys().collect::<Vec<_>>(),
            original.keys().collect::<Vec<_>>()
        );
        assert_eq!(loaded, original);
    }

    #[test]
    fn toml_tree_loads_group_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tree.toml");
        fs::write(
            &path,
            "[console]\nport = 5140\n\n[\"group:basic\"]\n\"$label\" = \"Basic\"\n\n[\"group:basic\".\"~sudo\"]\n",
        )
        .unwrap();
        let loaded = load_tree(&path).unwrap();
        assert_eq!(
            Value::Object(loaded),
            json!({
                "console": {"port": 5140},
                "group:basic": {"$label": "Basic", "~sudo": {}},
            })
        );
    }

    #[test]
    fn toml_write_rejects_null() {
        let t = tree(json!({"foo": null}));
        assert!(render_tree(&t, TreeFormat::Toml).is_err());
    }

    #[test]
    fn non_map_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tree.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            load_tree(&path),
            Err(HereditasError::NotATree { .. })
        ));
    }

    #[test]
    fn malformed_json_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tree.json");
        fs::write(&path, "{").unwrap();
        let err = load_tree(&path).unwrap_err();
        assert!(err.to_string().contains("tree.json"));
    }

    #[test]
    fn missing_tree_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_tree(&dir.path().join("absent.json")),
            Err(HereditasError::IoError { .. })
        ));
    }

    #[test]
    fn load_entries_reads_decisions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entries.json");
        fs::write(
            &path,
            r#"[{"id":"foo","name":"foo","instanceId":"default","enabled":true,
                "imported":{"a":1},"status":"added","decision":"add"}]"#,
        )
        .unwrap();
        let entries = load_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].decision, Some(crate::types::Decision::Add));
    }
}
