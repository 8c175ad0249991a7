//! Manifest discovery.

use crate::error::{InjectError, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Finds every `<base>/*/<manifest_name>` file, sorted by path.
///
/// Only the first level below `base` is searched: manifests sitting directly
/// in `base` or deeper in the tree are ignored, and directories without a
/// manifest are skipped. Hidden and git-ignored directories are searched like
/// any other; symlinked directories are followed.
///
/// # Errors
///
/// `MissingBaseDirectory` if `base` is not an existing directory.
pub fn locate_manifests(base: &Path, manifest_name: &str) -> Result<Vec<PathBuf>> {
    if !base.is_dir() {
        return Err(InjectError::MissingBaseDirectory(base.to_path_buf()));
    }

    let walker = WalkBuilder::new(base)
        .standard_filters(false)
        .follow_links(true)
        .max_depth(Some(2))
        .build();

    let mut manifests = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", base.display(), e);
                continue;
            }
        };

        if entry.depth() != 2 || entry.file_name() != manifest_name {
            continue;
        }
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        log::debug!("Found manifest: {}", entry.path().display());
        manifests.push(entry.into_path());
    }

    manifests.sort();
    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "[package]\n").unwrap();
    }

    #[test]
    fn test_missing_base_directory() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("crates");

        let result = locate_manifests(&base, "Cargo.toml");
        assert!(matches!(
            result,
            Err(InjectError::MissingBaseDirectory(path)) if path == base
        ));
    }

    #[test]
    fn test_base_is_a_file() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("crates");
        fs::write(&base, "").unwrap();

        let result = locate_manifests(&base, "Cargo.toml");
        assert!(matches!(result, Err(InjectError::MissingBaseDirectory(_))));
    }

    #[test]
    fn test_finds_one_level_down_sorted() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        touch(&base.join("zeta/Cargo.toml"));
        touch(&base.join("alpha/Cargo.toml"));
        touch(&base.join("mid/Cargo.toml"));

        let found = locate_manifests(base, "Cargo.toml").unwrap();
        assert_eq!(
            found,
            vec![
                base.join("alpha/Cargo.toml"),
                base.join("mid/Cargo.toml"),
                base.join("zeta/Cargo.toml"),
            ]
        );
    }

    #[test]
    fn test_ignores_other_depths_and_names() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        touch(&base.join("Cargo.toml"));
        touch(&base.join("core/nested/Cargo.toml"));
        touch(&base.join("core/Cargo.lock"));
        fs::create_dir(base.join("empty")).unwrap();
        touch(&base.join("api/Cargo.toml"));

        let found = locate_manifests(base, "Cargo.toml").unwrap();
        assert_eq!(found, vec![base.join("api/Cargo.toml")]);
    }

    #[test]
    fn test_skips_directory_named_like_manifest() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        fs::create_dir_all(base.join("odd/Cargo.toml")).unwrap();

        let found = locate_manifests(base, "Cargo.toml").unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_hidden_and_ignored_directories_included() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        fs::write(base.join(".gitignore"), "skipped/\n").unwrap();
        touch(&base.join(".hidden/Cargo.toml"));
        touch(&base.join("skipped/Cargo.toml"));

        let found = locate_manifests(base, "Cargo.toml").unwrap();
        assert_eq!(
            found,
            vec![base.join(".hidden/Cargo.toml"), base.join("skipped/Cargo.toml")]
        );
    }

    #[test]
    fn test_custom_manifest_name() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        touch(&base.join("a/Manifest.toml"));
        touch(&base.join("b/Cargo.toml"));

        let found = locate_manifests(base, "Manifest.toml").unwrap();
        assert_eq!(found, vec![base.join("a/Manifest.toml")]);
    }
}
