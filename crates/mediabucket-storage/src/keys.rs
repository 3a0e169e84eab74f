//! Object key generation.
//!
//! Key format: `[{folder_path}/][{path}/]{hash}{ext}`. The folder segment is
//! omitted for the media-library root (`"/"`) and whenever the provider runs
//! in pool mode. The key depends on nothing but the file metadata and the
//! pool flag, so the same file always maps to the same object.

use mediabucket_core::UploadFile;

/// Computed object key together with the directory-like prefix in front of
/// the file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    pub key: String,
    pub prefix: String,
}

/// Generate the object key for a host file.
pub fn object_key(file: &UploadFile, pool: bool) -> ObjectKey {
    build_key(
        file.path.as_deref(),
        file.folder_path.as_deref(),
        &file.hash,
        &file.ext,
        pool,
    )
}

/// Generate an object key from its individual parts.
pub fn build_key(
    path: Option<&str>,
    folder_path: Option<&str>,
    hash: &str,
    ext: &str,
    pool: bool,
) -> ObjectKey {
    let file_path = match path {
        Some(path) if !path.is_empty() => format!("{}/", path),
        _ => String::new(),
    };

    let prefix = match folder_path {
        Some(folder) if !pool && !folder.is_empty() && folder != "/" => {
            let folder = folder.strip_prefix('/').unwrap_or(folder);
            format!("{}/{}", folder, file_path)
        }
        _ => file_path,
    };

    ObjectKey {
        key: format!("{}{}{}", prefix, hash, ext),
        prefix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_and_path_are_joined() {
        let key = build_key(Some("thumb"), Some("a/b"), "cat_123", ".png", false);
        assert_eq!(key.key, "a/b/thumb/cat_123.png");
        assert_eq!(key.prefix, "a/b/thumb/");
    }

    #[test]
    fn leading_slash_is_removed_from_folder() {
        let key = build_key(None, Some("/1/4"), "cat_123", ".png", false);
        assert_eq!(key.key, "1/4/cat_123.png");
    }

    #[test]
    fn missing_or_root_folder_yields_path_only() {
        let without = build_key(Some("thumb"), None, "cat_123", ".png", false);
        let root = build_key(Some("thumb"), Some("/"), "cat_123", ".png", false);
        assert_eq!(without.key, "thumb/cat_123.png");
        assert_eq!(root, without);
    }

    #[test]
    fn root_level_object_without_path_and_folder() {
        let key = build_key(None, None, "cat_123", ".png", false);
        assert_eq!(key.key, "cat_123.png");
        assert_eq!(key.prefix, "");

        let empty_path = build_key(Some(""), Some("/"), "cat_123", ".png", false);
        assert_eq!(empty_path, key);
    }

    #[test]
    fn pool_mode_ignores_folder() {
        for folder in [None, Some("/"), Some("a/b"), Some("/deep/nested/folder")] {
            let key = build_key(Some("thumb"), folder, "cat_123", ".png", true);
            assert_eq!(key.key, "thumb/cat_123.png");
        }
        let key = build_key(None, Some("a/b"), "cat_123", ".png", true);
        assert_eq!(key.key, "cat_123.png");
    }

    #[test]
    fn key_is_stable_for_the_same_file() {
        let file = UploadFile::new("cat_123", ".png")
            .with_path("small")
            .with_folder_path("/albums");
        assert_eq!(object_key(&file, false), object_key(&file, false));
        assert_eq!(object_key(&file, false).key, "albums/small/cat_123.png");
    }
}
