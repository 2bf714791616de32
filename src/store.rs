use std::io::{self, Write};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::error::DexError;

/// On-disk tier of the fetch cache: one directory per entity namespace,
/// one JSON file per key.
#[derive(Debug, Clone)]
pub struct Store {
    cache_root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, DexError> {
        let cache_root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("dex-export")).ok()
            })
            .ok_or_else(|| DexError::Filesystem("unable to resolve cache directory".to_string()))?;

        Ok(Self { cache_root })
    }

    pub fn new_with_paths(cache_root: Utf8PathBuf) -> Self {
        Self { cache_root }
    }

    pub fn cache_root(&self) -> &Utf8Path {
        &self.cache_root
    }

    pub fn namespace_dir(&self, namespace: &str) -> Utf8PathBuf {
        self.cache_root.join(namespace)
    }

    pub fn record_path(&self, namespace: &str, key: &str) -> Utf8PathBuf {
        self.namespace_dir(namespace)
            .join(format!("{}.json", encode_key(key)))
    }

    pub async fn read_record(path: &Utf8Path) -> Result<Option<Vec<u8>>, DexError> {
        match tokio::fs::read(path.as_std_path()).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(DexError::Filesystem(format!("read {path}: {err}"))),
        }
    }

    /// Writes a uniquely named sibling temp file and persists it over
    /// `path`. Concurrent writers of one key each land a whole record.
    pub async fn write_record_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), DexError> {
        let path = path.to_owned();
        let content = content.to_vec();
        tokio::task::spawn_blocking(move || persist_record(&path, &content))
            .await
            .map_err(|err| DexError::Filesystem(err.to_string()))?
    }

    pub fn clear_namespace(&self, namespace: &str) -> Result<(), DexError> {
        let dir = self.namespace_dir(namespace);
        if dir.as_std_path().exists() {
            std::fs::remove_dir_all(dir.as_std_path())
                .map_err(|err| DexError::Filesystem(err.to_string()))?;
        }
        Ok(())
    }
}

fn persist_record(path: &Utf8Path, content: &[u8]) -> Result<(), DexError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    std::fs::create_dir_all(parent.as_std_path())
        .map_err(|err| DexError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".record")
        .suffix(".tmp")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| DexError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| DexError::Filesystem(format!("write {path}: {err}")))?;
    temp.persist(path.as_std_path())
        .map_err(|err| DexError::Filesystem(format!("persist {path}: {}", err.error)))?;
    Ok(())
}

pub fn encode_key(key: &str) -> String {
    URL_SAFE_NO_PAD.encode(key.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let store = Store::new_with_paths(Utf8PathBuf::from("/tmp/dex-cache"));
        let path = store.record_path("ability", "overgrow");
        assert_eq!(path.as_str(), "/tmp/dex-cache/ability/b3Zlcmdyb3c.json");
    }

    #[test]
    fn encoded_keys_are_file_name_safe() {
        let encoded = encode_key(r#"{"limit":10000,"offset":0}"#);
        assert!(
            encoded
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        );
    }
}
