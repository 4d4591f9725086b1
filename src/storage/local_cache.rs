use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::core::utils::{ensure_dir, write_atomic};
use crate::errors::LedgerError;
use crate::storage::KeyValueStore;

const VALUE_EXTENSION: &str = "json";

/// Key-value store keeping one file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let root = root.into();
        ensure_dir(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", sanitize_key(key), VALUE_EXTENSION))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        write_atomic(&self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LedgerError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn set_get_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("cache")).unwrap();

        assert_eq!(store.get("expenses_data").unwrap(), None);
        store.set("expenses_data", "{\"entries\":[]}").unwrap();
        assert_eq!(
            store.get("expenses_data").unwrap().as_deref(),
            Some("{\"entries\":[]}")
        );
        store.remove("expenses_data").unwrap();
        store.remove("expenses_data").unwrap();
        assert_eq!(store.get("expenses_data").unwrap(), None);
    }

    #[test]
    fn keys_cannot_escape_the_root() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path()).unwrap();
        let path = store.path_for("../outside");
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(path.file_name().unwrap(), "___outside.json");
    }
}
