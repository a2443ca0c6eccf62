use super::KeyValueStore;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each key as a JSON file inside one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) => {
                let err = Error::from(e);
                if err.is_not_found() {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_then_get() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        assert_eq!(store.get("codescan:history").unwrap(), None);
        store.set("codescan:history", "[]").unwrap();
        assert_eq!(store.get("codescan:history").unwrap().as_deref(), Some("[]"));

        store.set("codescan:history", "[1]").unwrap();
        assert_eq!(store.get("codescan:history").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_key_becomes_safe_file_name() {
        let store = FileStore::new("/data");
        assert_eq!(
            store.path_for("codescan:settings"),
            PathBuf::from("/data/codescan_settings.json")
        );
        assert_eq!(
            store.path_for("../escape"),
            PathBuf::from("/data/___escape.json")
        );
    }

    #[test]
    fn test_set_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("store"));
        store.set("k", "v").unwrap();
        assert!(store.path_for("k").exists());
        assert!(!store.path_for("k").with_extension("json.tmp").exists());
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.remove("nothing").unwrap();

        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
