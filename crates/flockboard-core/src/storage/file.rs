//! JSON-file snapshot store.

use super::{BoxFuture, NamedSnapshot, SnapshotStore, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each snapshot as a JSON file in a directory.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Linux: `~/.local/share/flockboard/snapshots/`
    /// On Windows: `%LOCALAPPDATA%\flockboard\snapshots\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("flockboard").join("snapshots"))
    }

    /// File path for a snapshot name.
    fn snapshot_path(&self, name: &str) -> PathBuf {
        let safe: String = name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

fn read_snapshot(path: &Path) -> StorageResult<NamedSnapshot> {
    let json = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    NamedSnapshot::from_json(&json)
        .map_err(|e| StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e)))
}

impl SnapshotStore for FileStore {
    fn save(&self, snapshot: &NamedSnapshot) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.snapshot_path(&snapshot.name);
        let json = snapshot.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            fs::write(&path, json)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
            log::info!("saved snapshot to {}", path.display());
            Ok(())
        })
    }

    fn load(&self, name: &str) -> BoxFuture<'_, StorageResult<NamedSnapshot>> {
        let path = self.snapshot_path(name);
        let name = name.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(name));
            }
            read_snapshot(&path)
        })
    }

    fn delete(&self, name: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.snapshot_path(name);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    /// Names as recorded inside each file, not the sanitized file stems.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;
            let mut names = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_none_or(|ext| ext != "json") {
                    continue;
                }
                match read_snapshot(&path) {
                    Ok(snapshot) => names.push(snapshot.name),
                    Err(e) => log::warn!("skipping unreadable snapshot: {}", e),
                }
            }
            names.sort();
            Ok(names)
        })
    }

    fn exists(&self, name: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.snapshot_path(name);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::ElementCollection;
    use crate::elements::{Element, ElementStyle, Line};
    use crate::storage::block_on;
    use kurbo::Point;
    use tempfile::tempdir;

    fn snapshot(name: &str) -> NamedSnapshot {
        let mut elements = ElementCollection::new();
        elements.push(Element::Line(Line::new(
            Point::new(0.0, 0.0),
            Point::new(20.0, 10.0),
            ElementStyle::default(),
        )));
        NamedSnapshot::new(name, "room-1", elements).unwrap()
    }

    #[test]
    fn test_file_store_save_load() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let saved = snapshot("retro");
        block_on(store.save(&saved)).unwrap();
        let loaded = block_on(store.load("retro")).unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.elements.len(), 1);
    }

    #[test]
    fn test_file_store_not_found() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let result = block_on(store.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_store_list_uses_recorded_names() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        block_on(store.save(&snapshot("week 1"))).unwrap();
        block_on(store.save(&snapshot("week/2"))).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let names = block_on(store.list()).unwrap();
        assert_eq!(names, vec!["week 1".to_string(), "week/2".to_string()]);
    }

    #[test]
    fn test_file_store_delete() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        block_on(store.save(&snapshot("temp"))).unwrap();
        assert!(block_on(store.exists("temp")).unwrap());
        block_on(store.delete("temp")).unwrap();
        assert!(!block_on(store.exists("temp")).unwrap());
    }

    #[test]
    fn test_file_store_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::new(nested.clone()).unwrap();
        assert_eq!(store.base_path(), nested.as_path());
        assert!(nested.is_dir());
    }
}
