use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Keyed record store the core persists through. Mirrors the host's
/// key/value storage: writes always succeed from the core's point of
/// view, reads of missing or unreadable records return `None` (a corrupt
/// record is skipped, never surfaced as live state).
pub trait RecordStore {
    fn put(&mut self, key: &str, value: &str);
    fn get(&self, key: &str) -> Option<String>;
    fn delete(&mut self, key: &str);
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

/// In-memory store for tests and hosts that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn put(&mut self, key: &str, value: &str) {
        self.records.insert(key.to_string(), value.to_string());
    }

    fn get(&self, key: &str) -> Option<String> {
        self.records.get(key).cloned()
    }

    fn delete(&mut self, key: &str) {
        self.records.remove(key);
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.records
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }
}

/// One JSON file per record under a base directory, write-through over an
/// in-memory map. I/O failures on write are stashed for the host to
/// inspect; reads fail closed.
#[derive(Debug)]
pub struct FileStore {
    base_dir: PathBuf,
    cache: BTreeMap<String, String>,
    last_error: Option<io::Error>,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at the given directory
    /// and loads every existing record into the cache. Unreadable files
    /// are skipped.
    pub fn open(base_dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&base_dir)?;
        let mut cache = BTreeMap::new();
        for entry in fs::read_dir(&base_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if let Ok(value) = fs::read_to_string(&path) {
                cache.insert(stem.to_string(), value);
            }
        }
        Ok(Self {
            base_dir,
            cache,
            last_error: None,
        })
    }

    /// Opens the default store under the user's home directory.
    pub fn open_default() -> io::Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine home directory",
            )
        })?;
        Self::open(home_dir.join(".deckforge").join("records"))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", key))
    }

    /// The last write error, if any, clearing it.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.last_error.take()
    }
}

impl RecordStore for FileStore {
    fn put(&mut self, key: &str, value: &str) {
        self.cache.insert(key.to_string(), value.to_string());
        if let Err(error) = fs::write(self.path_for(key), value) {
            self.last_error = Some(error);
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key).cloned()
    }

    fn delete(&mut self, key: &str) {
        self.cache.remove(key);
        if let Err(error) = fs::remove_file(self.path_for(key)) {
            if error.kind() != io::ErrorKind::NotFound {
                self.last_error = Some(error);
            }
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.cache
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        store.put("guid123", "{}");
        assert_eq!(store.get("guid123"), Some("{}".to_string()));
        store.delete("guid123");
        assert_eq!(store.get("guid123"), None);
    }

    #[test]
    fn test_keys_with_prefix() {
        let mut store = MemoryStore::new();
        store.put("guid-a", "1");
        store.put("guid-b", "2");
        store.put("questData-1", "3");

        let keys = store.keys_with_prefix("guid");
        assert_eq!(keys, vec!["guid-a".to_string(), "guid-b".to_string()]);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("deckforge-store-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        {
            let mut store = FileStore::open(dir.clone()).unwrap();
            store.put("crafter-0", r#"{"name":"Smith"}"#);
            assert!(store.take_error().is_none());
        }

        // Reopen and find the record on disk.
        let store = FileStore::open(dir.clone()).unwrap();
        assert_eq!(
            store.get("crafter-0"),
            Some(r#"{"name":"Smith"}"#.to_string())
        );
        assert_eq!(store.keys_with_prefix("crafter-"), vec!["crafter-0"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_store_delete_missing_is_quiet() {
        let dir = std::env::temp_dir().join(format!("deckforge-store-del-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let mut store = FileStore::open(dir.clone()).unwrap();
        store.delete("never-existed");
        assert!(store.take_error().is_none());

        fs::remove_dir_all(&dir).unwrap();
    }
}
