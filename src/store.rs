use std::{
  collections::BTreeMap,
  path::PathBuf,
  sync::Mutex,
};

use tracing::warn;

use crate::util::{Error, Result};

/// String key-value storage that survives between loads.
pub trait KvStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>>;
  fn set(&self, key: &str, value: String) -> Result<()>;
  fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryStore {
  map: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn poisoned() -> Error {
  Error::Message("store lock poisoned".into())
}

impl KvStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let map = self.map.lock().map_err(|_| poisoned())?;
    Ok(map.get(key).cloned())
  }

  fn set(&self, key: &str, value: String) -> Result<()> {
    let mut map = self.map.lock().map_err(|_| poisoned())?;
    map.insert(key.to_owned(), value);
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let mut map = self.map.lock().map_err(|_| poisoned())?;
    map.remove(key);
    Ok(())
  }
}

/// All keys live in one JSON object on disk. Every write rewrites the
/// whole file through a temporary sibling.
pub struct FileStore {
  path: PathBuf,
  lock: Mutex<()>,
}

impl FileStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      lock: Mutex::new(()),
    }
  }

  fn read_map(&self) -> Result<BTreeMap<String, String>> {
    let content = match std::fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        return Ok(BTreeMap::new());
      }
      Err(e) => return Err(e.into()),
    };

    match serde_json::from_str(&content) {
      Ok(map) => Ok(map),
      Err(e) => {
        warn!("ignoring unreadable store {}: {e}", self.path.display());
        Ok(BTreeMap::new())
      }
    }
  }

  fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }

    let tmp = self.path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_vec(map)?)?;
    std::fs::rename(&tmp, &self.path)?;
    Ok(())
  }
}

impl KvStore for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let _guard = self.lock.lock().map_err(|_| poisoned())?;
    Ok(self.read_map()?.remove(key))
  }

  fn set(&self, key: &str, value: String) -> Result<()> {
    let _guard = self.lock.lock().map_err(|_| poisoned())?;
    let mut map = self.read_map()?;
    map.insert(key.to_owned(), value);
    self.write_map(&map)
  }

  fn remove(&self, key: &str) -> Result<()> {
    let _guard = self.lock.lock().map_err(|_| poisoned())?;
    let mut map = self.read_map()?;
    if map.remove(key).is_some() {
      self.write_map(&map)?;
    }
    Ok(())
  }
}
