use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{feed::RawFeedItem, store::KvStore, util::Result};

pub const ITEMS_KEY: &str = "blogPosts";
pub const TIME_KEY: &str = "blogPostsTime";
pub const VERSION_KEY: &str = "blogPostsVersion";

/// Bumped whenever the stored item shape changes. Records written under
/// another version are ignored.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
  pub schema_version: u32,
  pub fetched_at_ms: i64,
  pub items: Vec<RawFeedItem>,
}

/// Raw feed items persisted with the time they were fetched.
#[derive(Clone)]
pub struct FeedCache {
  store: Arc<dyn KvStore>,
  ttl: Duration,
}

impl FeedCache {
  pub fn new(store: Arc<dyn KvStore>, ttl: Duration) -> Self {
    Self { store, ttl }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  pub fn read(&self) -> Result<Option<CacheRecord>> {
    let Some(version) = self.store.get(VERSION_KEY)? else {
      if self.store.get(ITEMS_KEY)?.is_some() {
        debug!("discarding unversioned feed cache");
      }
      return Ok(None);
    };

    let Ok(schema_version) = version.parse::<u32>() else {
      warn!("feed cache has invalid version {version:?}");
      return Ok(None);
    };
    if schema_version != SCHEMA_VERSION {
      debug!("discarding feed cache of schema version {schema_version}");
      return Ok(None);
    }

    let (Some(items), Some(time)) =
      (self.store.get(ITEMS_KEY)?, self.store.get(TIME_KEY)?)
    else {
      return Ok(None);
    };

    let Ok(fetched_at_ms) = time.parse::<i64>() else {
      warn!("feed cache has invalid timestamp {time:?}");
      return Ok(None);
    };

    let items: Vec<RawFeedItem> = match serde_json::from_str(&items) {
      Ok(items) => items,
      Err(e) => {
        warn!("feed cache has unreadable items: {e}");
        return Ok(None);
      }
    };

    Ok(Some(CacheRecord {
      schema_version,
      fetched_at_ms,
      items,
    }))
  }

  pub fn write(&self, items: &[RawFeedItem], fetched_at_ms: i64) -> Result<()> {
    self.store.set(ITEMS_KEY, serde_json::to_string(items)?)?;
    self.store.set(TIME_KEY, fetched_at_ms.to_string())?;
    self.store.set(VERSION_KEY, SCHEMA_VERSION.to_string())?;
    debug!("cached {} feed items", items.len());
    Ok(())
  }

  /// Fresh while strictly younger than the TTL.
  pub fn is_fresh(&self, record: &CacheRecord, now_ms: i64) -> bool {
    let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_sub(record.fetched_at_ms) < ttl_ms
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::store::MemoryStore;

  const TTL: Duration = Duration::from_secs(12 * 3600);

  fn cache() -> (Arc<MemoryStore>, FeedCache) {
    let store = Arc::new(MemoryStore::new());
    let cache = FeedCache::new(store.clone(), TTL);
    (store, cache)
  }

  fn items(n: usize) -> Vec<RawFeedItem> {
    (0..n)
      .map(|i| RawFeedItem {
        guid: format!("guid-{i}"),
        title: format!("Post {i}"),
        ..Default::default()
      })
      .collect()
  }

  #[test]
  fn test_read_empty() {
    let (_, cache) = cache();
    assert_eq!(cache.read().unwrap(), None);
  }

  #[test]
  fn test_write_then_read() {
    let (store, cache) = cache();
    cache.write(&items(3), 1_000).unwrap();

    let record = cache.read().unwrap().unwrap();
    assert_eq!(record.items, items(3));
    assert_eq!(record.fetched_at_ms, 1_000);
    assert_eq!(record.schema_version, SCHEMA_VERSION);
    assert_eq!(store.get(TIME_KEY).unwrap().as_deref(), Some("1000"));
  }

  #[test]
  fn test_freshness_boundary_is_exclusive() {
    let (_, cache) = cache();
    let ttl_ms = TTL.as_millis() as i64;
    let record = CacheRecord {
      schema_version: SCHEMA_VERSION,
      fetched_at_ms: 10_000,
      items: vec![],
    };

    assert!(!cache.is_fresh(&record, 10_000 + ttl_ms));
    assert!(cache.is_fresh(&record, 10_000 + ttl_ms - 1));
    assert!(cache.is_fresh(&record, 10_000));
  }

  #[test]
  fn test_version_mismatch_is_rejected() {
    let (store, cache) = cache();
    cache.write(&items(2), 1_000).unwrap();

    store.set(VERSION_KEY, "0".into()).unwrap();
    assert_eq!(cache.read().unwrap(), None);

    store.remove(VERSION_KEY).unwrap();
    assert_eq!(cache.read().unwrap(), None);
  }

  #[test]
  fn test_corrupt_values_are_absent() {
    let (store, cache) = cache();
    cache.write(&items(1), 1_000).unwrap();

    store.set(TIME_KEY, "yesterday".into()).unwrap();
    assert_eq!(cache.read().unwrap(), None);

    store.set(TIME_KEY, "1000".into()).unwrap();
    store.set(ITEMS_KEY, "{not json".into()).unwrap();
    assert_eq!(cache.read().unwrap(), None);
  }
}
