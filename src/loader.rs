use std::sync::Arc;

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
  cache::FeedCache,
  feed::{FeedSource, Normalizer, Post, RawFeedItem},
  shuffle::shuffle,
  util::{Error, Result, now_millis},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOrigin {
  Fetched,
  Cache,
  StaleCache,
  Nothing,
}

/// Result of one load: the posts to present (already shuffled) and the
/// error to show next to them, if any.
#[derive(Debug, Clone, Serialize)]
pub struct LoadOutcome {
  pub posts: Vec<Post>,
  pub error: Option<String>,
  pub origin: LoadOrigin,
  /// When the presented items were fetched from the network. `None` when
  /// nothing could be presented.
  pub fetched_at_ms: Option<i64>,
}

/// Cancellation for a single load. Dropping the future or calling
/// `abort` on the handle stops the load before it touches the cache.
pub struct LoadSignal {
  handle: AbortHandle,
  registration: AbortRegistration,
}

impl LoadSignal {
  pub fn new() -> Self {
    let (handle, registration) = AbortHandle::new_pair();
    Self {
      handle,
      registration,
    }
  }

  pub fn handle(&self) -> AbortHandle {
    self.handle.clone()
  }
}

impl Default for LoadSignal {
  fn default() -> Self {
    Self::new()
  }
}

pub struct Loader {
  source: Arc<dyn FeedSource + Send + Sync>,
  cache: FeedCache,
  normalizer: Arc<Normalizer>,
}

impl Loader {
  pub fn new(
    source: Arc<dyn FeedSource + Send + Sync>,
    cache: FeedCache,
    normalizer: Arc<Normalizer>,
  ) -> Self {
    Self {
      source,
      cache,
      normalizer,
    }
  }

  /// Serves a fresh cache without touching the network unless `force`
  /// is set. A failed fetch falls back to any cached record, however old.
  pub async fn load(&self, force: bool, signal: LoadSignal) -> Result<LoadOutcome> {
    let LoadSignal {
      handle,
      registration,
    } = signal;

    let cached = self.cache.read().unwrap_or_else(|e| {
      warn!("failed to read feed cache: {e}");
      None
    });

    if let Some(record) = &cached {
      if !force && self.cache.is_fresh(record, now_millis()) {
        info!("serving {} posts from fresh cache", record.items.len());
        return Ok(self.present(
          record.items.clone(),
          record.fetched_at_ms,
          None,
          LoadOrigin::Cache,
        ));
      }
    }

    let fetched = Abortable::new(self.source.fetch_feed(), registration)
      .await
      .map_err(|_| Error::Cancelled)?;

    if handle.is_aborted() {
      return Err(Error::Cancelled);
    }

    match fetched {
      Ok(items) => {
        info!("fetched {} feed items", items.len());
        let fetched_at_ms = now_millis();
        if let Err(e) = self.cache.write(&items, fetched_at_ms) {
          warn!("failed to write feed cache: {e}");
        }
        Ok(self.present(items, fetched_at_ms, None, LoadOrigin::Fetched))
      }
      Err(e) => {
        let message = e.display_message();
        match cached {
          Some(record) => {
            warn!(
              "feed fetch failed, serving {} cached posts: {e}",
              record.items.len()
            );
            Ok(self.present(
              record.items,
              record.fetched_at_ms,
              Some(message),
              LoadOrigin::StaleCache,
            ))
          }
          None => {
            warn!("feed fetch failed with nothing cached: {e}");
            Ok(LoadOutcome {
              posts: Vec::new(),
              error: Some(message),
              origin: LoadOrigin::Nothing,
              fetched_at_ms: None,
            })
          }
        }
      }
    }
  }

  fn present(
    &self,
    items: Vec<RawFeedItem>,
    fetched_at_ms: i64,
    error: Option<String>,
    origin: LoadOrigin,
  ) -> LoadOutcome {
    let posts = self.normalizer.normalize(items);
    let posts = shuffle(posts, &mut rand::rng());
    LoadOutcome {
      posts,
      error,
      origin,
      fetched_at_ms: Some(fetched_at_ms),
    }
  }
}
