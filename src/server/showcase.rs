use std::{
  sync::{Arc, Mutex as StdMutex},
  time::Duration,
};

use futures::future::AbortHandle;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::{
  carousel::{AutoAdvance, Carousel},
  feed::Post,
  loader::{LoadOutcome, LoadSignal, Loader},
  util::{Error, Result, now_millis},
};

/// Loaded posts plus the featured carousel that rotates through them.
#[derive(Clone)]
pub struct Showcase {
  inner: Arc<Inner>,
}

struct Inner {
  loader: Loader,
  placeholder_thumbnail: String,
  auto_advance: Duration,
  stale_after: Duration,
  snapshot: RwLock<Option<Arc<Snapshot>>>,
  featured: RwLock<Featured>,
  // one load at a time
  load_lock: Arc<Mutex<()>>,
  in_flight: StdMutex<Option<AbortHandle>>,
}

pub struct Snapshot {
  pub outcome: LoadOutcome,
}

struct Featured {
  carousel: Arc<RwLock<Carousel>>,
  ticker: Option<AutoAdvance>,
}

#[derive(Debug, Serialize)]
pub struct FeaturedState {
  pub index: usize,
  pub len: usize,
  pub paused: bool,
  pub post: Option<Post>,
}

impl Showcase {
  pub fn new(
    loader: Loader,
    placeholder_thumbnail: String,
    auto_advance: Duration,
    stale_after: Duration,
  ) -> Self {
    let featured = Featured {
      carousel: Arc::new(RwLock::new(Carousel::new(0))),
      ticker: None,
    };
    let inner = Inner {
      loader,
      placeholder_thumbnail,
      auto_advance,
      stale_after,
      snapshot: RwLock::new(None),
      featured: RwLock::new(featured),
      load_lock: Arc::new(Mutex::new(())),
      in_flight: StdMutex::new(None),
    };

    Self {
      inner: Arc::new(inner),
    }
  }

  pub fn placeholder_thumbnail(&self) -> &str {
    &self.inner.placeholder_thumbnail
  }

  pub async fn snapshot(&self) -> Option<Arc<Snapshot>> {
    self.inner.snapshot.read().await.clone()
  }

  /// Runs one load and, unless it was aborted meanwhile, replaces the
  /// presented posts.
  pub async fn reload(&self, force: bool) -> Result<()> {
    let _serial = self.inner.load_lock.lock().await;
    self.load_and_install(force).await
  }

  async fn load_and_install(&self, force: bool) -> Result<()> {
    let signal = LoadSignal::new();
    let handle = signal.handle();
    self.set_in_flight(Some(handle.clone()));
    let result = self.inner.loader.load(force, signal).await;
    self.set_in_flight(None);

    let outcome = result?;
    if handle.is_aborted() {
      return Err(Error::Cancelled);
    }

    info!(
      "presenting {} posts ({:?})",
      outcome.posts.len(),
      outcome.origin
    );
    self.install(outcome).await;
    Ok(())
  }

  /// Starts a background reload when nothing has been loaded, the last
  /// load reported an error, or the presented items were fetched longer
  /// than the cache TTL ago. No-op while another load is running.
  pub async fn refresh_if_stale(&self) {
    let stale = match self.snapshot().await {
      None => true,
      Some(snapshot) => self.is_stale(&snapshot.outcome, now_millis()),
    };
    if !stale {
      return;
    }

    let Ok(serial) = self.inner.load_lock.clone().try_lock_owned() else {
      return;
    };
    let this = self.clone();
    tokio::spawn(async move {
      let _serial = serial;
      log_load_result(this.load_and_install(false).await);
    });
  }

  fn is_stale(&self, outcome: &LoadOutcome, now_ms: i64) -> bool {
    if outcome.error.is_some() {
      return true;
    }
    let Some(fetched_at_ms) = outcome.fetched_at_ms else {
      return true;
    };
    let ttl_ms =
      i64::try_from(self.inner.stale_after.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_sub(fetched_at_ms) >= ttl_ms
  }

  pub fn spawn_reload(&self, force: bool) {
    let this = self.clone();
    tokio::spawn(async move {
      log_load_result(this.reload(force).await);
    });
  }

  pub fn abort_in_flight(&self) {
    if let Ok(in_flight) = self.inner.in_flight.lock() {
      if let Some(handle) = in_flight.as_ref() {
        info!("aborting in-flight feed load");
        handle.abort();
      }
    }
  }

  fn set_in_flight(&self, handle: Option<AbortHandle>) {
    if let Ok(mut in_flight) = self.inner.in_flight.lock() {
      *in_flight = handle;
    }
  }

  async fn install(&self, outcome: LoadOutcome) {
    let len = outcome.posts.len();
    let snapshot = Snapshot { outcome };
    *self.inner.snapshot.write().await = Some(Arc::new(snapshot));

    // the ticker restarts whenever the collection is replaced
    let carousel = Arc::new(RwLock::new(Carousel::new(len)));
    let mut featured = self.inner.featured.write().await;
    let was_paused = featured.ticker.as_ref().is_some_and(|t| t.is_paused());
    let ticker = AutoAdvance::spawn(carousel.clone(), self.inner.auto_advance);
    if was_paused {
      ticker.pause();
    }
    *featured = Featured {
      carousel,
      ticker: Some(ticker),
    };
  }

  pub async fn featured(&self) -> FeaturedState {
    let featured = self.inner.featured.read().await;
    let carousel = *featured.carousel.read().await;
    let paused = featured.ticker.as_ref().is_some_and(|t| t.is_paused());
    drop(featured);

    let post = match self.snapshot().await {
      Some(snapshot) if !carousel.is_empty() => {
        snapshot.outcome.posts.get(carousel.index()).cloned()
      }
      _ => None,
    };

    FeaturedState {
      index: carousel.index(),
      len: carousel.len(),
      paused,
      post,
    }
  }

  pub async fn set_featured_paused(&self, paused: bool) {
    let featured = self.inner.featured.read().await;
    if let Some(ticker) = &featured.ticker {
      if paused {
        ticker.pause();
      } else {
        ticker.resume();
      }
    }
  }
}

fn log_load_result(result: Result<()>) {
  match result {
    Ok(()) => {}
    Err(Error::Cancelled) => info!("feed load cancelled"),
    Err(e) => warn!("feed load failed: {e}"),
  }
}

#[cfg(test)]
pub(super) mod test {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::{
    cache::FeedCache,
    client::ClientConfig,
    feed::{FeedClient, FeedSource, Normalizer, RawFeedItem},
    store::{KvStore, MemoryStore},
  };

  const TTL: Duration = Duration::from_secs(12 * 3600);

  /// Fails the first `failures` fetches, then serves one item.
  struct FlakySource {
    failures: usize,
    delay: Duration,
    calls: AtomicUsize,
  }

  impl FlakySource {
    fn new(failures: usize, delay: Duration) -> Arc<Self> {
      Arc::new(Self {
        failures,
        delay,
        calls: AtomicUsize::new(0),
      })
    }

    fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  #[async_trait::async_trait]
  impl FeedSource for FlakySource {
    async fn fetch_feed(&self) -> Result<Vec<RawFeedItem>> {
      let call = self.calls.fetch_add(1, Ordering::SeqCst);
      tokio::time::sleep(self.delay).await;
      if call < self.failures {
        return Err(Error::Feed("transient".into()));
      }
      Ok(vec![RawFeedItem {
        guid: "fetched".into(),
        title: "Fetched".into(),
        ..Default::default()
      }])
    }
  }

  fn stub_showcase(
    source: Arc<FlakySource>,
    store: Arc<dyn KvStore>,
    ttl: Duration,
  ) -> Showcase {
    let normalizer = Arc::new(Normalizer::new("https://example.com/ph.png", vec![]));
    let loader = Loader::new(source, FeedCache::new(store, ttl), normalizer);
    Showcase::new(
      loader,
      "https://example.com/ph.png".into(),
      Duration::from_secs(6),
      ttl,
    )
  }

  async fn wait_for_guid(showcase: &Showcase, guid: &str) -> Arc<Snapshot> {
    for _ in 0..200 {
      if let Some(snapshot) = showcase.snapshot().await {
        if snapshot.outcome.posts.iter().any(|p| p.guid == guid) {
          return snapshot;
        }
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{guid} was never presented");
  }

  pub(crate) fn fixture_showcase(path: &str) -> Showcase {
    let client = ClientConfig::default().build().unwrap();
    let url = url::Url::parse(&format!("fixture://{path}")).unwrap();
    let source = Arc::new(FeedClient::from_url(url, client));
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let normalizer = Arc::new(Normalizer::new("https://example.com/ph.png", vec![]));
    let loader = Loader::new(source, FeedCache::new(store, TTL), normalizer);
    Showcase::new(
      loader,
      "https://example.com/ph.png".into(),
      Duration::from_secs(6),
      TTL,
    )
  }

  #[tokio::test]
  async fn test_reload_installs_snapshot() {
    let showcase = fixture_showcase("/rss2json/ok.json");
    assert!(showcase.snapshot().await.is_none());

    showcase.reload(false).await.unwrap();
    let snapshot = showcase.snapshot().await.unwrap();
    assert_eq!(snapshot.outcome.posts.len(), 5);

    let featured = showcase.featured().await;
    assert_eq!(featured.len, 5);
    assert_eq!(featured.index, 0);
    assert_eq!(
      featured.post.map(|p| p.guid),
      Some(snapshot.outcome.posts[0].guid.clone())
    );
  }

  #[tokio::test]
  async fn test_failed_reload_presents_error() {
    let showcase = fixture_showcase("/rss2json/error.json");
    showcase.reload(false).await.unwrap();

    let snapshot = showcase.snapshot().await.unwrap();
    assert!(snapshot.outcome.posts.is_empty());
    assert!(snapshot.outcome.error.as_deref().unwrap().starts_with("Error: "));
    assert!(showcase.featured().await.post.is_none());
  }

  #[tokio::test]
  async fn test_pause_survives_reload() {
    let showcase = fixture_showcase("/rss2json/ok.json");
    showcase.reload(false).await.unwrap();
    showcase.set_featured_paused(true).await;
    assert!(showcase.featured().await.paused);

    showcase.reload(true).await.unwrap();
    assert!(showcase.featured().await.paused);

    showcase.set_featured_paused(false).await;
    assert!(!showcase.featured().await.paused);
  }

  #[tokio::test]
  async fn test_error_snapshot_is_retried_on_next_refresh() {
    let source = FlakySource::new(1, Duration::ZERO);
    let showcase = stub_showcase(source.clone(), Arc::new(MemoryStore::new()), TTL);

    showcase.reload(false).await.unwrap();
    let snapshot = showcase.snapshot().await.unwrap();
    assert!(snapshot.outcome.posts.is_empty());
    assert!(snapshot.outcome.error.is_some());

    showcase.refresh_if_stale().await;
    let snapshot = wait_for_guid(&showcase, "fetched").await;
    assert!(snapshot.outcome.error.is_none());
    assert_eq!(source.calls(), 2);

    // a successful fetch stays fresh for the TTL
    showcase.refresh_if_stale().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.calls(), 2);
  }

  #[tokio::test]
  async fn test_cache_hit_ages_from_fetch_time() {
    let ttl = Duration::from_millis(1_000);
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let cached = RawFeedItem {
      guid: "cached".into(),
      ..Default::default()
    };
    FeedCache::new(store.clone(), ttl)
      .write(&[cached], now_millis() - 800)
      .unwrap();

    let source = FlakySource::new(0, Duration::ZERO);
    let showcase = stub_showcase(source.clone(), store, ttl);
    showcase.reload(false).await.unwrap();
    let snapshot = showcase.snapshot().await.unwrap();
    assert_eq!(snapshot.outcome.origin, crate::loader::LoadOrigin::Cache);
    assert_eq!(source.calls(), 0);

    tokio::time::sleep(Duration::from_millis(300)).await;
    showcase.refresh_if_stale().await;
    wait_for_guid(&showcase, "fetched").await;
    assert_eq!(source.calls(), 1);
  }

  #[tokio::test]
  async fn test_concurrent_refreshes_share_one_load() {
    let source = FlakySource::new(0, Duration::from_millis(100));
    let showcase = stub_showcase(source.clone(), Arc::new(MemoryStore::new()), TTL);

    for _ in 0..3 {
      showcase.refresh_if_stale().await;
    }
    wait_for_guid(&showcase, "fetched").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.calls(), 1);
  }
}
