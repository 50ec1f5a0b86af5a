use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
  cache::FeedCache,
  client::ClientConfig,
  feed::{FeedClient, Normalizer},
  loader::Loader,
  store::{FileStore, KvStore, MemoryStore},
  util::{ConfigError, Result},
};

const DEFAULT_ENDPOINT: &str = "https://api.rss2json.com/v1/api.json";
const DEFAULT_RSS_URL: &str = "https://medium.com/feed/@northlight-agency";
const DEFAULT_PLACEHOLDER: &str =
  "https://placehold.co/600x400?text=Northlight+Blog";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct AppConfig {
  pub feed: FeedConfig,
  pub cache: CacheConfig,
  pub carousel: CarouselConfig,
  pub client: ClientConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct FeedConfig {
  /// The RSS-to-JSON proxy
  pub endpoint: Url,
  /// The upstream RSS feed handed to the proxy
  pub rss_url: String,
  /// Shown when a post has no image of its own
  pub placeholder_thumbnail: String,
  /// Literal strings removed from post excerpts
  pub trailing_markers: Vec<String>,
}

impl Default for FeedConfig {
  fn default() -> Self {
    Self {
      endpoint: Url::parse(DEFAULT_ENDPOINT).expect("valid default endpoint"),
      rss_url: DEFAULT_RSS_URL.into(),
      placeholder_thumbnail: DEFAULT_PLACEHOLDER.into(),
      trailing_markers: vec![
        "Continue reading on Medium Â»".into(),
        "Continue reading on Medium »".into(),
      ],
    }
  }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct CacheConfig {
  /// Where the cached feed is persisted. `null` keeps it in memory.
  pub path: Option<PathBuf>,
  #[serde(deserialize_with = "duration_str::deserialize_duration")]
  pub ttl: Duration,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      path: Some(PathBuf::from("blog-cache.json")),
      ttl: Duration::from_secs(12 * 3600),
    }
  }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct CarouselConfig {
  /// Period of the featured carousel
  #[serde(deserialize_with = "duration_str::deserialize_duration")]
  pub auto_advance: Duration,
}

impl Default for CarouselConfig {
  fn default() -> Self {
    Self {
      auto_advance: Duration::from_secs(6),
    }
  }
}

impl AppConfig {
  pub fn load_from_file(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)?;
    // an empty file means all defaults
    if content.trim().is_empty() {
      return Ok(Self::default());
    }

    let config = serde_yaml::from_str(&content).map_err(ConfigError::from)?;
    Ok(config)
  }

  /// Loads `path` when given, defaults otherwise.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    match path {
      Some(path) => Self::load_from_file(path),
      None => Ok(Self::default()),
    }
  }

  pub fn normalizer(&self) -> Normalizer {
    Normalizer::new(
      self.feed.placeholder_thumbnail.clone(),
      self.feed.trailing_markers.clone(),
    )
  }

  pub fn store(&self) -> Arc<dyn KvStore> {
    match &self.cache.path {
      Some(path) => Arc::new(FileStore::new(path)),
      None => Arc::new(MemoryStore::new()),
    }
  }

  pub fn build_loader(&self) -> Result<Loader> {
    let client = self.client.build()?;
    let source = FeedClient::new(&self.feed.endpoint, &self.feed.rss_url, client);
    let cache = FeedCache::new(self.store(), self.cache.ttl);
    Ok(Loader::new(
      Arc::new(source),
      cache,
      Arc::new(self.normalizer()),
    ))
  }
}
