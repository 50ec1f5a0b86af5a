mod norm;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;
use url::Url;

use crate::client::Client;
use crate::util::{Error, Result};

pub use norm::{Normalizer, Post};

/// A feed record as delivered by the RSS-to-JSON proxy. Every field may
/// be missing on the wire.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RawFeedItem {
  #[serde(deserialize_with = "null_as_default")]
  pub title: String,
  #[serde(deserialize_with = "null_as_default")]
  pub pub_date: String,
  #[serde(deserialize_with = "null_as_default")]
  pub link: String,
  #[serde(deserialize_with = "null_as_default")]
  pub guid: String,
  #[serde(deserialize_with = "null_as_default")]
  pub author: String,
  #[serde(deserialize_with = "null_as_default")]
  pub thumbnail: String,
  #[serde(deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(deserialize_with = "null_as_default")]
  pub content: String,
  #[serde(deserialize_with = "null_as_default")]
  pub categories: Vec<String>,
}

// the proxy sends `null` for some absent fields
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize, Debug)]
struct FeedResponse {
  status: String,
  #[serde(default)]
  message: Option<String>,
  #[serde(default)]
  items: Vec<RawFeedItem>,
}

const STATUS_OK: &str = "ok";

#[async_trait::async_trait]
pub trait FeedSource {
  async fn fetch_feed(&self) -> Result<Vec<RawFeedItem>>;
}

/// Single-attempt client for the RSS-to-JSON proxy.
pub struct FeedClient {
  url: Url,
  client: Client,
}

impl FeedClient {
  pub fn new(endpoint: &Url, rss_url: &str, client: Client) -> Self {
    let mut url = endpoint.clone();
    url.query_pairs_mut().append_pair("rss_url", rss_url);
    Self { url, client }
  }

  #[cfg(test)]
  pub(crate) fn from_url(url: Url, client: Client) -> Self {
    Self { url, client }
  }

  pub fn url(&self) -> &Url {
    &self.url
  }
}

#[async_trait::async_trait]
impl FeedSource for FeedClient {
  async fn fetch_feed(&self) -> Result<Vec<RawFeedItem>> {
    let resp = self.client.get(&self.url).await?.error_for_status()?;
    debug!("feed responded {} ({} bytes)", resp.status(), resp.body_len());

    parse_feed_response(&resp.text())
  }
}

fn parse_feed_response(body: &str) -> Result<Vec<RawFeedItem>> {
  let response: FeedResponse = serde_json::from_str(body)?;
  if response.status != STATUS_OK {
    let message = response
      .message
      .unwrap_or_else(|| format!("status {}", response.status));
    return Err(Error::Feed(message));
  }

  Ok(response.items)
}
