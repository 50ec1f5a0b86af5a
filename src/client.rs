mod response;

use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::util::Result;

pub use self::response::Response;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientConfig {
  user_agent: Option<String>,
  accept: Option<String>,
  referer: Option<String>,
  #[serde(default = "default_timeout")]
  #[serde(deserialize_with = "duration_str::deserialize_duration")]
  timeout: Duration,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      user_agent: None,
      accept: None,
      referer: None,
      timeout: default_timeout(),
    }
  }
}

impl ClientConfig {
  fn to_builder(&self) -> Result<reqwest::ClientBuilder> {
    let mut builder = reqwest::Client::builder();

    if let Some(user_agent) = &self.user_agent {
      builder = builder.user_agent(user_agent);
    } else {
      builder = builder.user_agent(crate::util::USER_AGENT);
    }

    let mut header_map = HeaderMap::new();
    if let Some(accept) = &self.accept {
      header_map.append("Accept", header_value("Accept", accept)?);
    }

    if let Some(referer) = &self.referer {
      header_map.append("Referer", header_value("Referer", referer)?);
    }

    if !header_map.is_empty() {
      builder = builder.default_headers(header_map);
    }

    builder = builder.timeout(self.timeout);

    Ok(builder)
  }

  pub fn build(&self) -> Result<Client> {
    let reqwest_client = self.to_builder()?.build()?;
    Ok(Client::new(reqwest_client))
  }
}

fn header_value(
  name: &str,
  value: &str,
) -> Result<reqwest::header::HeaderValue> {
  value.try_into().map_err(|_| {
    crate::util::ConfigError::Message(format!("invalid {name} header value"))
      .into()
  })
}

pub struct Client {
  client: reqwest::Client,
}

impl Client {
  fn new(client: reqwest::Client) -> Self {
    Self { client }
  }

  pub async fn get(&self, url: &Url) -> Result<Response> {
    #[cfg(test)]
    {
      if url.scheme() == "fixture" {
        return Ok(Response::from_fixture(url));
      }
    }

    let resp = self.client.get(url.clone()).send().await?;
    Response::read(resp).await
  }
}

fn default_timeout() -> Duration {
  Duration::from_secs(10)
}
