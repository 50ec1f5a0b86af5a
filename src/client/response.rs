use encoding_rs::{Encoding, UTF_8};
use mime::Mime;
use reqwest::{StatusCode, header::CONTENT_TYPE};
use url::Url;

use crate::util::{Error, Result};

/// A fully buffered proxy response. The body decodes with the charset named
/// in `Content-Type`, UTF-8 when there is none.
pub struct Response {
  url: Url,
  status: StatusCode,
  encoding: &'static Encoding,
  body: Vec<u8>,
}

impl Response {
  pub(super) async fn read(resp: reqwest::Response) -> Result<Self> {
    let url = resp.url().clone();
    let status = resp.status();
    let encoding = resp
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map_or(UTF_8, encoding_of);
    let body = resp.bytes().await?.to_vec();

    Ok(Self {
      url,
      status,
      encoding,
      body,
    })
  }

  // `fixture:///<path>` reads fixtures/<path>; a missing file answers 404.
  // `?content_type=` overrides the JSON default.
  #[cfg(test)]
  pub(super) fn from_fixture(url: &Url) -> Self {
    let path = format!("{}/fixtures/{}", env!("CARGO_MANIFEST_DIR"), url.path());
    let encoding = url
      .query_pairs()
      .find(|(k, _)| k == "content_type")
      .map_or(UTF_8, |(_, v)| encoding_of(&v));

    let (status, body) = match std::fs::read(path) {
      Ok(body) => (StatusCode::OK, body),
      Err(_) => (StatusCode::NOT_FOUND, Vec::new()),
    };

    Self {
      url: url.clone(),
      status,
      encoding,
      body,
    }
  }

  pub fn error_for_status(self) -> Result<Self> {
    if !self.status.is_success() {
      return Err(Error::HttpStatus(self.status, self.url));
    }
    Ok(self)
  }

  pub fn status(&self) -> StatusCode {
    self.status
  }

  pub fn body_len(&self) -> usize {
    self.body.len()
  }

  pub fn text(&self) -> String {
    let (text, _, _) = self.encoding.decode(&self.body);
    text.into_owned()
  }
}

fn encoding_of(content_type: &str) -> &'static Encoding {
  content_type
    .parse::<Mime>()
    .ok()
    .and_then(|mime| {
      let charset = mime.get_param(mime::CHARSET)?;
      Encoding::for_label(charset.as_str().as_bytes())
    })
    .unwrap_or(UTF_8)
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_encoding_from_content_type() {
    assert_eq!(encoding_of("application/json"), UTF_8);
    assert_eq!(
      encoding_of("application/json; charset=ISO-8859-1").name(),
      "windows-1252"
    );
    assert_eq!(encoding_of("not a mime"), UTF_8);
    assert_eq!(encoding_of("text/plain; charset=bogus"), UTF_8);
  }

  #[test]
  fn test_text_decodes_with_charset() {
    let resp = Response {
      url: Url::parse("https://proxy.example.com/").unwrap(),
      status: StatusCode::OK,
      encoding: encoding_of("application/json; charset=latin1"),
      body: b"{\"title\": \"caf\xe9\"}".to_vec(),
    };
    assert_eq!(resp.text(), "{\"title\": \"café\"}");
    assert_eq!(resp.body_len(), 17);
  }

  #[test]
  fn test_error_for_status_keeps_url() {
    let resp = Response {
      url: Url::parse("https://proxy.example.com/api.json").unwrap(),
      status: StatusCode::BAD_GATEWAY,
      encoding: UTF_8,
      body: Vec::new(),
    };
    let Err(Error::HttpStatus(status, url)) = resp.error_for_status() else {
      panic!("expected a status error");
    };
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(url.path(), "/api.json");
  }
}
