use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::html::{first_image_src, text_content};

use super::RawFeedItem;

/// The canonical post shape every view works with.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Post {
  pub title: String,
  pub pub_date: String,
  pub link: String,
  pub guid: String,
  pub author: String,
  pub thumbnail: String,
  /// Plain-text excerpt.
  pub description: String,
  /// Raw HTML body, sanitized only when rendered.
  pub content: String,
  pub categories: Vec<String>,
}

pub struct Normalizer {
  placeholder_thumbnail: String,
  trailing_markers: Vec<String>,
}

impl Normalizer {
  pub fn new(
    placeholder_thumbnail: impl Into<String>,
    trailing_markers: Vec<String>,
  ) -> Self {
    Self {
      placeholder_thumbnail: placeholder_thumbnail.into(),
      trailing_markers,
    }
  }

  pub fn placeholder_thumbnail(&self) -> &str {
    &self.placeholder_thumbnail
  }

  pub fn normalize(&self, raw_items: Vec<RawFeedItem>) -> Vec<Post> {
    raw_items
      .into_iter()
      .map(|item| self.normalize_item(item))
      .collect()
  }

  fn normalize_item(&self, item: RawFeedItem) -> Post {
    let RawFeedItem {
      title,
      pub_date,
      link,
      guid,
      author,
      thumbnail,
      description,
      content,
      categories,
    } = item;

    let parsed = Html::parse_fragment(&description);
    let thumbnail = first_image_src(&parsed)
      .or_else(|| Some(thumbnail.trim().to_owned()).filter(|t| !t.is_empty()))
      .unwrap_or_else(|| self.placeholder_thumbnail.clone());
    let description = self.clean_description(&text_content(&parsed));

    Post {
      title,
      pub_date,
      link,
      guid,
      author,
      thumbnail,
      description,
      content,
      categories,
    }
  }

  /// Drops trailing markers (repeatedly, in any order) and surrounding
  /// whitespace. A marker quoted mid-text is kept.
  fn clean_description(&self, text: &str) -> String {
    let mut text = text.trim();
    while let Some(rest) = self.strip_marker(text) {
      text = rest.trim_end();
    }
    text.trim_start().to_owned()
  }

  fn strip_marker<'a>(&self, text: &'a str) -> Option<&'a str> {
    self
      .trailing_markers
      .iter()
      .filter(|marker| !marker.is_empty())
      .find_map(|marker| text.strip_suffix(marker.as_str()))
  }
}
