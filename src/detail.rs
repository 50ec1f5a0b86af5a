use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::{feed::Post, html::sanitize_html, readability::Readability};

pub const MAX_RELATED: usize = 3;

/// Time the closing animation runs before the modal is gone.
pub const CLOSE_TRANSITION: Duration = Duration::from_millis(300);

/// Everything the detail view shows for one selected post.
#[derive(Debug, Serialize)]
pub struct DetailView<'a> {
  pub post: &'a Post,
  pub content_html: String,
  pub readability: Readability,
  pub related: Vec<&'a Post>,
}

impl<'a> DetailView<'a> {
  pub fn new(post: &'a Post, all: &'a [Post]) -> Self {
    Self {
      post,
      content_html: sanitize_html(&post.content),
      readability: Readability::of_html(&post.content),
      related: related_posts(post, all),
    }
  }
}

/// Posts sharing at least one category with `selected`, in collection
/// order, never `selected` itself.
pub fn related_posts<'a>(selected: &Post, all: &'a [Post]) -> Vec<&'a Post> {
  all
    .iter()
    .filter(|post| post.guid != selected.guid)
    .filter(|post| {
      post
        .categories
        .iter()
        .any(|c| selected.categories.contains(c))
    })
    .take(MAX_RELATED)
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
  Open,
  Closing { since: Instant },
  Closed,
}

/// Lifecycle of the detail modal: related-post navigation keeps it open,
/// closing blocks interaction until the transition has elapsed.
#[derive(Debug)]
pub struct DetailModal {
  subject: Post,
  scroll_top: u32,
  state: ModalState,
}

impl DetailModal {
  pub fn open(subject: Post) -> Self {
    Self {
      subject,
      scroll_top: 0,
      state: ModalState::Open,
    }
  }

  pub fn subject(&self) -> &Post {
    &self.subject
  }

  pub fn scroll_top(&self) -> u32 {
    self.scroll_top
  }

  pub fn scroll_to(&mut self, offset: u32) {
    if self.is_interactive() {
      self.scroll_top = offset;
    }
  }

  pub fn is_interactive(&self) -> bool {
    self.state == ModalState::Open
  }

  /// Replaces the subject in place; ignored while closing.
  pub fn select_related(&mut self, post: Post) -> bool {
    if !self.is_interactive() {
      return false;
    }
    self.subject = post;
    self.scroll_top = 0;
    true
  }

  pub fn close(&mut self, now: Instant) {
    if self.state == ModalState::Open {
      self.state = ModalState::Closing { since: now };
    }
  }

  /// Returns the state after accounting for elapsed transition time.
  pub fn poll(&mut self, now: Instant) -> ModalState {
    if let ModalState::Closing { since } = self.state {
      if now.saturating_duration_since(since) >= CLOSE_TRANSITION {
        self.state = ModalState::Closed;
      }
    }
    self.state
  }
}
