mod auto_advance;

use serde::Serialize;

pub use auto_advance::AutoAdvance;

/// Single-item-visible slideshow state. Every navigation is a no-op on an
/// empty collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Carousel {
  index: usize,
  len: usize,
}

impl Carousel {
  pub fn new(len: usize) -> Self {
    Self { index: 0, len }
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn is_active(&self, i: usize) -> bool {
    !self.is_empty() && i == self.index
  }

  pub fn next(&mut self) {
    if self.is_empty() {
      return;
    }
    self.index = (self.index + 1) % self.len;
  }

  pub fn prev(&mut self) {
    if self.is_empty() {
      return;
    }
    self.index = (self.index + self.len - 1) % self.len;
  }

  /// Returns whether `i` was in range.
  pub fn jump(&mut self, i: usize) -> bool {
    if i >= self.len {
      return false;
    }
    self.index = i;
    true
  }

  pub fn next_index(&self) -> usize {
    let mut next = *self;
    next.next();
    next.index
  }

  pub fn prev_index(&self) -> usize {
    let mut prev = *self;
    prev.prev();
    prev.index
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_next_cycles_back() {
    for n in 1..8 {
      for start in 0..n {
        let mut carousel = Carousel::new(n);
        assert!(carousel.jump(start));
        for _ in 0..n {
          carousel.next();
        }
        assert_eq!(carousel.index(), start);
      }
    }
  }

  #[test]
  fn test_prev_inverts_next() {
    let mut carousel = Carousel::new(5);
    for start in 0..5 {
      carousel.jump(start);
      carousel.next();
      carousel.prev();
      assert_eq!(carousel.index(), start);
      carousel.prev();
      carousel.next();
      assert_eq!(carousel.index(), start);
    }

    let mut carousel = Carousel::new(3);
    carousel.prev();
    assert_eq!(carousel.index(), 2);
  }

  #[test]
  fn test_empty_is_inert() {
    let mut carousel = Carousel::new(0);
    carousel.next();
    carousel.prev();
    assert!(!carousel.jump(0));
    assert!(!carousel.jump(3));
    assert_eq!(carousel, Carousel::new(0));
    assert!(!carousel.is_active(0));
  }

  #[test]
  fn test_jump_out_of_range_keeps_index() {
    let mut carousel = Carousel::new(4);
    carousel.jump(2);
    assert!(!carousel.jump(4));
    assert_eq!(carousel.index(), 2);
  }

  #[test]
  fn test_exactly_one_active() {
    let mut carousel = Carousel::new(6);
    carousel.jump(3);
    let active: Vec<_> = (0..6).filter(|&i| carousel.is_active(i)).collect();
    assert_eq!(active, vec![3]);
    assert_eq!(carousel.next_index(), 4);
    assert_eq!(carousel.prev_index(), 2);
    assert_eq!(carousel.index(), 3);
  }
}
