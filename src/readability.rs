use regex::Regex;
use serde::Serialize;

use crate::html::strip_tags;

/// Below this many words the score is not meaningful.
const MIN_WORDS: usize = 10;

lazy_static::lazy_static! {
  static ref WORD: Regex = Regex::new(r"\b\w+\b").expect("bad regex");
  static ref SENTENCE_END: Regex = Regex::new(r"[.!?]+").expect("bad regex");
  static ref SILENT_SUFFIX: Regex =
    Regex::new(r"(?:[^laeiouy]es|ed|[^laeiouy]e)$").expect("bad regex");
  static ref LEADING_Y: Regex = Regex::new(r"^y").expect("bad regex");
  static ref VOWEL_GROUP: Regex = Regex::new(r"[aeiouy]{1,2}").expect("bad regex");
}

/// Flesch Reading Ease of a text, rounded and clamped to 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Readability {
  pub score: u8,
  pub label: &'static str,
}

impl Readability {
  pub const NOT_APPLICABLE: Self = Self {
    score: 0,
    label: "N/A",
  };

  pub fn of_html(html: &str) -> Self {
    Self::of_text(&strip_tags(html))
  }

  pub fn of_text(text: &str) -> Self {
    let words: Vec<&str> = WORD.find_iter(text).map(|m| m.as_str()).collect();
    if words.len() < MIN_WORDS {
      return Self::NOT_APPLICABLE;
    }

    let sentences = SENTENCE_END.find_iter(text).count().max(1);
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();

    let words = words.len() as f64;
    let ease = 206.835
      - 1.015 * (words / sentences as f64)
      - 84.6 * (syllables as f64 / words);
    let score = ease.clamp(0.0, 100.0).round() as u8;

    Self {
      score,
      label: label_for(score),
    }
  }
}

fn label_for(score: u8) -> &'static str {
  match score {
    90.. => "Very Easy",
    70..=89 => "Easy",
    60..=69 => "Standard",
    50..=59 => "Fairly Difficult",
    30..=49 => "Difficult",
    _ => "Very Difficult",
  }
}

fn count_syllables(word: &str) -> usize {
  let word = word.to_lowercase();
  if word.chars().count() <= 3 {
    return 1;
  }

  let word = SILENT_SUFFIX.replace(&word, "");
  let word = LEADING_Y.replace(&word, "");
  VOWEL_GROUP.find_iter(&word).count().max(1)
}
