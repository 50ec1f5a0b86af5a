mod date;

pub use date::{format_date, parse_date};

pub const USER_AGENT: &str =
  concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("YAML parse error")]
  Yaml(#[from] serde_yaml::Error),

  #[error("Invalid URL {0}")]
  InvalidUrl(#[from] url::ParseError),

  #[error("{0}")]
  Message(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("IO error")]
  Io(#[from] std::io::Error),

  #[error("Network error: {0}")]
  Network(#[from] reqwest::Error),

  #[error("HTTP status error {0} (url: {1})")]
  HttpStatus(reqwest::StatusCode, url::Url),

  #[error("Feed service reported failure: {0}")]
  Feed(String),

  #[error("Unexpected feed payload: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("Config error {0:?}")]
  Config(#[from] ConfigError),

  #[error("Load cancelled")]
  Cancelled,

  #[error("{0}")]
  Message(String),
}

impl Error {
  /// The message shown to readers in place of the post list.
  pub fn display_message(&self) -> String {
    format!("Error: {self}")
  }
}

/// Wall clock in epoch milliseconds.
pub fn now_millis() -> i64 {
  chrono::Utc::now().timestamp_millis()
}
