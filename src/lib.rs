pub mod cache;
pub mod carousel;
pub mod cli;
pub mod client;
pub mod config;
pub mod detail;
pub mod feed;
pub mod html;
pub mod loader;
pub mod readability;
pub mod server;
pub mod shuffle;
pub mod store;
pub mod util;

pub use util::{ConfigError, Error, Result};
