use std::path::PathBuf;

use clap::Parser;

use crate::{
  config::AppConfig,
  loader::LoadSignal,
  readability::Readability,
  server::ServerConfig,
  util::Result,
};

#[derive(Parser)]
#[clap(version, about)]
pub struct Cli {
  #[clap(subcommand)]
  subcmd: SubCommand,

  /// YAML config file; defaults apply when omitted
  #[clap(long, short, env = "BLOG_SHOWCASE_CONFIG")]
  config: Option<PathBuf>,
}

#[derive(Parser)]
enum SubCommand {
  /// Serve the blog carousel
  Server(ServerConfig),
  /// Load the feed once and print the posts as JSON
  Fetch(FetchConfig),
  /// Score the readability of a local HTML or text file
  Readability(ReadabilityConfig),
}

#[derive(Parser)]
struct FetchConfig {
  /// Ignore a fresh cache and hit the network
  #[clap(long, short)]
  force: bool,
  /// Limit the number of posts printed
  #[clap(long, short('n'))]
  limit_posts: Option<usize>,
  /// Print compact JSON instead of pretty-printing
  #[clap(long, short)]
  compact_output: bool,
}

#[derive(Parser)]
struct ReadabilityConfig {
  file: PathBuf,
}

impl Cli {
  pub async fn run(self) -> Result<()> {
    let config = AppConfig::load(self.config.as_deref())?;
    match self.subcmd {
      SubCommand::Server(server_config) => server_config.run(config).await,
      SubCommand::Fetch(fetch_config) => fetch(config, &fetch_config).await,
      SubCommand::Readability(conf) => {
        let content = std::fs::read_to_string(&conf.file)?;
        let readability = Readability::of_html(&content);
        println!("{} ({})", readability.score, readability.label);
        Ok(())
      }
    }
  }
}

async fn fetch(config: AppConfig, fetch_config: &FetchConfig) -> Result<()> {
  let loader = config.build_loader()?;
  let mut outcome = loader.load(fetch_config.force, LoadSignal::new()).await?;

  if let Some(error) = &outcome.error {
    eprintln!("{error}");
  }

  if let Some(limit) = fetch_config.limit_posts {
    outcome.posts.truncate(limit);
  }

  let json = if fetch_config.compact_output {
    serde_json::to_string(&outcome.posts)?
  } else {
    serde_json::to_string_pretty(&outcome.posts)?
  };
  println!("{json}");
  Ok(())
}

#[cfg(test)]
mod test {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn test_cli_definition() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_parse_fetch_args() {
    let cli =
      Cli::try_parse_from(["blog-showcase", "-c", "site.yaml", "fetch", "-f", "-n", "3"])
        .unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("site.yaml")));
    let SubCommand::Fetch(fetch) = cli.subcmd else {
      panic!("expected fetch subcommand");
    };
    assert!(fetch.force);
    assert_eq!(fetch.limit_posts, Some(3));
    assert!(!fetch.compact_output);
  }
}
