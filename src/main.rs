use blog_showcase::{Result, cli};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let cli = cli::Cli::parse();
  cli.run().await
}
