mod api;
mod showcase;
mod web;

use axum::{
  Extension, Router,
  extract::Query,
  response::{IntoResponse, Response},
  routing::{get, post},
};
use clap::Parser;
use http::StatusCode;
use maud::Markup;
use serde::Deserialize;
use tower_http::compression::CompressionLayer;
use tracing::info;

use crate::{
  carousel::Carousel,
  config::AppConfig,
  detail::DetailView,
  util::Result,
};

pub use showcase::Showcase;

#[derive(Parser)]
pub struct ServerConfig {
  #[clap(long, short, default_value = "127.0.0.1:4080")]
  bind: String,
}

impl ServerConfig {
  pub async fn run(self, config: AppConfig) -> Result<()> {
    let showcase = Showcase::new(
      config.build_loader()?,
      config.feed.placeholder_thumbnail.clone(),
      config.carousel.auto_advance,
      config.cache.ttl,
    );
    showcase.spawn_reload(false);

    serve(self, showcase).await
  }
}

pub fn router(showcase: Showcase) -> Router {
  Router::new()
    .route("/", get(handle_carousel))
    .route("/post", get(handle_detail))
    .route("/refresh", post(api::handle_refresh))
    .route("/featured", get(api::handle_featured))
    .route("/featured/pause", post(api::handle_pause))
    .route("/featured/resume", post(api::handle_resume))
    .route("/api/posts", get(api::handle_posts))
    .route("/api/posts/detail", get(api::handle_post_detail))
    .route("/health", get(|| async { "ok" }))
    .fallback(get(|| async { (StatusCode::NOT_FOUND, "Not found") }))
    .layer(Extension(showcase))
}

pub async fn serve(server_config: ServerConfig, showcase: Showcase) -> Result<()> {
  info!("listening on {}", server_config.bind);
  let listener = tokio::net::TcpListener::bind(&server_config.bind).await?;

  let app = router(showcase.clone())
    .layer(CompressionLayer::new().gzip(true));

  info!("starting server");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  showcase.abort_in_flight();
  Ok(())
}

#[derive(Deserialize)]
struct SlideQuery {
  slide: Option<usize>,
}

#[derive(Deserialize)]
pub(crate) struct GuidQuery {
  guid: String,
}

async fn handle_carousel(
  Query(query): Query<SlideQuery>,
  Extension(showcase): Extension<Showcase>,
) -> Markup {
  showcase.refresh_if_stale().await;
  let snapshot = showcase.snapshot().await;

  let len = snapshot.as_ref().map_or(0, |s| s.outcome.posts.len());
  let mut carousel = Carousel::new(len);
  if let Some(slide) = query.slide {
    carousel.jump(slide);
  }

  web::render_carousel_page(
    snapshot.as_deref(),
    &carousel,
    showcase.placeholder_thumbnail(),
  )
}

async fn handle_detail(
  Query(query): Query<GuidQuery>,
  Extension(showcase): Extension<Showcase>,
) -> Response {
  let Some(snapshot) = showcase.snapshot().await else {
    return not_found(&query.guid);
  };
  let posts = &snapshot.outcome.posts;
  let Some(post) = posts.iter().find(|p| p.guid == query.guid) else {
    return not_found(&query.guid);
  };

  let view = DetailView::new(post, posts);
  web::render_detail_page(&view, showcase.placeholder_thumbnail())
    .into_response()
}

fn not_found(guid: &str) -> Response {
  (StatusCode::NOT_FOUND, format!("Post {guid} not found")).into_response()
}

async fn shutdown_signal() {
  #[cfg(unix)]
  {
    use tokio::signal::unix::{SignalKind, signal};

    let (Ok(mut sigint), Ok(mut sigterm)) = (
      signal(SignalKind::interrupt()),
      signal(SignalKind::terminate()),
    ) else {
      tracing::warn!("failed to install signal handlers");
      return futures::future::pending().await;
    };

    tokio::select! {
      _ = sigint.recv() => {
        info!("Received SIGINT, shutting down...");
      }
      _ = sigterm.recv() => {
        info!("Received SIGTERM, shutting down...");
      }
    };
  }

  #[cfg(not(unix))]
  {
    let _ = tokio::signal::ctrl_c().await;
    info!("Received Ctrl-C, shutting down...");
  }
}
