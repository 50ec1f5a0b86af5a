use axum::{
  Extension, Json,
  extract::Query,
  response::{IntoResponse, Response},
};
use http::StatusCode;
use serde_json::json;

use crate::{detail::DetailView, util::Error};

use super::{GuidQuery, Showcase, not_found};

pub(super) async fn handle_posts(
  Extension(showcase): Extension<Showcase>,
) -> Response {
  showcase.refresh_if_stale().await;
  match showcase.snapshot().await {
    Some(snapshot) => Json(&snapshot.outcome).into_response(),
    None => Json(json!({ "posts": [], "error": null, "origin": null }))
      .into_response(),
  }
}

pub(super) async fn handle_post_detail(
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

  Json(DetailView::new(post, posts)).into_response()
}

pub(super) async fn handle_refresh(
  Extension(showcase): Extension<Showcase>,
) -> Response {
  match showcase.reload(true).await {
    Ok(()) => {
      let snapshot = showcase.snapshot().await;
      let outcome = snapshot.as_ref().map(|s| &s.outcome);
      Json(json!({
        "posts": outcome.map_or(0, |o| o.posts.len()),
        "origin": outcome.map(|o| o.origin),
        "error": outcome.and_then(|o| o.error.clone()),
      }))
      .into_response()
    }
    Err(e) => into_http(e).into_response(),
  }
}

pub(super) async fn handle_featured(
  Extension(showcase): Extension<Showcase>,
) -> Response {
  Json(showcase.featured().await).into_response()
}

pub(super) async fn handle_pause(
  Extension(showcase): Extension<Showcase>,
) -> Response {
  showcase.set_featured_paused(true).await;
  Json(showcase.featured().await).into_response()
}

pub(super) async fn handle_resume(
  Extension(showcase): Extension<Showcase>,
) -> Response {
  showcase.set_featured_paused(false).await;
  Json(showcase.featured().await).into_response()
}

fn into_http(e: Error) -> (StatusCode, String) {
  match e {
    Error::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    e => (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:?}")),
  }
}
