use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::{
  carousel::Carousel,
  detail::DetailView,
  feed::Post,
  util::format_date,
};

use super::showcase::Snapshot;

pub fn render_carousel_page(
  snapshot: Option<&Snapshot>,
  carousel: &Carousel,
  placeholder: &str,
) -> Markup {
  page(
    "Blog",
    html! {
      h1 { "From the blog" }
      @match snapshot {
        None => {
          p .status { "Loading posts..." }
        }
        Some(snapshot) if snapshot.outcome.posts.is_empty() => {
          @if let Some(error) = &snapshot.outcome.error {
            p .error { (error) }
          } @else {
            p .status { "No posts yet." }
          }
        }
        Some(snapshot) => {
          @if let Some(error) = &snapshot.outcome.error {
            p .notice { "Showing saved posts. " (error) }
          }
          (carousel_fragment(&snapshot.outcome.posts, carousel, placeholder))
        }
      }
    },
  )
}

fn carousel_fragment(
  posts: &[Post],
  carousel: &Carousel,
  placeholder: &str,
) -> Markup {
  html! {
    section .carousel {
      @for (i, post) in posts.iter().enumerate() {
        @let active = carousel.is_active(i);
        article .slide .active[active]
          style=(slide_style(active))
          aria-hidden=(if active { "false" } else { "true" }) {
          (thumbnail(post, placeholder))
          h2 { a href=(detail_href(post)) { (post.title) } }
          p .meta { (post.author) " · " (format_date(&post.pub_date)) }
          p { (post.description) }
        }
      }
      nav .controls {
        a href={"?slide=" (carousel.prev_index())} { "‹ Previous" }
        @for i in 0..carousel.len() {
          a .dot .current[carousel.is_active(i)] href={"?slide=" (i)} {
            (i + 1)
          }
        }
        a href={"?slide=" (carousel.next_index())} { "Next ›" }
      }
    }
  }
}

// inactive slides stay mounted but invisible and inert
fn slide_style(active: bool) -> &'static str {
  if active {
    "opacity: 1; transition: opacity 0.5s"
  } else {
    "opacity: 0; pointer-events: none; position: absolute; transition: opacity 0.5s"
  }
}

fn thumbnail(post: &Post, placeholder: &str) -> Markup {
  let src = web_url(&post.thumbnail).unwrap_or(placeholder);
  html! {
    img src=(src) alt=(post.title) loading="lazy" data-fallback=(placeholder)
      onerror="this.onerror=null;this.src=this.dataset.fallback";
  }
}

/// Feed-supplied urls are only emitted when they are plain http(s).
fn web_url(raw: &str) -> Option<&str> {
  let url = url::Url::parse(raw.trim()).ok()?;
  matches!(url.scheme(), "http" | "https").then_some(raw.trim())
}

pub fn detail_href(post: &Post) -> String {
  let guid: String = url::form_urlencoded::byte_serialize(post.guid.as_bytes())
    .collect();
  format!("/post?guid={guid}")
}

pub fn render_detail_page(view: &DetailView<'_>, placeholder: &str) -> Markup {
  let post = view.post;
  page(
    &post.title,
    html! {
      a href="/" { "× Close" }
      article .detail {
        (thumbnail(post, placeholder))
        h1 { (post.title) }
        p .meta {
          (post.author) " · " (format_date(&post.pub_date))
          " · "
          span .readability title="Flesch Reading Ease" {
            "Readability: " (view.readability.label)
            @if view.readability.label != "N/A" {
              " (" (view.readability.score) ")"
            }
          }
        }
        @if !post.categories.is_empty() {
          ul .categories {
            @for category in &post.categories {
              li { (category) }
            }
          }
        }
        section .content { (PreEscaped(&view.content_html)) }
        @if let Some(link) = web_url(&post.link) {
          p { a href=(link) rel="noopener" target="_blank" { "Read the original" } }
        }
      }
      @if !view.related.is_empty() {
        aside .related {
          h2 { "Related posts" }
          ul {
            @for related in &view.related {
              li { a href=(detail_href(related)) { (related.title) } }
            }
          }
        }
      }
    },
  )
}

fn page(title: &str, body: Markup) -> Markup {
  html! {
    (DOCTYPE)
    html {
      head {
        meta charset="utf-8";
        meta name="viewport" content="width=device-width, initial-scale=1";
        title { (title) }
        style { (PreEscaped(STYLES)) }
      }
      body { main { (body) } }
    }
  }
}

const STYLES: &str = r#"
  main { max-width: 48rem; margin: 0 auto; font-family: sans-serif; }
  .carousel { position: relative; }
  .slide img, .detail img { max-width: 100%; }
  .controls { display: flex; gap: 0.5rem; justify-content: center; }
  .dot.current { font-weight: bold; }
  .error { color: #b00020; }
  .notice { color: #8a6d3b; }
"#;
