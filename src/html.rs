use scraper::{Html, Selector};

lazy_static::lazy_static! {
  static ref IMG_SELECTOR: Selector =
    Selector::parse("img").expect("bad selector");
}

/// Trimmed `src` of the first `<img>`. Later images are never considered,
/// so a first image without a source yields `None`.
pub fn first_image_src(html: &Html) -> Option<String> {
  let img = html.select(&IMG_SELECTOR).next()?;
  let src = img.value().attr("src")?.trim();
  (!src.is_empty()).then(|| src.to_owned())
}

/// Concatenated text nodes of the document, markup removed.
pub fn text_content(html: &Html) -> String {
  html.root_element().text().collect()
}

pub fn strip_tags(fragment: &str) -> String {
  text_content(&Html::parse_fragment(fragment))
}

/// Removes scripts, styles, event handler attributes and unsafe url
/// schemes. Applied every time post content is injected as HTML.
pub fn sanitize_html(html: &str) -> String {
  ammonia::Builder::default().clean(html).to_string()
}
