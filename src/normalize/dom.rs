//! Parser-backed field extraction using `scraper`.
//!
//! Produces the same [`HtmlFields`] as the pattern extractor but lets
//! html5ever deal with broken markup and entity decoding.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{HtmlExtractor, HtmlFields};
use crate::utils::collapse_whitespace;

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("title selector"));
static META_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").expect("meta selector"));
static P_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("p selector"));
static TIME_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time[datetime]").expect("time selector"));

/// DOM extractor built on `scraper`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomExtractor;

impl HtmlExtractor for DomExtractor {
    fn extract(&self, html: &str) -> HtmlFields {
        let document = Html::parse_document(html);

        HtmlFields {
            title: document.select(&TITLE_SEL).next().map(element_text),
            meta_description: meta_content(&document, "name", "description"),
            first_paragraph: document.select(&P_SEL).next().map(element_text),
            author: meta_content(&document, "name", "author"),
            site_name: meta_content(&document, "property", "og:site_name"),
            published_time: meta_content(&document, "property", "article:published_time"),
            time_datetime: document
                .select(&TIME_SEL)
                .find_map(|el| el.value().attr("datetime").map(str::to_string)),
        }
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn meta_content(document: &Html, key_attr: &str, key: &str) -> Option<String> {
    document.select(&META_SEL).find_map(|el| {
        let meta = el.value();
        let matches = meta
            .attr(key_attr)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(key));
        if !matches {
            return None;
        }
        meta.attr("content")
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::PatternExtractor;

    const ARTICLE: &str = r#"<!doctype html>
<html>
  <head>
    <TITLE>Open models &amp; the edge</TITLE>
    <meta property="og:site_name" content="Edge Weekly">
    <meta name="Author" content="R. Writer">
    <meta property="article:published_time" content="2025-05-06T09:30:00Z">
  </head>
  <body>
    <article>
      <p>Small models <strong>now</strong> run
         on phones.</p>
      <p>Second paragraph.</p>
    </article>
  </body>
</html>"#;

    #[test]
    fn test_dom_extracts_all_fields() {
        let fields = DomExtractor.extract(ARTICLE);
        assert_eq!(fields.title.as_deref(), Some("Open models & the edge"));
        assert_eq!(fields.meta_description, None);
        assert_eq!(fields.first_paragraph.as_deref(), Some("Small models now run on phones."));
        assert_eq!(fields.author.as_deref(), Some("R. Writer"));
        assert_eq!(fields.site_name.as_deref(), Some("Edge Weekly"));
        assert_eq!(fields.published_time.as_deref(), Some("2025-05-06T09:30:00Z"));
    }

    #[test]
    fn test_dom_and_pattern_agree_on_wellformed_page() {
        assert_eq!(DomExtractor.extract(ARTICLE), PatternExtractor.extract(ARTICLE));
    }

    #[test]
    fn test_dom_tolerates_garbage() {
        let fields = DomExtractor.extract("<<<>>> <p <title");
        assert_eq!(fields.meta_description, None);
        assert_eq!(fields.time_datetime, None);
    }
}
