//! Tolerant regex-based field extraction.
//!
//! Scraped pages are frequently malformed, so this extractor never builds a
//! document tree. It scans for the handful of tags it cares about and
//! ignores everything else. Tag and attribute names match case-insensitively,
//! attribute values may use single, double, or no quotes, and attribute
//! order does not matter.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{HtmlExtractor, HtmlFields};
use crate::utils::collapse_whitespace;

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("title pattern"));

static META_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<meta\b((?:[^>"']|"[^"]*"|'[^']*')*)/?>"#).expect("meta pattern")
});

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<time\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("time pattern")
});

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("attribute pattern")
});

static PARAGRAPH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p\s*>").expect("paragraph pattern"));

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").expect("tag pattern"));

/// Regex extractor; the default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternExtractor;

impl HtmlExtractor for PatternExtractor {
    fn extract(&self, html: &str) -> HtmlFields {
        HtmlFields {
            title: TITLE_RE
                .captures(html)
                .map(|c| decode_entities(&collapse_whitespace(&c[1]))),
            meta_description: meta_content(html, "name", "description"),
            // Entities decode before tags are stripped; the result holds no markup.
            first_paragraph: PARAGRAPH_RE
                .captures(html)
                .map(|c| collapse_whitespace(&TAG_RE.replace_all(&decode_entities(&c[1]), ""))),
            author: meta_content(html, "name", "author"),
            site_name: meta_content(html, "property", "og:site_name"),
            published_time: meta_content(html, "property", "article:published_time"),
            time_datetime: TIME_RE
                .captures_iter(html)
                .find_map(|c| attribute(&c[1], "datetime")),
        }
    }
}

/// Parse the attribute list of a single tag into `(lowercase name, value)`.
fn attributes(raw: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(raw)
        .map(|c| {
            let value = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            (c[1].to_ascii_lowercase(), value.to_string())
        })
        .collect()
}

fn attribute(raw: &str, name: &str) -> Option<String> {
    attributes(raw)
        .into_iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| decode_entities(&v))
}

/// `content` of the first `<meta>` whose `key_attr` equals `key`.
fn meta_content(html: &str, key_attr: &str, key: &str) -> Option<String> {
    META_RE.captures_iter(html).find_map(|c| {
        let attrs = attributes(&c[1]);
        let matches = attrs
            .iter()
            .any(|(k, v)| k == key_attr && v.trim().eq_ignore_ascii_case(key));
        if !matches {
            return None;
        }
        attrs
            .into_iter()
            .find(|(k, v)| k == "content" && !v.trim().is_empty())
            .map(|(_, v)| decode_entities(v.trim()))
    })
}

/// Decode the handful of entities that show up in titles and descriptions.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_case_insensitive_and_trimmed() {
        let fields = PatternExtractor.extract("<HTML><HEAD><TITLE>\n  Big  News \n</TITLE></HEAD>");
        assert_eq!(fields.title.as_deref(), Some("Big News"));
    }

    #[test]
    fn test_title_with_attributes_and_entities() {
        let fields = PatternExtractor.extract(r#"<title data-rh="true">Q&amp;A: AI &#39;agents&#39;</title>"#);
        assert_eq!(fields.title.as_deref(), Some("Q&A: AI 'agents'"));
    }

    #[test]
    fn test_meta_description_quoting_and_order() {
        let single = PatternExtractor.extract("<meta name='description' content='Single quoted'>");
        assert_eq!(single.meta_description.as_deref(), Some("Single quoted"));

        let reversed = PatternExtractor.extract(r#"<meta content="Content first" NAME="Description" />"#);
        assert_eq!(reversed.meta_description.as_deref(), Some("Content first"));

        let with_gt = PatternExtractor.extract(r#"<meta name="description" content="a > b">"#);
        assert_eq!(with_gt.meta_description.as_deref(), Some("a > b"));
    }

    #[test]
    fn test_meta_with_empty_content_is_ignored() {
        let fields = PatternExtractor.extract(
            r#"<meta name="description" content=""><meta name="description" content="Second">"#,
        );
        assert_eq!(fields.meta_description.as_deref(), Some("Second"));
    }

    #[test]
    fn test_other_meta_tags_do_not_leak() {
        let fields = PatternExtractor.extract(r#"<meta name="keywords" content="ai, news">"#);
        assert_eq!(fields.meta_description, None);
        assert_eq!(fields.author, None);
    }

    #[test]
    fn test_paragraph_does_not_match_similar_tags() {
        let html = "<pre>code</pre><param name=x><p>Real paragraph</p>";
        let fields = PatternExtractor.extract(html);
        assert_eq!(fields.first_paragraph.as_deref(), Some("Real paragraph"));
    }

    #[test]
    fn test_paragraph_spans_lines_and_strips_tags() {
        let html = "<p id=\"lead\">First line\n<em>second</em>\n<br/>third</p>";
        let fields = PatternExtractor.extract(html);
        assert_eq!(fields.first_paragraph.as_deref(), Some("First line second third"));
    }

    #[test]
    fn test_paragraph_escaped_markup_leaves_no_tags() {
        let html = "<p>Use &lt;script&gt;alert(1)&lt;/script&gt; with care &amp; caution</p>";
        let fields = PatternExtractor.extract(html);
        let text = fields.first_paragraph.unwrap();
        assert!(!text.contains('<'));
        assert!(!text.contains('>'));
        assert_eq!(text, "Use alert(1) with care & caution");
    }

    #[test]
    fn test_unclosed_paragraph_is_absent() {
        let fields = PatternExtractor.extract("<p>never closed");
        assert_eq!(fields.first_paragraph, None);
    }

    #[test]
    fn test_time_datetime_skips_time_without_attribute() {
        let html = r#"<time>today</time><time datetime='2025-05-06T08:00:00Z'>May 6</time>"#;
        let fields = PatternExtractor.extract(html);
        assert_eq!(fields.time_datetime.as_deref(), Some("2025-05-06T08:00:00Z"));
    }

    #[test]
    fn test_unquoted_attribute_values() {
        let fields = PatternExtractor.extract("<meta name=author content=Staff>");
        assert_eq!(fields.author.as_deref(), Some("Staff"));
    }
}
