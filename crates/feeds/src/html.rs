//! Minimal HTML scraping helpers.
//!
//! Regex based on purpose: pages are only scanned for a handful of well
//! known fragments, never rendered.

use regex::Regex;
use std::sync::OnceLock;

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("static regex"))
        }
    };
}

static_regex!(
    ld_json_re,
    r#"(?is)<script[^>]+type=["']application/ld\+json["'][^>]*>(.*?)</script>"#
);
static_regex!(script_style_re, r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>");
static_regex!(tag_re, r"(?s)<[^>]+>");
static_regex!(whitespace_re, r"\s+");
static_regex!(
    anchor_re,
    r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#
);

/// A link found on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}

/// Contents of every `<script type="application/ld+json">` block.
pub fn ld_json_blocks(html: &str) -> Vec<&str> {
    ld_json_re()
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&rsquo;", "’")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Strip tags from an HTML fragment and collapse whitespace.
pub fn fragment_text(fragment: &str) -> String {
    let without_tags = tag_re().replace_all(fragment, " ");
    let decoded = decode_entities(&without_tags);
    whitespace_re().replace_all(decoded.trim(), " ").into_owned()
}

/// Visible text of a whole page (scripts and styles removed).
pub fn page_text(html: &str) -> String {
    let without_scripts = script_style_re().replace_all(html, " ");
    fragment_text(&without_scripts)
}

/// All `<a href>` links with their visible text.
pub fn anchors(html: &str) -> Vec<Anchor> {
    anchor_re()
        .captures_iter(html)
        .map(|caps| Anchor {
            href: caps[1].trim().to_string(),
            text: fragment_text(&caps[2]),
        })
        .collect()
}

/// Inner text of the first element whose class list contains `class_name`.
///
/// `tag` restricts the element name (e.g. `s` for struck-through prices).
pub fn element_text_by_class(html: &str, tag: &str, class_name: &str) -> Option<String> {
    let pattern = format!(
        r#"(?is)<{tag}[^>]*class=["'][^"']*{class}[^"']*["'][^>]*>(.*?)</{tag}>"#,
        tag = regex::escape(tag),
        class = regex::escape(class_name),
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(html).map(|caps| fragment_text(&caps[1]))
}
