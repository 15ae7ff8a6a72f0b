//! Rich text sanitization for submitted and edited post bodies.
//!
//! Posts are authored in a constrained rich text editor but arrive over HTTP
//! as arbitrary HTML. Everything is re-parsed and re-serialized here against
//! an allowlist, so no markup reaches storage that this module did not emit.

use ego_tree::NodeRef;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Node};

/// Tags that survive sanitization. Anything else is either dropped wholly
/// (see `DISCARD_WITH_CHILDREN`) or unwrapped to its children.
const ALLOWED_TAGS: &[&str] = &[
    "p",
    "br",
    "strong",
    "em",
    "u",
    "s",
    "ul",
    "ol",
    "li",
    "blockquote",
    "a",
    "img",
    "video",
];

/// Tags whose entire subtree is discarded, text included.
const DISCARD_WITH_CHILDREN: &[&str] = &["script", "style", "textarea", "title", "iframe", "object", "embed"];

/// Media sources must be uploads served by this application.
const UPLOADS_PREFIX: &str = "/uploads/";

lazy_static! {
    /// Safe inline style declarations for images (sizing only).
    static ref IMG_STYLE_DECL: Regex =
        Regex::new(r"^\s*(width|height|max-width|max-height)\s*:\s*[0-9.]+(px|%|em|rem)\s*$")
            .expect("valid regex");
}

/// Sanitize an HTML fragment to the board's allowlist.
///
/// Headings become paragraphs, links are forced to open in a new tab with
/// `rel="noopener noreferrer"`, media must point under `/uploads/`, and
/// runs of empty paragraphs collapse to a single `<p><br></p>`.
pub fn sanitize_rich_text(input: &str) -> String {
    let fragment = Html::parse_fragment(input);
    let mut out = String::with_capacity(input.len());
    for child in fragment.tree.root().children() {
        render_node(child, &mut out);
    }
    normalize_empty_paragraphs(&out)
}

/// Strip all markup, returning plain text with whitespace collapsed.
///
/// Used for feeding post content to the analysis prompt and for
/// plain-text previews.
pub fn strip_html(input: &str) -> String {
    let fragment = Html::parse_fragment(input);
    let mut text = String::with_capacity(input.len());
    for child in fragment.tree.root().children() {
        collect_text(child, &mut text);
    }
    collapse_whitespace(&text)
}

fn render_node(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(t) => out.push_str(&escape_text(t)),
        Node::Element(el) => {
            let name = el.name();
            if DISCARD_WITH_CHILDREN.contains(&name) {
                return;
            }

            // Headings read as shouting on a bulletin board.
            let name = if matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6") {
                "p"
            } else {
                name
            };

            if !ALLOWED_TAGS.contains(&name) {
                // Unwrap: keep the children, lose the tag.
                for child in node.children() {
                    render_node(child, out);
                }
                return;
            }

            match name {
                "br" => out.push_str("<br>"),
                "a" => render_anchor(node, out),
                "img" => render_img(node, out),
                "video" => render_video(node, out),
                _ => {
                    out.push('<');
                    out.push_str(name);
                    out.push('>');
                    for child in node.children() {
                        render_node(child, out);
                    }
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
            }
        }
        // Comments, doctypes, processing instructions are dropped.
        _ => {
            for child in node.children() {
                render_node(child, out);
            }
        }
    }
}

fn render_anchor(node: NodeRef<'_, Node>, out: &mut String) {
    let href = element_attr(node, "href").filter(|h| is_safe_href(h));

    out.push_str("<a");
    if let Some(href) = href {
        out.push_str(" href=\"");
        out.push_str(&escape_attr(&href));
        out.push('"');
    }
    out.push_str(" target=\"_blank\" rel=\"noopener noreferrer\">");
    for child in node.children() {
        render_node(child, out);
    }
    out.push_str("</a>");
}

fn render_img(node: NodeRef<'_, Node>, out: &mut String) {
    let Some(src) = element_attr(node, "src").filter(|s| s.starts_with(UPLOADS_PREFIX)) else {
        // Off-site images are dropped outright, not unwrapped.
        return;
    };

    out.push_str("<img src=\"");
    out.push_str(&escape_attr(&src));
    out.push('"');
    if let Some(alt) = element_attr(node, "alt") {
        out.push_str(" alt=\"");
        out.push_str(&escape_attr(&alt));
        out.push('"');
    }
    if let Some(style) = element_attr(node, "style") {
        let safe = filter_img_style(&style);
        if !safe.is_empty() {
            out.push_str(" style=\"");
            out.push_str(&escape_attr(&safe));
            out.push('"');
        }
    }
    out.push('>');
}

fn render_video(node: NodeRef<'_, Node>, out: &mut String) {
    let Some(src) = element_attr(node, "src").filter(|s| s.starts_with(UPLOADS_PREFIX)) else {
        return;
    };

    out.push_str("<video src=\"");
    out.push_str(&escape_attr(&src));
    out.push_str("\" controls preload=\"metadata\"></video>");
}

fn element_attr(node: NodeRef<'_, Node>, name: &str) -> Option<String> {
    match node.value() {
        Node::Element(el) => el.attr(name).map(|v| v.to_string()),
        _ => None,
    }
}

/// Links may be absolute http(s) URLs or site-relative paths.
fn is_safe_href(href: &str) -> bool {
    let trimmed = href.trim();
    trimmed.starts_with("http://")
        || trimmed.starts_with("https://")
        || (trimmed.starts_with('/') && !trimmed.starts_with("//"))
}

/// Keep only sizing declarations from an image style attribute.
fn filter_img_style(style: &str) -> String {
    style
        .split(';')
        .filter(|decl| IMG_STYLE_DECL.is_match(decl))
        .map(|decl| decl.trim())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Replace empty paragraphs with `<p><br></p>` and collapse runs of them
/// to a single spacer.
fn normalize_empty_paragraphs(html: &str) -> String {
    lazy_static! {
        static ref EMPTY_P: Regex = Regex::new(r"<p>(\s|&nbsp;|<br>)*</p>").expect("valid regex");
        static ref SPACER_RUN: Regex =
            Regex::new(r"(<p><br></p>\s*){2,}").expect("valid regex");
    }
    let spaced = EMPTY_P.replace_all(html, "<p><br></p>");
    SPACER_RUN.replace_all(&spaced, "<p><br></p>").into_owned()
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(t) => out.push_str(t),
        Node::Element(el) if DISCARD_WITH_CHILDREN.contains(&el.name()) => {}
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
            // Block boundaries become spaces so words don't run together.
            if let Node::Element(el) = node.value() {
                if matches!(el.name(), "p" | "br" | "li" | "blockquote" | "div") {
                    out.push(' ');
                }
            }
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_basic_formatting() {
        let input = "<p>Hello <strong>world</strong> and <em>friends</em></p>";
        assert_eq!(sanitize_rich_text(input), input);
    }

    #[test]
    fn test_drops_script_entirely() {
        let out = sanitize_rich_text("<script>alert(1)</script><p>hi</p>");
        assert_eq!(out, "<p>hi</p>");
    }

    #[test]
    fn test_unwraps_unknown_tags() {
        let out = sanitize_rich_text("<div><span>text</span></div>");
        assert_eq!(out, "text");
    }

    #[test]
    fn test_headings_become_paragraphs() {
        let out = sanitize_rich_text("<h1>Big news</h1><h3>Smaller news</h3>");
        assert_eq!(out, "<p>Big news</p><p>Smaller news</p>");
    }

    #[test]
    fn test_anchor_gets_target_and_rel() {
        let out = sanitize_rich_text("<a href=\"https://example.com\">link</a>");
        assert_eq!(
            out,
            "<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">link</a>"
        );
    }

    #[test]
    fn test_anchor_drops_javascript_href() {
        let out = sanitize_rich_text("<a href=\"javascript:alert(1)\">x</a>");
        assert_eq!(out, "<a target=\"_blank\" rel=\"noopener noreferrer\">x</a>");
    }

    #[test]
    fn test_anchor_allows_relative_href() {
        let out = sanitize_rich_text("<a href=\"/board\">here</a>");
        assert!(out.contains("href=\"/board\""));
    }

    #[test]
    fn test_anchor_rejects_protocol_relative_href() {
        let out = sanitize_rich_text("<a href=\"//evil.example\">x</a>");
        assert!(!out.contains("href"));
    }

    #[test]
    fn test_img_requires_uploads_prefix() {
        let kept = sanitize_rich_text("<img src=\"/uploads/pic.jpg\">");
        assert_eq!(kept, "<img src=\"/uploads/pic.jpg\">");

        let dropped = sanitize_rich_text("<img src=\"https://evil.example/x.jpg\">");
        assert_eq!(dropped, "");
    }

    #[test]
    fn test_img_style_filtered_to_sizing() {
        let out = sanitize_rich_text(
            "<img src=\"/uploads/a.png\" style=\"width: 50%; position: fixed\">",
        );
        assert!(out.contains("style=\"width: 50%\""));
        assert!(!out.contains("position"));
    }

    #[test]
    fn test_img_event_handlers_stripped() {
        let out = sanitize_rich_text("<img src=\"/uploads/a.png\" onerror=\"alert(1)\">");
        assert!(!out.contains("onerror"));
    }

    #[test]
    fn test_video_requires_uploads_prefix() {
        let kept = sanitize_rich_text("<video src=\"/uploads/clip.mp4\"></video>");
        assert_eq!(
            kept,
            "<video src=\"/uploads/clip.mp4\" controls preload=\"metadata\"></video>"
        );

        let dropped = sanitize_rich_text("<video src=\"https://evil.example/c.mp4\"></video>");
        assert_eq!(dropped, "");
    }

    #[test]
    fn test_empty_paragraph_becomes_spacer() {
        let out = sanitize_rich_text("<p>a</p><p></p><p>b</p>");
        assert_eq!(out, "<p>a</p><p><br></p><p>b</p>");
    }

    #[test]
    fn test_empty_paragraph_run_collapses() {
        let out = sanitize_rich_text("<p>a</p><p></p><p> </p><p><br></p><p>b</p>");
        assert_eq!(out, "<p>a</p><p><br></p><p>b</p>");
    }

    #[test]
    fn test_text_is_escaped() {
        let out = sanitize_rich_text("<p>1 &lt; 2 &amp; 3 &gt; 2</p>");
        assert_eq!(out, "<p>1 &lt; 2 &amp; 3 &gt; 2</p>");
    }

    #[test]
    fn test_nested_lists_survive() {
        let input = "<ul><li>one</li><li>two<ol><li>sub</li></ol></li></ul>";
        assert_eq!(sanitize_rich_text(input), input);
    }

    #[test]
    fn test_strip_html_collapses_whitespace() {
        let out = strip_html("<p>Hello   <strong>world</strong></p>\n<p>again</p>");
        assert_eq!(out, "Hello world again");
    }

    #[test]
    fn test_strip_html_skips_script_content() {
        let out = strip_html("<p>ok</p><script>var x = 1;</script>");
        assert_eq!(out, "ok");
    }
}
