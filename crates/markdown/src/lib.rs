//! Markdown rendering for post bodies.
//!
//! Supports ATX headings (with anchors and a table of contents), fenced code
//! blocks, block quotes, lists, horizontal rules and paragraphs in which a
//! single newline becomes `<br />`. Inline: bold, italic, strikethrough, code,
//! links and bare URLs. Raw HTML is never passed through.
//!
//! # Example
//!
//! ```
//! let rendered = myblog_markdown::render("# Hello\n\nSome *text*");
//! assert!(rendered.html.contains("<h1 id=\"hello\">Hello</h1>"));
//! assert_eq!(rendered.toc[0].id, "hello");
//! ```

mod nodes;
mod parser;
mod render;

pub use nodes::{plain_text, Block, Inline};
pub use parser::{parse, parse_inline};
pub use render::{render_blocks, slugify, Rendered, TocEntry};

/// Render Markdown source to HTML.
#[must_use]
pub fn render(source: &str) -> Rendered {
    render_blocks(&parse(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_newlines_become_breaks() {
        let rendered = render("first line\nsecond line\n\nnew paragraph");
        assert_eq!(
            rendered.html,
            "<p>first line<br />\nsecond line</p>\n<p>new paragraph</p>"
        );
    }

    #[test]
    fn test_headings_fill_toc() {
        let rendered = render("# Intro\n\n## Details\n\n## Details");
        let ids: Vec<&str> = rendered.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["intro", "details", "details_1"]);
        assert_eq!(rendered.toc[1].level, 2);
        assert!(rendered.html.contains("<h2 id=\"details_1\">Details</h2>"));
    }

    #[test]
    fn test_toc_html() {
        let rendered = render("# A & B");
        assert_eq!(
            rendered.toc_html(),
            "<div class=\"toc\">\n<ul>\n<li class=\"toc-h1\"><a href=\"#a-b\">A &amp; B</a></li>\n</ul>\n</div>"
        );
        assert_eq!(render("no headings").toc_html(), "");
    }

    #[test]
    fn test_fenced_code_with_language() {
        let rendered = render("```rust\nfn main() { println!(\"<hi>\"); }\n```");
        assert_eq!(
            rendered.html,
            "<pre><code class=\"language-rust\">fn main() { println!(&quot;&lt;hi&gt;&quot;); }</code></pre>"
        );
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let rendered = render("<script>alert('x')</script>");
        assert_eq!(
            rendered.html,
            "<p>&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn test_inline_formatting() {
        let rendered = render("**bold** *italic* ~~gone~~ `code`");
        assert_eq!(
            rendered.html,
            "<p><strong>bold</strong> <em>italic</em> <del>gone</del> <code>code</code></p>"
        );
    }

    #[test]
    fn test_links() {
        let rendered = render("[home](/) and https://example.com");
        assert_eq!(
            rendered.html,
            "<p><a href=\"/\" rel=\"nofollow noopener\">home</a> and \
             <a href=\"https://example.com\" rel=\"nofollow noopener\">https://example.com</a></p>"
        );
    }

    #[test]
    fn test_unsafe_link_keeps_label_only() {
        let rendered = render("[click](javascript:alert)");
        assert_eq!(rendered.html, "<p>click</p>");
    }

    #[test]
    fn test_lists_and_rule() {
        let rendered = render("- one\n- two\n\n---\n\n1. first\n2. second");
        assert_eq!(
            rendered.html,
            "<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n<hr />\n<ol>\n<li>first</li>\n<li>second</li>\n</ol>"
        );
    }

    #[test]
    fn test_blockquote() {
        let rendered = render("> quoted\n> more");
        assert_eq!(
            rendered.html,
            "<blockquote>\n<p>quoted<br />\nmore</p>\n</blockquote>"
        );
    }

    #[test]
    fn test_deeply_nested_quotes_render() {
        let rendered = render(&format!("{} hi", ">".repeat(50_000)));
        assert_eq!(rendered.html.matches("<blockquote>").count(), 32);
        assert!(rendered.html.contains("&gt; hi</p>"));
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(render(""), Rendered::default());
    }

    #[test]
    fn test_serializes_toc() {
        let rendered = render("# Title");
        let json = serde_json::to_value(&rendered.toc).unwrap_or_default();
        assert_eq!(json[0]["id"], "title");
        assert_eq!(json[0]["level"], 1);
    }
}
