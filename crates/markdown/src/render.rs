//! HTML rendering with heading anchors.

use std::collections::HashMap;

use serde::Serialize;

use crate::nodes::{plain_text, Block, Inline};

/// One heading in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Heading level, 1 to 6.
    pub level: u8,
    /// Anchor id, unique within the document.
    pub id: String,
    /// Heading text without formatting.
    pub title: String,
}

/// Rendered document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rendered {
    /// Body HTML.
    pub html: String,
    /// Headings in document order.
    pub toc: Vec<TocEntry>,
}

impl Rendered {
    /// Table of contents as a flat HTML list, empty when there are no headings.
    #[must_use]
    pub fn toc_html(&self) -> String {
        if self.toc.is_empty() {
            return String::new();
        }

        let mut out = String::from("<div class=\"toc\">\n<ul>\n");
        for entry in &self.toc {
            out.push_str(&format!(
                "<li class=\"toc-h{}\"><a href=\"#{}\">{}</a></li>\n",
                entry.level,
                html_escape(&entry.id),
                html_escape(&entry.title)
            ));
        }
        out.push_str("</ul>\n</div>");
        out
    }
}

#[derive(Default)]
struct Renderer {
    toc: Vec<TocEntry>,
    used_ids: HashMap<String, usize>,
}

impl Renderer {
    fn blocks(&mut self, blocks: &[Block]) -> String {
        blocks
            .iter()
            .map(|block| self.block(block))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn block(&mut self, block: &Block) -> String {
        match block {
            Block::Heading { level, children } => {
                let title = plain_text(children);
                let id = self.unique_id(&slugify(&title));
                self.toc.push(TocEntry {
                    level: *level,
                    id: id.clone(),
                    title,
                });
                format!(
                    "<h{level} id=\"{}\">{}</h{level}>",
                    html_escape(&id),
                    inlines_to_html(children)
                )
            }
            Block::Paragraph { lines } => {
                let body = lines
                    .iter()
                    .map(|line| inlines_to_html(line))
                    .collect::<Vec<_>>()
                    .join("<br />\n");
                format!("<p>{body}</p>")
            }
            Block::CodeBlock { code, lang } => match lang {
                Some(l) => format!(
                    "<pre><code class=\"language-{}\">{}</code></pre>",
                    html_escape(l),
                    html_escape(code)
                ),
                None => format!("<pre><code>{}</code></pre>", html_escape(code)),
            },
            Block::Quote { children } => {
                format!("<blockquote>\n{}\n</blockquote>", self.blocks(children))
            }
            Block::List {
                ordered,
                start,
                items,
            } => {
                let open = match (ordered, start) {
                    (false, _) => "<ul>".to_string(),
                    (true, 1) => "<ol>".to_string(),
                    (true, n) => format!("<ol start=\"{n}\">"),
                };
                let close = if *ordered { "</ol>" } else { "</ul>" };
                let body: String = items
                    .iter()
                    .map(|item| format!("<li>{}</li>\n", inlines_to_html(item)))
                    .collect();
                format!("{open}\n{body}{close}")
            }
            Block::Rule => "<hr />".to_string(),
        }
    }

    /// Deduplicate anchors as `intro`, `intro_1`, `intro_2`.
    fn unique_id(&mut self, slug: &str) -> String {
        let count = self.used_ids.entry(slug.to_string()).or_insert(0);
        let id = if *count == 0 {
            slug.to_string()
        } else {
            format!("{slug}_{count}")
        };
        *count += 1;
        id
    }
}

/// Render parsed blocks to HTML and collect the table of contents.
#[must_use]
pub fn render_blocks(blocks: &[Block]) -> Rendered {
    let mut renderer = Renderer::default();
    let html = renderer.blocks(blocks);
    Rendered {
        html,
        toc: renderer.toc,
    }
}

fn inlines_to_html(nodes: &[Inline]) -> String {
    nodes.iter().map(inline_to_html).collect()
}

fn inline_to_html(node: &Inline) -> String {
    match node {
        Inline::Text { text } => html_escape(text),
        Inline::Bold { children } => format!("<strong>{}</strong>", inlines_to_html(children)),
        Inline::Italic { children } => format!("<em>{}</em>", inlines_to_html(children)),
        Inline::Strike { children } => format!("<del>{}</del>", inlines_to_html(children)),
        Inline::Code { code } => format!("<code>{}</code>", html_escape(code)),
        Inline::Link { url, children } => {
            if is_safe_url(url) {
                format!(
                    "<a href=\"{}\" rel=\"nofollow noopener\">{}</a>",
                    html_escape(url),
                    inlines_to_html(children)
                )
            } else {
                inlines_to_html(children)
            }
        }
        Inline::Url { url } => format!(
            "<a href=\"{}\" rel=\"nofollow noopener\">{}</a>",
            html_escape(url),
            html_escape(url)
        ),
    }
}

/// Relative links, fragments and http(s)/mailto only.
fn is_safe_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    match lower.split_once(':') {
        Some((scheme, _)) if !scheme.contains(['/', '?', '#']) => {
            matches!(scheme, "http" | "https" | "mailto")
        }
        _ => true,
    }
}

/// Lowercased words joined by `-`; punctuation is dropped.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust -- ownership  "), "rust-ownership");
        assert_eq!(slugify("snake_case"), "snake_case");
        assert_eq!(slugify("???"), "section");
    }

    #[test]
    fn test_safe_urls() {
        assert!(is_safe_url("https://example.com"));
        assert!(is_safe_url("/post/1/"));
        assert!(is_safe_url("#intro"));
        assert!(is_safe_url("mailto:me@example.com"));
        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url("JavaScript:alert(1)"));
        assert!(!is_safe_url("data:text/html,hi"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }
}
