//! Markdown document tree.

use serde::Serialize;

/// Block-level element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    /// ATX heading (`#` to `######`).
    Heading { level: u8, children: Vec<Inline> },

    /// Paragraph. Each entry is one source line; lines are joined with `<br />`.
    Paragraph { lines: Vec<Vec<Inline>> },

    /// Fenced code block.
    CodeBlock { code: String, lang: Option<String> },

    /// Block quote (`> text`).
    Quote { children: Vec<Block> },

    /// Bulleted or numbered list.
    List {
        ordered: bool,
        start: u64,
        items: Vec<Vec<Inline>>,
    },

    /// Horizontal rule.
    Rule,
}

/// Inline element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inline {
    /// Plain text.
    Text { text: String },

    /// Bold text (`**text**` or `__text__`).
    Bold { children: Vec<Inline> },

    /// Italic text (`*text*`).
    Italic { children: Vec<Inline> },

    /// Strikethrough text (`~~text~~`).
    Strike { children: Vec<Inline> },

    /// Inline code (`` `code` ``).
    Code { code: String },

    /// Link `[text](url)`.
    Link { url: String, children: Vec<Inline> },

    /// Bare URL.
    Url { url: String },
}

/// Concatenate the visible text of inline nodes.
#[must_use]
pub fn plain_text(nodes: &[Inline]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Inline::Text { text } => out.push_str(text),
            Inline::Code { code } => out.push_str(code),
            Inline::Url { url } => out.push_str(url),
            Inline::Bold { children }
            | Inline::Italic { children }
            | Inline::Strike { children }
            | Inline::Link { children, .. } => out.push_str(&plain_text(children)),
        }
    }
    out
}
