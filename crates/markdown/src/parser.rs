//! Block and inline parsing.

use regex::Regex;

use crate::nodes::{Block, Inline};

#[allow(clippy::unwrap_used)]
static FENCE_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^[ \t]{0,3}```[ \t]*([A-Za-z0-9_+#.-]*)[ \t]*$").unwrap()
});

#[allow(clippy::unwrap_used)]
static HEADING_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^(#{1,6})[ \t]+(.+?)[ \t]*$").unwrap());

#[allow(clippy::unwrap_used)]
static RULE_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^[ \t]{0,3}(?:(?:\*[ \t]*){3,}|(?:-[ \t]*){3,}|(?:_[ \t]*){3,})$").unwrap()
});

#[allow(clippy::unwrap_used)]
static BULLET_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^[ \t]{0,3}[-*+][ \t]+(.+)$").unwrap());

#[allow(clippy::unwrap_used)]
static ORDERED_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^[ \t]{0,3}(\d{1,9})[.)][ \t]+(.+)$").unwrap());

#[allow(clippy::unwrap_used)]
static INLINE_CODE_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

#[allow(clippy::unwrap_used)]
static LINK_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());

#[allow(clippy::unwrap_used)]
static URL_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"https?://[^\s<>\[\]()]+").unwrap());

#[allow(clippy::unwrap_used)]
static BOLD_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*|__(.+?)__").unwrap());

#[allow(clippy::unwrap_used)]
static STRIKE_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"~~(.+?)~~").unwrap());

#[allow(clippy::unwrap_used)]
static ITALIC_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*").unwrap());

/// Deepest block quote nesting; further `>` markers stay literal text.
pub const MAX_QUOTE_DEPTH: usize = 32;

/// Parse Markdown source into blocks.
#[must_use]
pub fn parse(source: &str) -> Vec<Block> {
    let normalized = source.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.lines().collect();
    parse_lines(&lines, 0)
}

fn parse_lines(lines: &[&str], depth: usize) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.trim().is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            i += 1;
            continue;
        }

        if let Some(caps) = FENCE_RE.captures(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let lang = caps
                .get(1)
                .map(|m| m.as_str())
                .filter(|l| !l.is_empty())
                .map(str::to_string);

            let mut code = Vec::new();
            i += 1;
            while i < lines.len() && !lines[i].trim_start().starts_with("```") {
                code.push(lines[i]);
                i += 1;
            }
            // Skip the closing fence; an unclosed fence runs to the end
            i += 1;

            blocks.push(Block::CodeBlock {
                code: code.join("\n"),
                lang,
            });
            continue;
        }

        if let Some(caps) = HEADING_RE.captures(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let level = caps.get(1).map_or(1, |m| m.as_str().len()) as u8;
            let raw = caps.get(2).map_or("", |m| m.as_str());
            let text = match raw.trim_end_matches('#').trim_end() {
                "" => raw,
                stripped => stripped,
            };
            blocks.push(Block::Heading {
                level,
                children: parse_inline(text),
            });
            i += 1;
            continue;
        }

        if RULE_RE.is_match(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Rule);
            i += 1;
            continue;
        }

        if depth < MAX_QUOTE_DEPTH && line.trim_start().starts_with('>') {
            flush_paragraph(&mut paragraph, &mut blocks);
            let mut quoted = Vec::new();
            while i < lines.len() {
                let Some(rest) = lines[i].trim_start().strip_prefix('>') else {
                    break;
                };
                quoted.push(rest.strip_prefix(' ').unwrap_or(rest));
                i += 1;
            }
            blocks.push(Block::Quote {
                children: parse_lines(&quoted, depth + 1),
            });
            continue;
        }

        if let Some((ordered, start, _)) = list_item(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let mut items: Vec<String> = Vec::new();
            while i < lines.len() {
                let current = lines[i];
                match list_item(current) {
                    Some((kind, _, text)) if kind == ordered => items.push(text.to_string()),
                    Some(_) => break,
                    // Indented lines continue the previous item
                    None if current.starts_with([' ', '\t']) && !current.trim().is_empty() => {
                        if let Some(last) = items.last_mut() {
                            last.push(' ');
                            last.push_str(current.trim());
                        }
                    }
                    None => break,
                }
                i += 1;
            }
            blocks.push(Block::List {
                ordered,
                start,
                items: items.iter().map(|item| parse_inline(item)).collect(),
            });
            continue;
        }

        paragraph.push(line);
        i += 1;
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if paragraph.is_empty() {
        return;
    }
    blocks.push(Block::Paragraph {
        lines: paragraph.iter().map(|l| parse_inline(l.trim())).collect(),
    });
    paragraph.clear();
}

/// Returns `(ordered, number, text)` when `line` starts a list item.
fn list_item(line: &str) -> Option<(bool, u64, &str)> {
    if RULE_RE.is_match(line) {
        return None;
    }
    if let Some(caps) = ORDERED_RE.captures(line) {
        let start = caps
            .get(1)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(1);
        return caps.get(2).map(|m| (true, start, m.as_str()));
    }
    BULLET_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| (false, 1, m.as_str()))
}

/// Inline span found by one of the patterns, before nesting is resolved.
enum Span<'a> {
    Code(&'a str),
    Link { label: &'a str, url: &'a str },
    Url(&'a str),
    Bold(&'a str),
    Strike(&'a str),
    Italic(&'a str),
}

/// Parse inline formatting within a single line.
#[must_use]
pub fn parse_inline(text: &str) -> Vec<Inline> {
    // (start, end, priority, span); lower priority wins at the same start
    let mut matches: Vec<(usize, usize, u8, Span<'_>)> = Vec::new();

    for caps in INLINE_CODE_RE.captures_iter(text) {
        if let (Some(m), Some(code)) = (caps.get(0), caps.get(1)) {
            matches.push((m.start(), m.end(), 0, Span::Code(code.as_str())));
        }
    }

    for caps in LINK_RE.captures_iter(text) {
        if let (Some(m), Some(label), Some(url)) = (caps.get(0), caps.get(1), caps.get(2)) {
            matches.push((
                m.start(),
                m.end(),
                1,
                Span::Link {
                    label: label.as_str(),
                    url: url.as_str(),
                },
            ));
        }
    }

    for m in URL_RE.find_iter(text) {
        let url = m
            .as_str()
            .trim_end_matches(['.', ',', ';', ':', '!', '?', '\'', '"']);
        matches.push((m.start(), m.start() + url.len(), 2, Span::Url(url)));
    }

    for caps in BOLD_RE.captures_iter(text) {
        if let (Some(m), Some(inner)) = (caps.get(0), caps.get(1).or_else(|| caps.get(2))) {
            matches.push((m.start(), m.end(), 3, Span::Bold(inner.as_str())));
        }
    }

    for caps in STRIKE_RE.captures_iter(text) {
        if let (Some(m), Some(inner)) = (caps.get(0), caps.get(1)) {
            matches.push((m.start(), m.end(), 4, Span::Strike(inner.as_str())));
        }
    }

    for caps in ITALIC_RE.captures_iter(text) {
        if let (Some(m), Some(inner)) = (caps.get(0), caps.get(1)) {
            // Part of a bold marker
            if text[..m.start()].ends_with('*') || text[m.end()..].starts_with('*') {
                continue;
            }
            matches.push((m.start(), m.end(), 5, Span::Italic(inner.as_str())));
        }
    }

    matches.sort_by_key(|(start, _, priority, _)| (*start, *priority));

    let mut nodes = Vec::new();
    let mut pos = 0;
    for (start, end, _, span) in matches {
        // Overlaps an earlier match
        if start < pos {
            continue;
        }
        if start > pos {
            nodes.push(Inline::Text {
                text: text[pos..start].to_string(),
            });
        }
        nodes.push(match span {
            Span::Code(code) => Inline::Code {
                code: code.to_string(),
            },
            Span::Link { label, url } => Inline::Link {
                url: url.to_string(),
                children: parse_inline(label),
            },
            Span::Url(url) => Inline::Url {
                url: url.to_string(),
            },
            Span::Bold(inner) => Inline::Bold {
                children: parse_inline(inner),
            },
            Span::Strike(inner) => Inline::Strike {
                children: parse_inline(inner),
            },
            Span::Italic(inner) => Inline::Italic {
                children: parse_inline(inner),
            },
        });
        pos = end;
    }

    if pos < text.len() {
        nodes.push(Inline::Text {
            text: text[pos..].to_string(),
        });
    }

    nodes
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_requires_space() {
        assert!(matches!(parse("## Title")[0], Block::Heading { level: 2, .. }));
        assert!(matches!(parse("#hashtag")[0], Block::Paragraph { .. }));
    }

    #[test]
    fn test_closing_hashes_are_stripped() {
        let blocks = parse("# Title ##");
        let Block::Heading { children, .. } = &blocks[0] else {
            panic!("Expected heading");
        };
        assert_eq!(crate::nodes::plain_text(children), "Title");
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let blocks = parse("```\nlet x = 1;\nlet y = 2;");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                code: "let x = 1;\nlet y = 2;".to_string(),
                lang: None,
            }]
        );
    }

    #[test]
    fn test_rule_is_not_a_list() {
        assert_eq!(parse("* * *"), vec![Block::Rule]);
        assert_eq!(parse("---"), vec![Block::Rule]);
    }

    #[test]
    fn test_ordered_list_start() {
        let blocks = parse("3. three\n4. four");
        let Block::List { ordered, start, items } = &blocks[0] else {
            panic!("Expected list");
        };
        assert!(*ordered);
        assert_eq!(*start, 3);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_list_continuation_line() {
        let blocks = parse("- first\n  continued\n- second");
        let Block::List { items, .. } = &blocks[0] else {
            panic!("Expected list");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(crate::nodes::plain_text(&items[0]), "first continued");
    }

    #[test]
    fn test_quote_nesting_is_capped() {
        let source = format!("{} hi", ">".repeat(50_000));
        let mut blocks = parse(&source);

        let mut depth = 0;
        while let [Block::Quote { children }] = blocks.as_slice() {
            blocks = children.clone();
            depth += 1;
        }

        assert_eq!(depth, MAX_QUOTE_DEPTH);
        let [Block::Paragraph { lines }] = blocks.as_slice() else {
            panic!("Expected the remaining markers as a paragraph");
        };
        assert!(crate::nodes::plain_text(&lines[0]).ends_with("> hi"));
    }

    #[test]
    fn test_bold_wins_over_italic() {
        let nodes = parse_inline("**bold**");
        assert!(matches!(nodes[0], Inline::Bold { .. }));
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_code_is_not_formatted() {
        let nodes = parse_inline("`**raw**`");
        assert_eq!(
            nodes,
            vec![Inline::Code {
                code: "**raw**".to_string()
            }]
        );
    }

    #[test]
    fn test_url_trailing_punctuation() {
        let nodes = parse_inline("see https://example.com.");
        assert_eq!(
            nodes[1],
            Inline::Url {
                url: "https://example.com".to_string()
            }
        );
        assert_eq!(
            nodes[2],
            Inline::Text {
                text: ".".to_string()
            }
        );
    }

    #[test]
    fn test_link_label_is_parsed() {
        let nodes = parse_inline("[**docs**](https://example.com/docs)");
        let Inline::Link { url, children } = &nodes[0] else {
            panic!("Expected link");
        };
        assert_eq!(url, "https://example.com/docs");
        assert!(matches!(children[0], Inline::Bold { .. }));
    }
}
