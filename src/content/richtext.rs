//! Prismic rich text: blocks with formatting spans

use serde::{Deserialize, Serialize};

use crate::helpers::html_escape;

/// A CMS field that is either a plain string or structured rich text.
///
/// The variant is decided once at deserialization: a JSON string becomes
/// `Plain`, a JSON array of blocks becomes `Structured`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RichField {
    Plain(String),
    Structured(RichText),
}

impl Default for RichField {
    fn default() -> Self {
        RichField::Plain(String::new())
    }
}

impl From<&str> for RichField {
    fn from(s: &str) -> Self {
        RichField::Plain(s.to_string())
    }
}

impl RichField {
    /// Plain text with block texts concatenated in order
    pub fn flatten(&self) -> String {
        match self {
            RichField::Plain(s) => s.clone(),
            RichField::Structured(rt) => rt.as_text(""),
        }
    }

    /// Plain text with blocks separated by a space, for word counting
    pub fn as_text(&self) -> String {
        match self {
            RichField::Plain(s) => s.clone(),
            RichField::Structured(rt) => rt.as_text(" "),
        }
    }

    /// HTML for the field; plain strings are trusted markup and pass through
    pub fn as_html(&self) -> String {
        match self {
            RichField::Plain(s) => s.clone(),
            RichField::Structured(rt) => rt.as_html(),
        }
    }
}

/// Ordered rich text blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<Block>);

/// One rich text block (paragraph, heading, list item, image...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Embed>,
}

impl Block {
    /// A block with text and no formatting
    pub fn new(kind: &str, text: &str) -> Self {
        Self {
            kind: kind.to_string(),
            text: text.to_string(),
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: None,
        }
    }
}

/// Formatting applied to `[start, end)` of a block's text (UTF-16 offsets)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// oEmbed payload of an embed block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub embed_url: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub html: Option<String>,
}

impl RichText {
    pub fn blocks(&self) -> &[Block] {
        &self.0
    }

    /// Join the text of every block with `separator`
    pub fn as_text(&self, separator: &str) -> String {
        self.0
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Serialize to HTML, grouping consecutive list items into one list
    pub fn as_html(&self) -> String {
        let mut html = String::new();
        let mut blocks = self.0.iter().peekable();

        while let Some(block) = blocks.next() {
            match block.kind.as_str() {
                "list-item" | "o-list-item" => {
                    let tag = if block.kind == "list-item" { "ul" } else { "ol" };
                    html.push_str(&format!("<{}>", tag));
                    html.push_str(&list_item(block));
                    while let Some(item) = blocks.next_if(|b| b.kind == block.kind) {
                        html.push_str(&list_item(item));
                    }
                    html.push_str(&format!("</{}>", tag));
                }
                _ => html.push_str(&render_block(block)),
            }
        }

        html
    }
}

fn list_item(block: &Block) -> String {
    format!("<li>{}</li>", serialize_spans(&block.text, &block.spans))
}

fn render_block(block: &Block) -> String {
    let kind = block.kind.as_str();
    match kind {
        "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
            let level = &kind["heading".len()..];
            format!(
                "<h{level}>{}</h{level}>",
                serialize_spans(&block.text, &block.spans)
            )
        }
        "preformatted" => format!("<pre>{}</pre>", html_escape(&block.text)),
        "image" => format!(
            r#"<p class="block-img"><img src="{}" alt="{}"></p>"#,
            html_escape(block.url.as_deref().unwrap_or("")),
            html_escape(block.alt.as_deref().unwrap_or(""))
        ),
        "embed" => match &block.oembed {
            Some(embed) => format!(
                r#"<div data-oembed="{}" data-oembed-type="{}">{}</div>"#,
                html_escape(&embed.embed_url),
                html_escape(&embed.kind),
                embed.html.as_deref().unwrap_or("")
            ),
            None => String::new(),
        },
        _ => format!("<p>{}</p>", serialize_spans(&block.text, &block.spans)),
    }
}

/// Part of a span still to be written
#[derive(Clone, Copy)]
struct Piece<'a> {
    start: usize,
    end: usize,
    span: &'a Span,
}

/// Apply spans to text, nesting spans contained in an earlier, wider one.
///
/// A span crossing the end of its parent is split: the inner part closes
/// with the parent and the rest is reopened after it.
fn serialize_spans(text: &str, spans: &[Span]) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let pieces: Vec<Piece> = spans
        .iter()
        .filter(|s| s.start < s.end && s.end <= units.len())
        .map(|span| Piece {
            start: span.start,
            end: span.end,
            span,
        })
        .collect();

    let mut out = String::new();
    write_range(&units, pieces, 0, units.len(), &mut out);
    out
}

fn sort_pieces(pieces: &mut [Piece]) {
    pieces.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
}

fn write_range(
    units: &[u16],
    mut pieces: Vec<Piece>,
    start: usize,
    end: usize,
    out: &mut String,
) {
    sort_pieces(&mut pieces);
    let mut cursor = start;

    while !pieces.is_empty() {
        let mut piece = pieces.remove(0);
        piece.start = piece.start.max(cursor);
        if piece.start >= piece.end {
            continue;
        }

        push_text(&units[cursor..piece.start], out);

        let mut inner = Vec::new();
        let mut rest = Vec::new();
        for other in pieces.drain(..) {
            if other.start >= piece.end {
                rest.push(other);
            } else if other.end <= piece.end {
                inner.push(other);
            } else {
                inner.push(Piece {
                    end: piece.end,
                    ..other
                });
                rest.push(Piece {
                    start: piece.end,
                    ..other
                });
            }
        }

        let (open, close) = span_tags(piece.span);
        out.push_str(&open);
        write_range(units, inner, piece.start, piece.end, out);
        out.push_str(close);

        cursor = piece.end;
        pieces = rest;
        sort_pieces(&mut pieces);
    }

    push_text(&units[cursor..end], out);
}

fn push_text(units: &[u16], out: &mut String) {
    let text = String::from_utf16_lossy(units);
    out.push_str(&html_escape(&text).replace('\n', "<br />"));
}

fn span_tags(span: &Span) -> (String, &'static str) {
    let data = |key: &str| {
        span.data
            .as_ref()
            .and_then(|d| d.get(key))
            .and_then(|v| v.as_str())
            .map(html_escape)
    };

    match span.kind.as_str() {
        "strong" => ("<strong>".to_string(), "</strong>"),
        "em" => ("<em>".to_string(), "</em>"),
        "hyperlink" => {
            let href = data("url").unwrap_or_default();
            match data("target") {
                Some(target) => (
                    format!(r#"<a href="{}" target="{}" rel="noopener">"#, href, target),
                    "</a>",
                ),
                None => (format!(r#"<a href="{}">"#, href), "</a>"),
            }
        }
        "label" => (
            format!(r#"<span class="{}">"#, data("label").unwrap_or_default()),
            "</span>",
        ),
        _ => (String::new(), ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn structured(value: serde_json::Value) -> RichField {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_deserialize_resolves_variant() {
        assert_eq!(structured(json!("Hello")), RichField::Plain("Hello".into()));
        assert!(matches!(
            structured(json!([{ "type": "heading1", "text": "Hi", "spans": [] }])),
            RichField::Structured(_)
        ));
    }

    #[test]
    fn test_flatten_plain_is_identity() {
        let field = RichField::from("  Como utilizar Hooks ");
        assert_eq!(field.flatten(), "  Como utilizar Hooks ");
    }

    #[test]
    fn test_flatten_concatenates_in_order() {
        let field = structured(json!([
            { "type": "heading1", "text": "Criando um app ", "spans": [] },
            { "type": "paragraph", "text": "CRA do zero", "spans": [] }
        ]));
        assert_eq!(field.flatten(), "Criando um app CRA do zero");
        assert_eq!(field.as_text(), "Criando um app  CRA do zero");
    }

    #[test]
    fn test_paragraph_with_nested_spans() {
        let field = structured(json!([{
            "type": "paragraph",
            "text": "Rust is fast",
            "spans": [
                { "start": 0, "end": 12, "type": "em" },
                { "start": 8, "end": 12, "type": "strong" }
            ]
        }]));
        assert_eq!(
            field.as_html(),
            "<p><em>Rust is <strong>fast</strong></em></p>"
        );
    }

    #[test]
    fn test_crossing_spans_are_split() {
        let field = structured(json!([{
            "type": "paragraph",
            "text": "abcdefghij",
            "spans": [
                { "start": 0, "end": 5, "type": "strong" },
                { "start": 3, "end": 8, "type": "em" }
            ]
        }]));
        assert_eq!(
            field.as_html(),
            "<p><strong>abc<em>de</em></strong><em>fgh</em>ij</p>"
        );
    }

    #[test]
    fn test_same_range_spans_nest() {
        let field = structured(json!([{
            "type": "paragraph",
            "text": "bold",
            "spans": [
                { "start": 0, "end": 4, "type": "strong" },
                { "start": 0, "end": 4, "type": "em" }
            ]
        }]));
        assert_eq!(field.as_html(), "<p><strong><em>bold</em></strong></p>");
    }

    #[test]
    fn test_hyperlink_and_escaping() {
        let field = structured(json!([{
            "type": "paragraph",
            "text": "a < b, see docs",
            "spans": [{
                "start": 11, "end": 15, "type": "hyperlink",
                "data": { "link_type": "Web", "url": "https://doc.rust-lang.org", "target": "_blank" }
            }]
        }]));
        assert_eq!(
            field.as_html(),
            r#"<p>a &lt; b, see <a href="https://doc.rust-lang.org" target="_blank" rel="noopener">docs</a></p>"#
        );
    }

    #[test]
    fn test_list_items_are_grouped() {
        let field = structured(json!([
            { "type": "list-item", "text": "one", "spans": [] },
            { "type": "list-item", "text": "two", "spans": [] },
            { "type": "o-list-item", "text": "first", "spans": [] },
            { "type": "heading2", "text": "End", "spans": [] }
        ]));
        assert_eq!(
            field.as_html(),
            "<ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><h2>End</h2>"
        );
    }

    #[test]
    fn test_image_and_preformatted() {
        let field = structured(json!([
            { "type": "image", "url": "https://images.prismic.io/a.png", "alt": "A" },
            { "type": "preformatted", "text": "fn main() {}\n", "spans": [] }
        ]));
        assert_eq!(
            field.as_html(),
            r#"<p class="block-img"><img src="https://images.prismic.io/a.png" alt="A"></p><pre>fn main() {}
</pre>"#
        );
    }

    #[test]
    fn test_span_offsets_are_utf16() {
        let field = structured(json!([{
            "type": "paragraph",
            "text": "ação é boa",
            "spans": [{ "start": 5, "end": 6, "type": "strong" }]
        }]));
        assert_eq!(field.as_html(), "<p>ação <strong>é</strong> boa</p>");
    }

    #[test]
    fn test_line_breaks() {
        let field = structured(json!([
            { "type": "paragraph", "text": "one\ntwo", "spans": [] }
        ]));
        assert_eq!(field.as_html(), "<p>one<br />two</p>");
    }

    #[test]
    fn test_plain_html_passes_through() {
        let field = RichField::from("<p>raw</p>");
        assert_eq!(field.as_html(), "<p>raw</p>");
    }
}
