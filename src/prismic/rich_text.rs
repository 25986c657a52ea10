//! Structured text fields
//!
//! Rich text arrives as a list of blocks, each with its plain text and a
//! list of inline spans addressed by UTF-16 offsets into that text.

use serde::{Deserialize, Serialize};

use crate::helpers::escape_html;

/// One block of a rich text field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<Span>,

    /// Image blocks only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl RichTextBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: "paragraph".to_string(),
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Inline formatting over `[start, end)` of a block's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

pub type RichText = Vec<RichTextBlock>;

/// A text field stored either as a key-text string or as rich text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextField {
    Plain(String),
    Rich(RichText),
}

impl Default for TextField {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

impl TextField {
    pub fn as_text(&self) -> String {
        match self {
            Self::Plain(s) => s.clone(),
            Self::Rich(blocks) => as_text(blocks),
        }
    }
}

/// Plain text of a rich text field, blocks joined by a single space
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// HTML rendering of a rich text field
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list_tag = match block.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list_tag {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list_tag;
        }

        match block.kind.as_str() {
            "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
                let level = &block.kind["heading".len()..];
                html.push_str(&format!(
                    "<h{level}>{}</h{level}>",
                    render_spans(&block.text, &block.spans)
                ));
            }
            "preformatted" => {
                html.push_str(&format!("<pre>{}</pre>", escape_html(&block.text)));
            }
            "list-item" | "o-list-item" => {
                html.push_str(&format!(
                    "<li>{}</li>",
                    render_spans(&block.text, &block.spans)
                ));
            }
            "image" => {
                if let Some(url) = &block.url {
                    html.push_str(&format!(
                        r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                        escape_html(url),
                        escape_html(block.alt.as_deref().unwrap_or(""))
                    ));
                }
            }
            _ => {
                html.push_str(&format!(
                    "<p>{}</p>",
                    render_spans(&block.text, &block.spans)
                ));
            }
        }
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

/// Inline markup for one block
///
/// Span offsets count UTF-16 code units. Tags are opened and closed per
/// character, so spans that overlap without nesting are split at the
/// inner boundary instead of leaking past their end.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let len = text.encode_utf16().count();
    let mut spans: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.end <= len)
        .collect();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut offset = 0;

    for c in text.chars() {
        let active: Vec<&Span> = spans
            .iter()
            .copied()
            .filter(|s| s.start <= offset && offset < s.end)
            .collect();

        let keep = open
            .iter()
            .zip(&active)
            .take_while(|(a, b)| std::ptr::eq(**a, **b))
            .count();
        while open.len() > keep {
            if let Some(span) = open.pop() {
                out.push_str(close_tag(span));
            }
        }
        for span in &active[keep..] {
            out.push_str(&open_tag(span));
            open.push(span);
        }

        if c == '\n' {
            out.push_str("<br />");
        } else {
            let mut buf = [0u8; 4];
            out.push_str(&escape_html(c.encode_utf8(&mut buf)));
        }
        offset += c.len_utf16();
    }

    while let Some(span) = open.pop() {
        out.push_str(close_tag(span));
    }

    out
}

fn open_tag(span: &Span) -> String {
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => {
            let data = span.data.clone().unwrap_or_default();
            let url = escape_html(data.url.as_deref().unwrap_or("#"));
            match data.target {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener">"#,
                    url,
                    escape_html(&target)
                ),
                None => format!(r#"<a href="{}">"#, url),
            }
        }
        "label" => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.label.as_deref())
                .unwrap_or("");
            format!(r#"<span class="{}">"#, escape_html(label))
        }
        _ => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        _ => "</span>",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize, kind: &str) -> Span {
        Span {
            start,
            end,
            kind: kind.to_string(),
            data: None,
        }
    }

    #[test]
    fn test_as_text_joins_blocks() {
        let blocks = vec![
            RichTextBlock::paragraph("Lorem ipsum"),
            RichTextBlock::paragraph("dolor sit amet"),
        ];
        assert_eq!(as_text(&blocks), "Lorem ipsum dolor sit amet");
        assert_eq!(as_text(&[]), "");
    }

    #[test]
    fn test_text_field_accepts_both_shapes() {
        let plain: TextField = serde_json::from_str(r#""Como utilizar Hooks""#).unwrap();
        assert_eq!(plain.as_text(), "Como utilizar Hooks");

        let rich: TextField =
            serde_json::from_str(r#"[{"type":"heading1","text":"Criando um app","spans":[]}]"#)
                .unwrap();
        assert_eq!(rich.as_text(), "Criando um app");
    }

    #[test]
    fn test_as_html_spans_and_escaping() {
        let mut block = RichTextBlock::paragraph("Use <b> and hooks");
        block.spans = vec![span(0, 3, "strong"), span(12, 17, "em")];
        assert_eq!(
            as_html(&[block]),
            "<p><strong>Use</strong> &lt;b&gt; and <em>hooks</em></p>"
        );
    }

    #[test]
    fn test_as_html_hyperlink() {
        let mut block = RichTextBlock::paragraph("see docs");
        block.spans = vec![Span {
            start: 4,
            end: 8,
            kind: "hyperlink".to_string(),
            data: Some(SpanData {
                url: Some("https://reactjs.org".to_string()),
                target: None,
                label: None,
            }),
        }];
        assert_eq!(
            as_html(&[block]),
            r#"<p>see <a href="https://reactjs.org">docs</a></p>"#
        );
    }

    #[test]
    fn test_as_html_groups_list_items() {
        let item = |text: &str, kind: &str| RichTextBlock {
            kind: kind.to_string(),
            text: text.to_string(),
            ..Default::default()
        };
        let blocks = vec![
            item("one", "list-item"),
            item("two", "list-item"),
            item("first", "o-list-item"),
            RichTextBlock::paragraph("end"),
        ];
        assert_eq!(
            as_html(&blocks),
            "<ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><p>end</p>"
        );
    }

    #[test]
    fn test_as_html_ignores_out_of_range_spans() {
        let mut block = RichTextBlock::paragraph("short");
        block.spans = vec![span(2, 40, "strong")];
        assert_eq!(as_html(&[block]), "<p>short</p>");
    }

    #[test]
    fn test_span_offsets_count_utf16_units() {
        // The rocket takes two UTF-16 units
        let mut block = RichTextBlock::paragraph("🚀 hooks");
        block.spans = vec![span(3, 8, "strong")];
        assert_eq!(as_html(&[block]), "<p>🚀 <strong>hooks</strong></p>");

        let mut block = RichTextBlock::paragraph("ação rápida");
        block.spans = vec![span(5, 11, "em")];
        assert_eq!(as_html(&[block]), "<p>ação <em>rápida</em></p>");
    }

    #[test]
    fn test_overlapping_spans_are_split() {
        let mut block = RichTextBlock::paragraph("hello world");
        block.spans = vec![span(0, 5, "strong"), span(3, 8, "em")];
        assert_eq!(
            as_html(&[block]),
            "<p><strong>hel<em>lo</em></strong><em> wo</em>rld</p>"
        );
    }

    #[test]
    fn test_nested_spans_and_line_breaks() {
        let mut block = RichTextBlock::paragraph("one\ntwo three");
        block.spans = vec![span(0, 13, "strong"), span(4, 7, "em")];
        assert_eq!(
            as_html(&[block]),
            "<p><strong>one<br /><em>two</em> three</strong></p>"
        );
    }
}
