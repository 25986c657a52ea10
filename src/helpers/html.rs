//! HTML helper functions

use crate::config::CommentsConfig;

/// Escape text for use in HTML content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Cut `s` to at most `length` characters, appending `omission` when cut
///
/// Operates on raw text; escape the result, not the input.
pub fn truncate_chars(s: &str, length: usize, omission: &str) -> String {
    if s.chars().count() <= length {
        return s.to_string();
    }
    let truncated: String = s.chars().take(length).collect();
    format!("{}{}", truncated.trim_end(), omission)
}

/// utterances comment widget script tag
///
/// # Examples
/// ```ignore
/// comments_widget(&config) // -> <script src="https://utteranc.es/client.js" repo="..." ...></script>
/// ```
pub fn comments_widget(config: &CommentsConfig) -> Option<String> {
    if config.repo.trim().is_empty() {
        return None;
    }

    let label = config
        .label
        .as_deref()
        .map(|l| format!(r#" label="{}""#, escape_html(l)))
        .unwrap_or_default();

    Some(format!(
        r#"<script src="https://utteranc.es/client.js" repo="{}" issue-term="{}" theme="{}"{} crossorigin="anonymous" async></script>"#,
        escape_html(&config.repo),
        escape_html(&config.issue_term),
        escape_html(&config.theme),
        label
    ))
}
