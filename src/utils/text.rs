use crate::api::TokenUsage;

/// Escape the five characters significant to markup injection.
#[must_use]
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Transform raw message text into safe transcript markup: escape, convert
/// each line terminator (CR, LF, or CRLF) to one `<br>`, and wrap bare
/// `http(s)://` runs in anchors.
///
/// Not idempotent — escaping applied twice double-encodes. Callers format
/// each raw string exactly once.
#[must_use]
pub fn format_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("<br>");
            }
            '\n' => out.push_str("<br>"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    linkify(&out)
}

/// Wrap bare URLs in anchor markup. Runs after escaping, so a URL token ends
/// at whitespace or at an inserted marker.
fn linkify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = next_url_start(rest) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let end = tail
            .find(|c: char| c.is_whitespace() || c == '<')
            .unwrap_or(tail.len());
        let url = &tail[..end];
        out.push_str("<a href=\"");
        out.push_str(url);
        out.push_str("\" target=\"_blank\">");
        out.push_str(url);
        out.push_str("</a>");
        rest = &tail[end..];
    }

    out.push_str(rest);
    out
}

fn next_url_start(text: &str) -> Option<usize> {
    let http = text.find("http://");
    let https = text.find("https://");
    match (http, https) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Token-usage line shown under a message when enabled.
#[must_use]
pub fn format_tokens(tokens: &TokenUsage) -> String {
    let field = |value: Option<u64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
    format!(
        "TOKENS P:{} O:{} T:{}",
        field(tokens.prompt),
        field(tokens.output),
        field(tokens.total)
    )
}

#[must_use]
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let truncated = &s[..idx];
            format!("{}...", truncated.trim_end())
        }
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_five_markup_characters() {
        assert_eq!(
            escape_markup(r#"<b>"fish" & 'chips'</b>"#),
            "&lt;b&gt;&quot;fish&quot; &amp; &#39;chips&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn formatted_output_contains_no_raw_markup_characters() {
        let formatted = format_text("a < b && c > d");
        let stripped = formatted.replace("<br>", "");
        assert!(!stripped.contains('<'));
        assert!(!stripped.contains('>'));
        assert!(!stripped.contains("& "));
    }

    #[test]
    fn break_marker_count_matches_terminator_count() {
        // Three terminators in three styles: LF, CRLF, CR.
        let formatted = format_text("one\ntwo\r\nthree\rfour");
        assert_eq!(formatted.matches("<br>").count(), 3);
        assert_eq!(formatted, "one<br>two<br>three<br>four");
    }

    #[test]
    fn crlf_is_a_single_terminator() {
        assert_eq!(format_text("a\r\nb"), "a<br>b");
        assert_eq!(format_text("a\r\n\r\nb"), "a<br><br>b");
    }

    #[test]
    fn bare_url_becomes_anchor_wrapping_exactly_that_substring() {
        let formatted = format_text("see http://x.com for details");
        assert_eq!(
            formatted,
            "see <a href=\"http://x.com\" target=\"_blank\">http://x.com</a> for details"
        );
    }

    #[test]
    fn https_url_followed_by_newline_stays_clean() {
        let formatted = format_text("https://example.org/a?x=1\nnext");
        assert_eq!(
            formatted,
            "<a href=\"https://example.org/a?x=1\" target=\"_blank\">https://example.org/a?x=1</a><br>next"
        );
    }

    #[test]
    fn multiple_urls_are_each_wrapped() {
        let formatted = format_text("http://a.io and https://b.io");
        assert_eq!(formatted.matches("<a href=").count(), 2);
        assert!(formatted.contains(">http://a.io</a>"));
        assert!(formatted.contains(">https://b.io</a>"));
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(format_text("hello world"), "hello world");
        assert_eq!(format_text(""), "");
    }

    #[test]
    fn escaping_is_not_idempotent() {
        let once = format_text("&");
        let twice = format_text(&once);
        assert_eq!(once, "&amp;");
        assert_eq!(twice, "&amp;amp;");
    }

    #[test]
    fn token_line_uses_placeholders_for_missing_counts() {
        let full = TokenUsage {
            prompt: Some(12),
            output: Some(34),
            total: Some(46),
        };
        assert_eq!(format_tokens(&full), "TOKENS P:12 O:34 T:46");

        let partial = TokenUsage {
            prompt: Some(5),
            output: None,
            total: None,
        };
        assert_eq!(format_tokens(&partial), "TOKENS P:5 O:- T:-");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_with_ellipsis("hello world", 5), "hello...");
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
        assert_eq!(truncate_with_ellipsis("ад рт", 4), "ад р...");
    }
}
