pub mod style;

use crate::api::{ChatMessage, Delivery, MessageRole, SessionSummary};
use crate::controller::Renderer;
use crate::utils::text::{format_text, format_tokens, truncate_with_ellipsis};
use anyhow::Context;
use std::path::PathBuf;

/// Map transcript markup back to terminal text: break markers become
/// newlines, anchors collapse to their label, entities decode. The inverse of
/// what a browser does with the same markup, so raw strings are still escaped
/// exactly once on the way through.
#[must_use]
pub fn render_markup(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("<br>") {
            out.push('\n');
            rest = tail;
        } else if rest.starts_with("<a href=\"")
            && let Some(open_end) = rest.find('>')
            && let Some(close) = rest[open_end + 1..].find("</a>")
        {
            let label = &rest[open_end + 1..open_end + 1 + close];
            out.push_str(label);
            rest = &rest[open_end + 1 + close + 4..];
        } else if let Some(tail) = rest.strip_prefix("&amp;") {
            out.push('&');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("&lt;") {
            out.push('<');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("&gt;") {
            out.push('>');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("&quot;") {
            out.push('"');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("&#39;") {
            out.push('\'');
            rest = tail;
        } else {
            let c = rest.chars().next().unwrap_or_default();
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }

    out
}

/// Prints the session sidebar and transcript to stdout and writes export
/// blobs to disk. The `dark_mode` preference picks the label palette.
pub struct TerminalRenderer {
    show_tokens: bool,
    dark_mode: bool,
    export_dir: PathBuf,
}

impl TerminalRenderer {
    pub fn new(show_tokens: bool, dark_mode: bool, export_dir: PathBuf) -> Self {
        Self {
            show_tokens,
            dark_mode,
            export_dir,
        }
    }

    fn label(&self, role: MessageRole) -> String {
        let text = match role {
            MessageRole::User => "YOU",
            MessageRole::Assistant => "BOT",
        };
        if self.dark_mode {
            match role {
                MessageRole::User => style::accent(text),
                MessageRole::Assistant => style::value(text),
            }
        } else {
            style::header(text)
        }
    }

    fn print_message(&self, message: &ChatMessage) {
        let body = render_markup(&format_text(&message.content));
        println!("{} {}", self.label(message.role), body);

        if let Some(file) = &message.file {
            println!("    {}", style::dim(format!("ATTACH {file}")));
        }
        if message.delivery == Delivery::Failed {
            println!("    {}", style::warning("FAILED — not delivered"));
        }
        if self.show_tokens
            && let Some(tokens) = &message.tokens
        {
            println!("    {}", style::dim(format_tokens(tokens)));
        }
    }
}

impl Renderer for TerminalRenderer {
    fn sessions(&mut self, sessions: &[SessionSummary], active: Option<&str>) {
        println!("{}", style::header("SESSIONS"));
        for session in sessions {
            let marker = if Some(session.id.as_str()) == active {
                style::accent("▸")
            } else {
                " ".to_string()
            };
            let title = if session.title.is_empty() {
                "New Chat".to_string()
            } else {
                truncate_with_ellipsis(&session.title, 40)
            };
            let provider = session
                .provider
                .map_or_else(|| "google".to_string(), |p| p.to_string());
            let meta = format!(
                "{provider} | {} | {} msgs",
                session.model.as_deref().unwrap_or(""),
                session.message_count
            );
            println!("{marker} {title}  {}", style::dim(meta));
        }
        if sessions.is_empty() {
            println!("{}", style::dim("  (none)"));
        }
    }

    fn transcript(&mut self, messages: &[ChatMessage]) {
        println!("{}", style::dim("────────────────────────────"));
        for message in messages {
            self.print_message(message);
        }
        if messages.is_empty() {
            println!("{}", style::dim("  (empty)"));
        }
    }

    fn append(&mut self, message: &ChatMessage) {
        self.print_message(message);
    }

    fn notice(&mut self, text: &str) {
        println!("{}", style::warning(text));
    }

    fn export(&mut self, filename: &str, payload: &serde_json::Value) -> anyhow::Result<()> {
        let path = self.export_dir.join(filename);
        let body = serde_json::to_string_pretty(payload).context("serialize export payload")?;
        std::fs::write(&path, body)
            .with_context(|| format!("write export to {}", path.display()))?;
        println!("{}", style::value(format!("Saved {}", path.display())));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_markup_round_trips_escaped_text() {
        let raw = "a < b & 'c' > \"d\"";
        assert_eq!(render_markup(&format_text(raw)), raw);
    }

    #[test]
    fn render_markup_turns_breaks_into_newlines() {
        assert_eq!(render_markup(&format_text("one\r\ntwo\nthree")), "one\ntwo\nthree");
    }

    #[test]
    fn render_markup_collapses_anchor_to_label() {
        let rendered = render_markup(&format_text("see http://x.com now"));
        assert_eq!(rendered, "see http://x.com now");
    }

    #[test]
    fn export_writes_pretty_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut renderer = TerminalRenderer::new(false, false, dir.path().to_path_buf());
        let payload = serde_json::json!({"version": "v3", "sessions": []});
        renderer.export("chat-sessions.json", &payload).unwrap();

        let written = std::fs::read_to_string(dir.path().join("chat-sessions.json")).unwrap();
        assert!(written.contains("\"version\": \"v3\""));
    }
}
