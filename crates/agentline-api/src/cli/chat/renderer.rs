//! Terminal markdown rendering for agent replies.

use termimad::MadSkin;
use termimad::crossterm::style::Color;

pub struct ChatRenderer {
    skin: MadSkin,
}

impl Default for ChatRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatRenderer {
    pub fn new() -> Self {
        let mut skin = MadSkin::default_dark();
        skin.bold.set_fg(Color::Cyan);
        skin.headers[0].set_fg(Color::Cyan);
        skin.headers[1].set_fg(Color::Cyan);
        skin.inline_code.set_fg(Color::Yellow);
        Self { skin }
    }

    /// Render a stored reply as terminal markdown.
    pub fn render(&self, reply: &str) -> String {
        self.skin.term_text(&normalize_reply(reply)).to_string()
    }
}

/// Models sometimes emit a literal backslash-n instead of a newline.
pub fn normalize_reply(reply: &str) -> String {
    reply.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_newlines_become_real() {
        assert_eq!(normalize_reply(r"line one\nline two"), "line one\nline two");
        assert_eq!(normalize_reply("already\nfine"), "already\nfine");
    }

    #[test]
    fn render_keeps_text() {
        let rendered = ChatRenderer::new().render(r"**Paris**\nis the capital");
        assert!(rendered.contains("Paris"));
        assert!(rendered.contains("is the capital"));
    }
}
