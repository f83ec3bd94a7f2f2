//! Highlight-kind to terminal colour mapping.
//!
//! A fixed 16-colour table; a future theme layer would replace this lookup.

use core_syntax::HighlightKind;
use crossterm::style::Color;

pub fn highlight_color(kind: HighlightKind) -> Option<Color> {
    match kind {
        HighlightKind::Normal => None,
        HighlightKind::Keyword => Some(Color::Yellow),
        HighlightKind::Type => Some(Color::Cyan),
        HighlightKind::String => Some(Color::Green),
        HighlightKind::Number => Some(Color::Magenta),
        HighlightKind::Comment => Some(Color::DarkGrey),
        HighlightKind::Operator => Some(Color::White),
        HighlightKind::Function => Some(Color::Blue),
        HighlightKind::Variable => Some(Color::White),
        HighlightKind::Constant => Some(Color::Red),
        HighlightKind::Preprocessor => Some(Color::DarkMagenta),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_text_has_no_color() {
        assert!(highlight_color(HighlightKind::Normal).is_none());
        assert!(highlight_color(HighlightKind::Keyword).is_some());
    }
}
