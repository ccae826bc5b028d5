//! Conversation history display component

use crate::events::Turn;
use crate::ui::conversation::markdown::markdown_lines;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Read-only view of the turn history for one frame
pub struct HistoryView<'a> {
    pub turns: &'a [Turn],
    /// Turn whose follow-up is in flight
    pub busy_turn: Option<usize>,
    /// Show the thinking line for a composer submission
    pub thinking: bool,
    pub show_facts: bool,
    /// Lines scrolled up from the bottom
    pub scroll_offset: usize,
    pub spinner: &'a str,
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Conversation");

        let inner_area = block.inner(area);
        block.render(area, buf);

        let all_lines = if self.turns.is_empty() && !self.thinking {
            welcome_lines()
        } else {
            self.lines(inner_area.width)
        };

        // Show the bottom of the transcript, shifted up by the scroll offset
        let height = inner_area.height as usize;
        let total = all_lines.len();
        let max_offset = total.saturating_sub(height);
        let offset = self.scroll_offset.min(max_offset);
        let end = total - offset;
        let start = end.saturating_sub(height);

        for (i, line) in all_lines[start..end].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

impl HistoryView<'_> {
    fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let wrap_width = width.saturating_sub(4) as usize;

        for (index, turn) in self.turns.iter().enumerate() {
            lines.extend(self.render_turn(index, turn, wrap_width));
            lines.push(Line::from(""));
        }

        if self.thinking {
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", self.spinner), Style::default().fg(Color::Yellow)),
                Span::styled("Retrieving and reasoning...", Style::default().fg(Color::Green)),
            ]));
        }

        lines
    }

    fn render_turn(&self, index: usize, turn: &Turn, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let dim = Style::default().fg(Color::DarkGray);
        let heading = Style::default().add_modifier(Modifier::BOLD);

        let timestamp = turn.received_at().format("%H:%M:%S").to_string();
        lines.push(Line::from(vec![Span::styled(
            format!("👤 Turn {} · {} {}", index + 1, timestamp, "─".repeat(20)),
            dim,
        )]));
        for line in wrap_text(turn.user_query(), width) {
            lines.push(indented(line, Style::default().fg(Color::Blue)));
        }

        if self.show_facts {
            lines.push(Line::from(vec![Span::styled("📚 Top Retrieved Facts", heading)]));
            if turn.facts().is_empty() {
                lines.push(indented("No facts retrieved.".to_string(), dim));
            }
            for fact in turn.facts() {
                for (i, line) in wrap_text(fact, width.saturating_sub(2)).into_iter().enumerate() {
                    let bullet = if i == 0 { "• " } else { "  " };
                    lines.push(indented(format!("{bullet}{line}"), Style::default()));
                }
            }
        }

        lines.push(Line::from(vec![Span::styled("🤖 Response", heading)]));
        if turn.response().trim().is_empty() {
            lines.push(indented("No response generated.".to_string(), dim));
        } else {
            lines.extend(markdown_lines(turn.response(), width));
        }

        if !turn.suggested_questions().is_empty() {
            lines.push(Line::from(vec![
                Span::styled("💡 Suggested Follow-Ups", heading.fg(Color::Yellow)),
                Span::styled(format!("  /follow {} <n>", index + 1), dim),
            ]));

            if self.busy_turn == Some(index) {
                lines.push(indented(
                    format!("{} asking follow-up...", self.spinner),
                    Style::default().fg(Color::Yellow),
                ));
            }

            for (n, question) in turn.suggested_questions().iter().enumerate() {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(format!("[{}] ", n + 1), Style::default().fg(Color::Cyan)),
                    Span::styled(question.clone(), Style::default().fg(Color::Green)),
                ]));
            }
        }

        lines
    }
}

fn indented(text: String, style: Style) -> Line<'static> {
    Line::from(vec![Span::raw("  "), Span::styled(text, style)])
}

fn welcome_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(vec![Span::styled("Welcome to ragchat! 🚀", Style::default().fg(Color::Green))]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Ask a question below, e.g. \"How can I view and pay my bill?\"",
            Style::default().fg(Color::Gray),
        )]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Type /help for commands.",
            Style::default().fg(Color::DarkGray),
        )]),
    ]
}

/// Wrap text to fit within the given width
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        let current_len = current_line.chars().count();
        let word_len = word.chars().count();
        if current_len == 0 || current_len + word_len + 1 <= width {
            if current_len > 0 {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line.push_str(word);
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Plain-text rendering of a turn for non-interactive output
pub fn plain_text(turn: &Turn, show_facts: bool) -> String {
    let mut out = String::new();

    if show_facts {
        out.push_str("Top Retrieved Facts:\n");
        if turn.facts().is_empty() {
            out.push_str("  No facts retrieved.\n");
        }
        for fact in turn.facts() {
            out.push_str(&format!("  - {fact}\n"));
        }
        out.push('\n');
    }

    if turn.response().trim().is_empty() {
        out.push_str("No response generated.\n");
    } else {
        out.push_str(turn.response().trim_end());
        out.push('\n');
    }

    if !turn.suggested_questions().is_empty() {
        out.push_str("\nSuggested Follow-Ups:\n");
        for (n, question) in turn.suggested_questions().iter().enumerate() {
            out.push_str(&format!("  [{}] {}\n", n + 1, question));
        }
    }

    out
}
