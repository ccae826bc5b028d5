//! Markdown answers rendered to styled, wrapped lines

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Left margin shared by every answer line
const MARGIN: usize = 2;

/// Render `text` as markdown, wrapping words at `width` columns (0 disables wrapping)
pub fn markdown_lines(text: &str, width: usize) -> Vec<Line<'static>> {
    let mut state = RenderState::new(width);
    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        state.handle_event(event);
    }
    state.finish()
}

struct RenderState {
    /// Column limit including the margin
    limit: usize,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    current_width: usize,
    /// Whitespace was seen since the last word on this line
    pending_space: bool,
    /// A blank line goes before the next block
    needs_blank: bool,
    style_stack: Vec<Style>,
    list_stack: Vec<ListLevel>,
    /// Set between an item marker and its first word
    at_item_start: bool,
    link_url: Option<String>,
    in_code_block: bool,
}

impl RenderState {
    fn new(width: usize) -> Self {
        Self {
            limit: if width == 0 { usize::MAX } else { width + MARGIN },
            lines: Vec::new(),
            current: Vec::new(),
            current_width: 0,
            pending_space: false,
            needs_blank: false,
            style_stack: Vec::new(),
            list_stack: Vec::new(),
            at_item_start: false,
            link_url: None,
            in_code_block: false,
        }
    }

    fn handle_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) if self.in_code_block => self.push_code_block(&text),
            Event::Text(text) => self.push_text(&text, self.style()),
            Event::Code(code) => self.push_text(&code, self.style().patch(code_style())),
            Event::SoftBreak => self.pending_space = true,
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.start_block();
                let rule_width = self.limit.min(40).saturating_sub(MARGIN);
                self.lines.push(Line::from(vec![
                    Span::raw(" ".repeat(MARGIN)),
                    Span::styled("─".repeat(rule_width), Style::default().fg(Color::DarkGray)),
                ]));
                self.needs_blank = true;
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if !self.at_item_start {
                    self.start_block();
                }
            }
            Tag::Heading { .. } => {
                self.start_block();
                self.style_stack
                    .push(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD));
            }
            Tag::List(start) => {
                if self.list_stack.is_empty() {
                    self.start_block();
                }
                let hang = self.continuation_indent();
                self.list_stack.push(ListLevel { next: start, indent: hang, hang });
            }
            Tag::Item => self.start_item(),
            Tag::CodeBlock(_) => {
                self.start_block();
                self.in_code_block = true;
            }
            Tag::Emphasis => self.style_stack.push(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.style_stack.push(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self
                .style_stack
                .push(Style::default().add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { dest_url, .. } => {
                self.link_url = Some(dest_url.to_string());
                self.style_stack.push(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_line();
                self.needs_blank = true;
            }
            TagEnd::Heading(_) => {
                self.style_stack.pop();
                self.flush_line();
                self.needs_blank = true;
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.needs_blank = true;
                }
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.needs_blank = true;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.style_stack.pop();
            }
            TagEnd::Link => {
                self.style_stack.pop();
                if let Some(url) = self.link_url.take() {
                    self.pending_space = true;
                    self.push_word(&format!("({url})"), Style::default().fg(Color::DarkGray));
                }
            }
            _ => {}
        }
    }

    fn style(&self) -> Style {
        self.style_stack
            .iter()
            .fold(Style::default().fg(Color::Green), |acc, style| acc.patch(*style))
    }

    fn start_block(&mut self) {
        self.flush_line();
        if self.needs_blank && self.list_stack.is_empty() && !self.lines.is_empty() {
            self.lines.push(Line::from(""));
        }
        self.needs_blank = false;
    }

    fn start_item(&mut self) {
        self.flush_line();
        let Some(level) = self.list_stack.last_mut() else {
            return;
        };
        let marker = match level.next.as_mut() {
            Some(number) => {
                let marker = format!("{number}. ");
                *number += 1;
                marker
            }
            None => "• ".to_string(),
        };

        let indent = level.indent;
        level.hang = indent + marker.chars().count();
        self.current_width = level.hang;
        self.current = vec![
            Span::raw(" ".repeat(indent)),
            Span::styled(marker, Style::default().fg(Color::Cyan)),
        ];
        self.pending_space = false;
        self.at_item_start = true;
    }

    /// Where wrapped lines start: under the text of the innermost list item
    fn continuation_indent(&self) -> usize {
        self.list_stack.last().map_or(MARGIN, |level| level.hang)
    }

    fn push_text(&mut self, text: &str, style: Style) {
        let mut rest = text;
        loop {
            let trimmed = rest.trim_start();
            if trimmed.len() != rest.len() {
                self.pending_space = true;
            }
            if trimmed.is_empty() {
                break;
            }
            let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
            self.push_word(&trimmed[..end], style);
            rest = &trimmed[end..];
        }
    }

    fn push_word(&mut self, word: &str, style: Style) {
        let word_width = word.chars().count();
        let has_words = !self.current.is_empty() && !self.at_item_start;

        if has_words {
            let space = usize::from(self.pending_space);
            if self.current_width + space + word_width > self.limit {
                self.flush_line();
            } else if self.pending_space {
                self.current.push(Span::styled(" ", style));
                self.current_width += 1;
            }
        }

        if self.current.is_empty() {
            let indent = self.continuation_indent();
            self.current.push(Span::raw(" ".repeat(indent)));
            self.current_width = indent;
        }

        self.current.push(Span::styled(word.to_string(), style));
        self.current_width += word_width;
        self.pending_space = false;
        self.at_item_start = false;
    }

    fn push_code_block(&mut self, text: &str) {
        let indent = " ".repeat(self.continuation_indent() + 2);
        for line in text.lines() {
            self.lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(line.to_string(), code_style()),
            ]));
        }
    }

    fn flush_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
        self.current_width = 0;
        self.pending_space = false;
        self.at_item_start = false;
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        self.lines
    }
}

struct ListLevel {
    /// Next number for ordered lists, `None` for bullets
    next: Option<u64>,
    /// Column of this level's markers
    indent: usize,
    /// Column where the current item's text starts
    hang: usize,
}

fn code_style() -> Style {
    Style::default().fg(Color::Yellow)
}
