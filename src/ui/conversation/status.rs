use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

const SPINNER_FRAMES: [&str; 4] = ["⠋", "⠙", "⠸", "⠴"];

/// Spinner frame for a tick counter
pub fn spinner_frame(tick: u64) -> &'static str {
    SPINNER_FRAMES[(tick % SPINNER_FRAMES.len() as u64) as usize]
}

/// One-line status bar under the composer
pub struct StatusBar<'a> {
    pub session: &'a str,
    pub service_url: &'a str,
    pub loading: bool,
    pub spinner: &'a str,
    pub error: Option<&'a str>,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dim = Style::default().fg(Color::DarkGray);

        let mut spans = if let Some(error) = self.error {
            vec![
                Span::styled("❌ ", Style::default().fg(Color::Red)),
                Span::styled(error.to_string(), Style::default().fg(Color::Red)),
            ]
        } else if self.loading {
            vec![
                Span::styled(format!("{} ", self.spinner), Style::default().fg(Color::Yellow)),
                Span::styled("waiting for the query service", Style::default().fg(Color::Yellow)),
            ]
        } else {
            vec![Span::styled("ready", Style::default().fg(Color::Green))]
        };

        spans.push(Span::styled(
            format!("  │ {}  │ {}  │ /help", self.session, self.service_url),
            dim,
        ));

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
