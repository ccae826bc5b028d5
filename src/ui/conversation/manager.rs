use crate::controller::ConversationController;
use crate::events::{SubmitOutcome, TuiEvent};
use crate::ui::conversation::composer::ComposerResult;
use crate::ui::conversation::status::spinner_frame;
use crate::ui::conversation::{
    ConversationComposer, HistoryView, ParsedCommand, SlashCommand, StatusBar, get_help_text,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

const SCROLL_STEP: usize = 5;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Binds the controller to the terminal widgets and routes input to it
pub struct ConversationManager {
    controller: ConversationController,
    composer: ConversationComposer,
    service_url: String,
    show_facts: bool,
    scroll_offset: usize,
    notice: Option<String>,
    tick: u64,
}

impl ConversationManager {
    pub fn new(controller: ConversationController, service_url: impl Into<String>, show_facts: bool) -> Self {
        Self {
            controller,
            composer: ConversationComposer::new("e.g. How can I view and pay my bill?"),
            service_url: service_url.into(),
            show_facts,
            scroll_offset: 0,
            notice: None,
            tick: 0,
        }
    }

    #[cfg(test)]
    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    #[cfg(test)]
    pub fn controller_mut(&mut self) -> &mut ConversationController {
        &mut self.controller
    }

    #[cfg(test)]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Apply a finished request, if any (called from main loop)
    pub fn poll_controller(&mut self) {
        if let Some(outcome) = self.controller.poll() {
            self.apply_outcome(outcome);
        }
        if self.controller.take_focus_request() {
            self.composer.set_focus(true);
            self.composer.move_to_end(self.controller.pending_input());
        }
    }

    fn apply_outcome(&mut self, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Appended { .. } => self.scroll_offset = 0,
            SubmitOutcome::Failed(_) => {}
        }
    }

    pub fn handle_event(&mut self, event: TuiEvent) -> ConversationAction {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            TuiEvent::Paste(_) if self.controller.is_loading() => ConversationAction::None,
            TuiEvent::Paste(text) => {
                let mut input = self.controller.pending_input().to_string();
                self.composer.paste(&mut input, &text);
                self.controller.set_pending_input(input);
                ConversationAction::None
            }
            TuiEvent::Resize(..) => ConversationAction::None,
            TuiEvent::Tick => {
                self.tick = self.tick.wrapping_add(1);
                ConversationAction::None
            }
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return ConversationAction::Exit,
                KeyCode::Char('l') => return self.run_command(SlashCommand::Reset, None),
                _ => {}
            }
        }

        match key.code {
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_add(SCROLL_STEP);
                return ConversationAction::None;
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(SCROLL_STEP);
                return ConversationAction::None;
            }
            KeyCode::Esc if self.notice.is_some() && !self.composer.is_palette_open() => {
                self.notice = None;
                return ConversationAction::None;
            }
            _ => {}
        }

        // The composer is disabled until the in-flight question settles
        if self.controller.is_loading() {
            if key.code == KeyCode::Enter {
                self.notice = Some("A question is already in flight.".to_string());
            }
            return ConversationAction::None;
        }

        let mut input = self.controller.pending_input().to_string();
        let result = self.composer.handle_key(key, &mut input);
        self.controller.set_pending_input(input);

        match result {
            ComposerResult::Submitted => {
                if self.controller.submit_input() {
                    self.notice = None;
                    self.scroll_offset = 0;
                }
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: ParsedCommand) -> ConversationAction {
        let target = command.follow_target();
        self.run_command(command.command, target)
    }

    fn run_command(&mut self, command: SlashCommand, follow_target: Option<(usize, usize)>) -> ConversationAction {
        if self.controller.is_loading() && !command.available_while_loading() {
            self.notice = Some(format!(
                "/{} is unavailable while a question is in flight.",
                command.command()
            ));
            return ConversationAction::None;
        }

        match command {
            SlashCommand::Follow => {
                let Some((turn, suggestion)) = follow_target else {
                    self.notice = Some("Usage: /follow <turn> <n>".to_string());
                    return ConversationAction::None;
                };
                if self.controller.follow_up(turn, suggestion) {
                    self.notice = None;
                    self.scroll_offset = 0;
                } else {
                    self.notice = Some(format!(
                        "Turn {} has no suggested question {}.",
                        turn + 1,
                        suggestion + 1
                    ));
                }
            }
            SlashCommand::Reset => {
                // Server-side cleanup runs detached; its failure is only logged
                drop(self.controller.reset());
                self.notice = None;
                self.scroll_offset = 0;
            }
            SlashCommand::Help => {
                self.notice = Some(get_help_text());
            }
            SlashCommand::Quit => return ConversationAction::Exit,
        }

        ConversationAction::None
    }
}

impl Widget for &ConversationManager {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let notice_height = self
            .notice
            .as_ref()
            .map(|notice| notice.lines().count() as u16 + 2)
            .unwrap_or(0);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),               // History
                Constraint::Length(notice_height), // Notice
                Constraint::Length(3),            // Composer
                Constraint::Length(1),            // Status
            ])
            .split(area);

        let spinner = spinner_frame(self.tick);
        let loading = self.controller.is_loading();
        let busy_turn = self.controller.busy_turn();

        HistoryView {
            turns: self.controller.history(),
            busy_turn,
            thinking: loading && busy_turn.is_none(),
            show_facts: self.show_facts,
            scroll_offset: self.scroll_offset,
            spinner,
        }
        .render(chunks[0], buf);

        if let Some(notice) = &self.notice {
            let lines: Vec<Line> = notice.lines().map(Line::from).collect();
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("ℹ️ Esc to dismiss")
                        .style(Style::default().fg(Color::Yellow)),
                )
                .render(chunks[1], buf);
        }

        self.composer
            .view(self.controller.pending_input(), !loading)
            .render(chunks[2], buf);

        StatusBar {
            session: self.controller.session_id().as_str(),
            service_url: &self.service_url,
            loading,
            spinner,
            error: self.controller.last_error(),
        }
        .render(chunks[3], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionId;
    use crate::testing::{ScriptedService, answer};
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn manager(service: &Arc<ScriptedService>) -> ConversationManager {
        let controller = ConversationController::new(service.clone(), SessionId::generate());
        ConversationManager::new(controller, "http://localhost:5000", true)
    }

    fn press(code: KeyCode) -> TuiEvent {
        TuiEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_line(manager: &mut ConversationManager, line: &str) -> ConversationAction {
        for c in line.chars() {
            manager.handle_event(press(KeyCode::Char(c)));
        }
        manager.handle_event(press(KeyCode::Enter))
    }

    #[tokio::test]
    async fn enter_submits_pending_input() {
        let service = Arc::new(ScriptedService::answering(vec![Ok(answer("Pay online.", &["Autopay?"]))]));
        let mut manager = manager(&service);

        type_line(&mut manager, "How do I pay?");
        assert!(manager.controller().is_loading());
        manager.controller_mut().wait().await;

        assert_eq!(manager.controller().history().len(), 1);
        assert_eq!(manager.controller().pending_input(), "");
        assert_eq!(service.asked()[0].1, "How do I pay?");
    }

    #[tokio::test]
    async fn follow_command_marks_busy_turn() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(
            ScriptedService::answering(vec![Ok(answer("first", &["Why?"])), Ok(answer("second", &[]))])
                .gated(gate.clone()),
        );
        let mut manager = manager(&service);

        type_line(&mut manager, "start");
        gate.notify_one();
        manager.controller_mut().wait().await;

        type_line(&mut manager, "/follow 1 1");
        assert_eq!(manager.controller().busy_turn(), Some(0));

        gate.notify_one();
        manager.controller_mut().wait().await;
        assert_eq!(manager.controller().busy_turn(), None);
        assert_eq!(manager.controller().history()[1].user_query(), "Why?");
    }

    #[tokio::test]
    async fn submissions_are_refused_while_loading() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(ScriptedService::default().gated(gate.clone()));
        let mut manager = manager(&service);

        type_line(&mut manager, "first");
        type_line(&mut manager, "second");
        assert_eq!(manager.notice(), Some("A question is already in flight."));

        let ctrl_l = TuiEvent::Key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL));
        manager.handle_event(ctrl_l);
        assert!(manager.notice().unwrap().contains("/reset is unavailable"));
        assert!(manager.controller().is_loading());

        tokio::task::yield_now().await;
        assert_eq!(service.asked().len(), 1);
    }

    #[tokio::test]
    async fn edits_are_ignored_while_loading() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(ScriptedService::answering(vec![Ok(answer("a", &[]))]).gated(gate.clone()));
        let mut manager = manager(&service);

        type_line(&mut manager, "first");
        for c in "my next question".chars() {
            manager.handle_event(press(KeyCode::Char(c)));
        }
        manager.handle_event(press(KeyCode::Backspace));
        manager.handle_event(TuiEvent::Paste("pasted".to_string()));
        assert_eq!(manager.controller().pending_input(), "first");

        gate.notify_one();
        manager.controller_mut().wait().await;
        assert_eq!(manager.controller().pending_input(), "");

        type_line(&mut manager, "next");
        gate.notify_one();
        manager.controller_mut().wait().await;
        assert_eq!(manager.controller().history()[1].user_query(), "next");
    }

    #[tokio::test]
    async fn commands_typed_while_loading_are_not_consumed() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(ScriptedService::default().gated(gate.clone()));
        let mut manager = manager(&service);

        type_line(&mut manager, "first");
        manager.controller_mut().set_pending_input("/reset");
        manager.handle_event(press(KeyCode::Enter));

        assert_eq!(manager.controller().pending_input(), "/reset");
        assert!(manager.controller().is_loading());
        assert_eq!(manager.notice(), Some("A question is already in flight."));
    }

    #[tokio::test]
    async fn reset_command_clears_history() {
        let service = Arc::new(ScriptedService::answering(vec![Ok(answer("a", &[]))]));
        let mut manager = manager(&service);

        type_line(&mut manager, "q");
        manager.controller_mut().wait().await;
        assert_eq!(manager.controller().history().len(), 1);

        type_line(&mut manager, "/reset");
        assert!(manager.controller().history().is_empty());
    }

    #[tokio::test]
    async fn help_and_quit() {
        let service = Arc::new(ScriptedService::default());
        let mut manager = manager(&service);

        type_line(&mut manager, "/help");
        assert!(manager.notice().unwrap().contains("Available commands"));
        manager.handle_event(press(KeyCode::Esc));
        assert!(manager.notice().is_none());

        assert_eq!(type_line(&mut manager, "/quit"), ConversationAction::Exit);
        let ctrl_c = TuiEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(manager.handle_event(ctrl_c), ConversationAction::Exit);
    }

    #[tokio::test]
    async fn bad_follow_target_reports_usage() {
        let service = Arc::new(ScriptedService::default());
        let mut manager = manager(&service);

        type_line(&mut manager, "/follow");
        assert_eq!(manager.notice(), Some("Usage: /follow <turn> <n>"));
        type_line(&mut manager, "/follow 4 1");
        assert_eq!(manager.notice(), Some("Turn 4 has no suggested question 1."));
        assert!(!manager.controller().is_loading());
    }

    #[tokio::test]
    async fn renders_without_panicking() {
        let service = Arc::new(ScriptedService::answering(vec![Ok(answer("a", &["b"]))]));
        let mut manager = manager(&service);
        type_line(&mut manager, "q");
        manager.controller_mut().wait().await;
        type_line(&mut manager, "/help");

        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        (&manager).render(area, &mut buf);
    }
}
