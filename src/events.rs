use crate::error::QueryError;
use crate::response::QueryAnswer;
use chrono::{DateTime, Local};

/// One exchange in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    user_query: String,
    facts: Vec<String>,
    response: String,
    suggested_questions: Vec<String>,
    received_at: DateTime<Local>,
}

impl Turn {
    pub fn new(user_query: impl Into<String>, answer: QueryAnswer) -> Self {
        Self {
            user_query: user_query.into(),
            facts: answer.facts,
            response: answer.response,
            suggested_questions: answer.suggested_questions,
            received_at: Local::now(),
        }
    }

    pub fn user_query(&self) -> &str {
        &self.user_query
    }

    pub fn facts(&self) -> &[String] {
        &self.facts
    }

    /// Markdown answer text, possibly empty
    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn suggested_questions(&self) -> &[String] {
        &self.suggested_questions
    }

    pub fn received_at(&self) -> DateTime<Local> {
        self.received_at
    }
}

/// Where a submission came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOrigin {
    /// Typed into the composer
    Composer,
    /// A suggested follow-up of the turn at `parent_index`
    FollowUp { parent_index: usize },
}

impl SubmitOrigin {
    pub fn is_follow_up(&self) -> bool {
        matches!(self, SubmitOrigin::FollowUp { .. })
    }

    pub fn parent_index(&self) -> Option<usize> {
        match self {
            SubmitOrigin::FollowUp { parent_index } => Some(*parent_index),
            SubmitOrigin::Composer => None,
        }
    }
}

/// Result of a finished submission, reported back to the UI
#[derive(Debug)]
pub enum SubmitOutcome {
    /// A new turn was appended at `index`
    Appended { index: usize },
    /// The request failed; nothing was appended
    Failed(QueryError),
}

/// TUI-specific events (keyboard, resize, timer)
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),

    /// Periodic redraw
    Tick,
}

impl TuiEvent {
    /// Translate a raw crossterm event, dropping the kinds the UI ignores
    pub fn from_crossterm(event: crossterm::event::Event) -> Option<Self> {
        use crossterm::event::{Event, KeyEventKind};

        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(TuiEvent::Key(key)),
            Event::Paste(text) => Some(TuiEvent::Paste(text)),
            Event::Resize(w, h) => Some(TuiEvent::Resize(w, h)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    #[test]
    fn turn_takes_normalized_answer() {
        let answer = QueryAnswer {
            facts: vec!["a".into()],
            response: "hi".into(),
            suggested_questions: vec!["next?".into()],
        };
        let turn = Turn::new("hello", answer);
        assert_eq!(turn.user_query(), "hello");
        assert_eq!(turn.facts(), ["a".to_string()]);
        assert_eq!(turn.response(), "hi");
        assert_eq!(turn.suggested_questions(), ["next?".to_string()]);
    }

    #[test]
    fn origin_reports_parent() {
        assert_eq!(SubmitOrigin::Composer.parent_index(), None);
        let follow = SubmitOrigin::FollowUp { parent_index: 3 };
        assert!(follow.is_follow_up());
        assert_eq!(follow.parent_index(), Some(3));
    }

    #[test]
    fn key_release_is_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert!(TuiEvent::from_crossterm(Event::Key(release)).is_none());
        assert!(matches!(
            TuiEvent::from_crossterm(Event::Resize(80, 24)),
            Some(TuiEvent::Resize(80, 24))
        ));
    }
}
