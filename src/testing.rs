//! Test doubles shared by unit tests.

use crate::client::QueryService;
use crate::error::{QueryError, Result};
use crate::response::QueryAnswer;
use crate::session::SessionId;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Query service that replays canned answers
#[derive(Default)]
pub struct ScriptedService {
    pub answers: Mutex<VecDeque<Result<QueryAnswer>>>,
    pub asked: Mutex<Vec<(String, String)>>,
    pub gate: Option<Arc<Notify>>,
    pub fail_reset: bool,
    pub resets: AtomicUsize,
}

impl ScriptedService {
    pub fn answering(answers: Vec<Result<QueryAnswer>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            ..Default::default()
        }
    }

    /// Hold every `ask` until the gate is notified
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn failing_reset(mut self) -> Self {
        self.fail_reset = true;
        self
    }

    pub fn asked(&self) -> Vec<(String, String)> {
        self.asked.lock().unwrap().clone()
    }

    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryService for ScriptedService {
    async fn ask(&self, session: &SessionId, query: &str) -> Result<QueryAnswer> {
        self.asked
            .lock()
            .unwrap()
            .push((session.to_string(), query.to_string()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QueryAnswer::default()))
    }

    async fn reset_session(&self, _session: &SessionId) -> Result<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reset {
            Err(QueryError::Status {
                status: 500,
                message: "Failed to reset session.".into(),
            })
        } else {
            Ok(())
        }
    }
}

pub fn answer(response: &str, suggestions: &[&str]) -> QueryAnswer {
    QueryAnswer {
        facts: vec!["a fact".into()],
        response: response.into(),
        suggested_questions: suggestions.iter().map(|s| s.to_string()).collect(),
    }
}
