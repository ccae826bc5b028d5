use crate::client::QueryService;
use crate::error::QueryError;
use crate::events::{SubmitOrigin, SubmitOutcome, Turn};
use crate::response::QueryAnswer;
use crate::session::SessionId;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinHandle;

/// A submission waiting on the query service
struct InFlight {
    query: String,
    origin: SubmitOrigin,
    handle: JoinHandle<()>,
    result_rx: oneshot::Receiver<Result<QueryAnswer, QueryError>>,
}

/// Owns the turn history and every call to the query service.
///
/// At most one submission is in flight. Its result is only applied while it
/// still occupies the in-flight slot, so a reset or a newer submission makes
/// any older answer unreachable.
pub struct ConversationController {
    service: Arc<dyn QueryService>,
    session: SessionId,
    history: Vec<Turn>,
    pending_input: String,
    in_flight: Option<InFlight>,
    focus_requested: bool,
    last_error: Option<String>,
}

impl ConversationController {
    pub fn new(service: Arc<dyn QueryService>, session: SessionId) -> Self {
        Self {
            service,
            session,
            history: Vec::new(),
            pending_input: String::new(),
            in_flight: None,
            focus_requested: false,
            last_error: None,
        }
    }

    /// Submit whatever is in the input buffer
    pub fn submit_input(&mut self) -> bool {
        let text = self.pending_input.clone();
        self.submit(&text, SubmitOrigin::Composer)
    }

    /// Ask suggestion `suggestion` of turn `turn` (both zero-based) as a follow-up
    pub fn follow_up(&mut self, turn: usize, suggestion: usize) -> bool {
        let Some(question) = self.suggestion(turn, suggestion).map(str::to_string) else {
            tracing::debug!(turn, suggestion, "no such suggested question");
            return false;
        };
        self.submit(&question, SubmitOrigin::FollowUp { parent_index: turn })
    }

    /// Start a request for `text`. Returns false, doing nothing, for blank input.
    pub fn submit(&mut self, text: &str, origin: SubmitOrigin) -> bool {
        let query = text.trim();
        if query.is_empty() {
            return false;
        }

        if let Some(previous) = self.in_flight.take() {
            tracing::warn!(query = %previous.query, "superseding in-flight query");
            previous.handle.abort();
        }

        tracing::info!(
            session = %self.session,
            follow_up = origin.is_follow_up(),
            "submitting query"
        );

        let (tx, result_rx) = oneshot::channel();
        let service = Arc::clone(&self.service);
        let session = self.session.clone();
        let owned_query = query.to_string();
        let handle = tokio::spawn(async move {
            let result = service.ask(&session, &owned_query).await;
            let _ = tx.send(result);
        });

        self.last_error = None;
        self.in_flight = Some(InFlight {
            query: query.to_string(),
            origin,
            handle,
            result_rx,
        });

        true
    }

    /// Apply a finished submission, if any, without blocking (called from the UI loop)
    pub fn poll(&mut self) -> Option<SubmitOutcome> {
        let in_flight = self.in_flight.as_mut()?;
        let result = match in_flight.result_rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(QueryError::Interrupted),
        };

        let done = self.in_flight.take()?;
        Some(self.finish(done.query, result))
    }

    /// Wait for the in-flight submission and apply it
    pub async fn wait(&mut self) -> Option<SubmitOutcome> {
        let in_flight = self.in_flight.as_mut()?;
        let result = (&mut in_flight.result_rx)
            .await
            .unwrap_or(Err(QueryError::Interrupted));

        let done = self.in_flight.take()?;
        Some(self.finish(done.query, result))
    }

    fn finish(&mut self, query: String, result: Result<QueryAnswer, QueryError>) -> SubmitOutcome {
        match result {
            Ok(answer) => {
                self.history.push(Turn::new(query, answer));
                self.pending_input.clear();
                self.focus_requested = true;
                let index = self.history.len() - 1;
                tracing::info!(index, "turn appended");
                SubmitOutcome::Appended { index }
            }
            Err(err) => {
                tracing::error!(error = %err, query = %query, "error calling query service");
                self.last_error = Some(err.to_string());
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Clear the conversation now and ask the service to forget it in the background.
    ///
    /// The clear never waits for, nor is undone by, the server call.
    pub fn reset(&mut self) -> JoinHandle<()> {
        self.history.clear();
        self.pending_input.clear();
        self.last_error = None;
        self.focus_requested = true;

        if let Some(in_flight) = self.in_flight.take() {
            tracing::debug!(query = %in_flight.query, "discarding in-flight query on reset");
            in_flight.handle.abort();
        }

        let service = Arc::clone(&self.service);
        let session = self.session.clone();
        tokio::spawn(async move {
            match service.reset_session(&session).await {
                Ok(()) => tracing::info!(session = %session, "server session reset"),
                Err(err) => tracing::error!(session = %session, error = %err, "failed to reset session"),
            }
        })
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Turn whose suggested follow-up is currently being asked
    pub fn busy_turn(&self) -> Option<usize> {
        self.in_flight
            .as_ref()
            .and_then(|in_flight| in_flight.origin.parent_index())
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    pub fn suggestion(&self, turn: usize, suggestion: usize) -> Option<&str> {
        self.history
            .get(turn)?
            .suggested_questions()
            .get(suggestion)
            .map(String::as_str)
    }

    /// Returns true once after each event that should move focus back to the input
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }
}
