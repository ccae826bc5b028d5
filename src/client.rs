use crate::config::Config;
use crate::error::{QueryError, Result};
use crate::response::QueryAnswer;
use crate::session::SessionId;
use async_trait::async_trait;
use serde::Serialize;

/// The remote collaborator that answers questions and owns server-side memory
#[async_trait]
pub trait QueryService: Send + Sync + 'static {
    /// Ask one question within a session
    async fn ask(&self, session: &SessionId, query: &str) -> Result<QueryAnswer>;

    /// Drop the server-side conversation memory for a session
    async fn reset_session(&self, session: &SessionId) -> Result<()>;
}

/// Body of a `/agentic-rag` request
#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    query: &'a str,
    session_id: &'a str,
}

/// HTTP client for the agentic RAG service
#[derive(Clone)]
pub struct HttpQueryService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQueryService {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.service_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl QueryService for HttpQueryService {
    async fn ask(&self, session: &SessionId, query: &str) -> Result<QueryAnswer> {
        let url = self.endpoint("agentic-rag");
        tracing::debug!(%url, session = %session, "submitting query");

        let response = self
            .client
            .post(&url)
            .json(&AskRequest {
                query,
                session_id: session.as_str(),
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(QueryError::from_status(status.as_u16(), &body));
        }

        Ok(QueryAnswer::from_json(&body)?)
    }

    async fn reset_session(&self, session: &SessionId) -> Result<()> {
        let url = self.endpoint("reset-session");
        tracing::debug!(%url, session = %session, "resetting session");

        let response = self
            .client
            .delete(&url)
            .query(&[("session_id", session.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::from_status(status.as_u16(), &body));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> HttpQueryService {
        let config = Config::default().with_overrides(Some(format!("{}/", server.uri())), None);
        HttpQueryService::new(&config).unwrap()
    }

    #[tokio::test]
    async fn ask_posts_query_and_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/agentic-rag"))
            .and(body_json(json!({ "query": "How do I pay?", "session_id": "s-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": "How do I pay?",
                "facts": "Pay online.\nPay by phone.",
                "answer": "Online or by phone.",
                "suggestedQuestions": "Is there a fee?"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = service_for(&server);
        let session = SessionId::from_user(Some("s-1"));
        let answer = service.ask(&session, "How do I pay?").await.unwrap();

        assert_eq!(answer.facts, vec!["Pay online.", "Pay by phone."]);
        assert_eq!(answer.response, "Online or by phone.");
        assert_eq!(answer.suggested_questions, vec!["Is there a fee?"]);
    }

    #[tokio::test]
    async fn ask_reports_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/agentic-rag"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "error": "Agentic RAG processing failed." })),
            )
            .mount(&server)
            .await;

        let service = service_for(&server);
        let err = service
            .ask(&SessionId::generate(), "anything")
            .await
            .unwrap_err();

        match err {
            QueryError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Agentic RAG processing failed.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn ask_rejects_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/agentic-rag"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let service = service_for(&server);
        let err = service.ask(&SessionId::generate(), "q").await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidBody(_)));
    }

    #[tokio::test]
    async fn reset_sends_delete_with_session_param() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/reset-session"))
            .and(query_param("session_id", "demo-session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Session 'demo-session' reset successfully."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = service_for(&server);
        service
            .reset_session(&SessionId::from_user(Some("demo-session")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let config = Config::default().with_overrides(Some("http://127.0.0.1:1".into()), None);
        let service = HttpQueryService::new(&config).unwrap();
        let err = service.ask(&SessionId::generate(), "q").await.unwrap_err();
        assert!(matches!(err, QueryError::Transport(_)));
    }
}
