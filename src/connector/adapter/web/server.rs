use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::cookies::{
    cookie_value, expired_session_cookie, session_cookie, API_KEY_COOKIE, SESSION_COOKIE,
};
use super::page::{render_page, PageProps};
use super::sessions::SessionRegistry;
use crate::application::{
    CompletionClient, RenderTranscriptUseCase, SharedSession, SubmitMessageUseCase,
    TranscriptEntry,
};
use crate::domain::{CompletionParams, Credential, DomainError, Turn};

/// Shared state of the chat web server.
#[derive(Clone)]
pub struct WebState {
    submit: Arc<SubmitMessageUseCase>,
    render: Arc<RenderTranscriptUseCase>,
    sessions: Arc<SessionRegistry>,
}

impl WebState {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self::from_parts(
            SubmitMessageUseCase::new(client),
            RenderTranscriptUseCase::new(),
            SessionRegistry::new(),
        )
    }

    pub fn from_parts(
        submit: SubmitMessageUseCase,
        render: RenderTranscriptUseCase,
        sessions: SessionRegistry,
    ) -> Self {
        Self {
            submit: Arc::new(submit),
            render: Arc::new(render),
            sessions: Arc::new(sessions),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    async fn session_for(&self, headers: &HeaderMap) -> Result<SharedSession, ApiError> {
        let id = cookie_value(headers, SESSION_COOKIE)
            .ok_or_else(|| DomainError::not_found("session not found"))?;
        self.sessions
            .get(id)
            .await
            .ok_or_else(|| DomainError::not_found("session not found").into())
    }
}

/// [`DomainError`] rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(DomainError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DomainError::Busy | DomainError::StaleResponse => StatusCode::CONFLICT,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::MissingCredential => StatusCode::UNAUTHORIZED,
            DomainError::Request(_) => StatusCode::BAD_GATEWAY,
            DomainError::IoError(_) | DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!("Request failed with {}: {}", status, self.0);
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub turn: Turn,
    pub loading: bool,
    pub turns: usize,
}

pub fn router(state: WebState) -> axum::Router {
    axum::Router::new()
        .route("/", get(index))
        .route("/api/chat", post(chat))
        .route("/api/conversation", get(conversation))
        .route("/api/params", put(update_params))
        .route("/api/session", delete(end_session))
        .with_state(state)
}

pub async fn serve(state: WebState, addr: SocketAddr) -> Result<(), DomainError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Chat server listening on http://{}", listener.local_addr()?);

    let sessions = state.sessions.clone();
    let sweeper = tokio::spawn(async move {
        let mut ticker = tokio::time::interval((sessions.idle_timeout() / 4).max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            sessions.prune().await;
        }
    });

    let served = axum::serve(listener, router(state)).await;
    sweeper.abort();
    served?;
    Ok(())
}

/// Page load: every load starts a fresh conversation.
pub async fn index(State(state): State<WebState>, headers: HeaderMap) -> Response {
    if let Some(previous) = cookie_value(&headers, SESSION_COOKIE) {
        state.sessions.remove(previous).await;
    }
    let (id, session) = state.sessions.create().await;

    let props = PageProps::from_headers(&headers);
    let entries = state.render.execute(&*session.lock().await);
    let page = render_page(&props, &entries);

    ([(header::SET_COOKIE, session_cookie(&id))], Html(page)).into_response()
}

pub async fn chat(
    State(state): State<WebState>,
    headers: HeaderMap,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatReply>, ApiError> {
    let session = state.session_for(&headers).await?;
    let credential = cookie_value(&headers, API_KEY_COOKIE)
        .and_then(Credential::new)
        .ok_or(DomainError::MissingCredential)?;

    let turn = state.submit.execute(&session, &credential, &body.text).await?;

    let guard = session.lock().await;
    Ok(Json(ChatReply {
        turn,
        loading: guard.conversation().is_loading(),
        turns: guard.conversation().len(),
    }))
}

pub async fn conversation(
    State(state): State<WebState>,
    headers: HeaderMap,
) -> Result<Json<Vec<TranscriptEntry>>, ApiError> {
    let session = state.session_for(&headers).await?;
    let entries = state.render.execute(&*session.lock().await);
    Ok(Json(entries))
}

pub async fn update_params(
    State(state): State<WebState>,
    headers: HeaderMap,
    Json(params): Json<CompletionParams>,
) -> Result<StatusCode, ApiError> {
    let session = state.session_for(&headers).await?;
    let mut guard = session.lock().await;
    debug!("Session {} now uses {:?}", guard.id(), params.model);
    guard.set_completion_params(Some(params));
    Ok(StatusCode::NO_CONTENT)
}

pub async fn end_session(State(state): State<WebState>, headers: HeaderMap) -> Response {
    if let Some(id) = cookie_value(&headers, SESSION_COOKIE) {
        state.sessions.remove(id).await;
    }
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, expired_session_cookie())],
    )
        .into_response()
}
