use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use url::Url;

use lingo_core::SubmissionRequest;
use lingo_core::model::{AttemptDefinition, AttemptKind, AttemptResult, TestId};

use super::envelope::unwrap_envelope;
use super::wire::{DefinitionWire, RESULT_KEYS, ResultWire, definition_keys};
use super::{RemoteJudge, TokenProvider};
use crate::config::ClientConfig;
use crate::error::ApiError;

/// `RemoteJudge` over the backend's REST API.
#[derive(Clone)]
pub struct HttpJudge {
    client: Client,
    base_url: Url,
    passing_threshold: u32,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpJudge {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            passing_threshold: config.passing_threshold,
            tokens,
        })
    }

    pub(crate) fn definition_url(&self, kind: AttemptKind, id: TestId) -> Result<Url, ApiError> {
        Ok(self.base_url.join(&format!("{}/{id}", kind.path_segment()))?)
    }

    pub(crate) fn submit_url(&self, kind: AttemptKind, id: TestId) -> Result<Url, ApiError> {
        Ok(self
            .base_url
            .join(&format!("{}/{id}/submit", kind.path_segment()))?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl RemoteJudge for HttpJudge {
    async fn fetch(&self, kind: AttemptKind, id: TestId) -> Result<AttemptDefinition, ApiError> {
        let url = self.definition_url(kind, id)?;
        tracing::debug!(%kind, %id, %url, "fetching attempt definition");

        let response = self.authorized(self.client.get(url)).send().await?;
        let body = unwrap_envelope(read_json(response).await?, definition_keys(kind))?;
        let wire: DefinitionWire =
            serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        wire.into_definition(kind)
    }

    async fn submit(
        &self,
        kind: AttemptKind,
        id: TestId,
        request: &SubmissionRequest,
    ) -> Result<AttemptResult, ApiError> {
        let url = self.submit_url(kind, id)?;
        tracing::info!(%kind, %id, answers = request.len(), "submitting attempt");

        let response = self
            .authorized(self.client.post(url))
            .json(request)
            .send()
            .await?;
        let body = unwrap_envelope(read_json(response).await?, RESULT_KEYS)?;
        let wire: ResultWire =
            serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(wire.into_result(request.len(), self.passing_threshold)?)
    }
}

async fn read_json(response: Response) -> Result<Value, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!("judge rejected the session token");
        return Err(ApiError::Unauthorized);
    }

    let text = response.text().await?;
    if !status.is_success() {
        return Err(error_for_status(status, &text));
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

pub(crate) fn error_for_status(status: StatusCode, body: &str) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Rejected {
            message: body_message(body).unwrap_or_else(|| status.to_string()),
        },
        _ => ApiError::Status(status),
    }
}

fn body_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
