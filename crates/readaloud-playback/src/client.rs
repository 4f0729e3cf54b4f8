//! HTTP implementation of [`DeliveryPort`].
//!
//! Talks to a readaloud server over the JSON queue API. Error responses
//! carry a stable `type` code that maps back to [`QueueError`]; anything
//! that never produced such a response becomes [`QueueError::Transport`].

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use readaloud_core::contracts::http::tts;
use readaloud_core::{
    AddTextAck, AddTextRequest, CancelAck, CreateQueueRequest, CreatedQueue, DeliveryPort, EndAck,
    PollResponseDto, PollResult, QueueError, QueueInfo, TtsStatusDto, VoiceInfo,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON error body returned by the server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
}

/// Remote delivery endpoint.
#[derive(Debug, Clone)]
pub struct HttpDeliveryClient {
    client: Client,
    base_url: String,
}

impl HttpDeliveryClient {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:3109`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, QueueError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| QueueError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn queue_url(&self, template: &str, queue_id: &str) -> String {
        self.url(&tts::queue_path(template, queue_id))
    }

    /// Snapshot of one queue.
    pub async fn queue_info(&self, queue_id: &str) -> Result<QueueInfo, QueueError> {
        let response = self
            .client
            .get(self.queue_url(tts::QUEUE, queue_id))
            .send()
            .await;
        decode(response).await
    }

    pub async fn voices(&self) -> Result<Vec<VoiceInfo>, QueueError> {
        let response = self.client.get(self.url(tts::VOICES)).send().await;
        decode(response).await
    }

    pub async fn status(&self) -> Result<TtsStatusDto, QueueError> {
        let response = self.client.get(self.url(tts::STATUS)).send().await;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(
    response: Result<Response, reqwest::Error>,
) -> Result<T, QueueError> {
    let response = response.map_err(|e| QueueError::Transport(e.to_string()))?;
    let status = response.status();

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| QueueError::Transport(format!("Invalid response body: {e}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| QueueError::Transport(e.to_string()))?;
    Err(match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            error,
            error_type: Some(code),
        }) => QueueError::from_type_code(&code, error),
        Ok(ErrorBody { error, .. }) => QueueError::Transport(format!("HTTP {status}: {error}")),
        Err(_) => QueueError::Transport(format!("HTTP {status}: {body}")),
    })
}

#[async_trait::async_trait]
impl DeliveryPort for HttpDeliveryClient {
    async fn create_queue(&self, voice: &str) -> Result<CreatedQueue, QueueError> {
        let body = CreateQueueRequest {
            voice: (!voice.is_empty()).then(|| voice.to_string()),
        };
        let response = self
            .client
            .post(self.url(tts::QUEUES))
            .json(&body)
            .send()
            .await;
        decode(response).await
    }

    async fn add_text(&self, queue_id: &str, text: &str) -> Result<AddTextAck, QueueError> {
        let body = AddTextRequest {
            text: text.to_string(),
        };
        let response = self
            .client
            .post(self.queue_url(tts::QUEUE_TEXT, queue_id))
            .json(&body)
            .send()
            .await;
        decode(response).await
    }

    async fn end_queue(&self, queue_id: &str) -> Result<EndAck, QueueError> {
        let response = self
            .client
            .post(self.queue_url(tts::QUEUE_END, queue_id))
            .send()
            .await;
        decode(response).await
    }

    async fn cancel_queue(&self, queue_id: &str) -> Result<CancelAck, QueueError> {
        let response = self
            .client
            .delete(self.queue_url(tts::QUEUE, queue_id))
            .send()
            .await;
        decode(response).await
    }

    async fn poll(&self, queue_id: &str) -> Result<PollResult, QueueError> {
        let response = self
            .client
            .post(self.queue_url(tts::QUEUE_POLL, queue_id))
            .send()
            .await;
        let dto: PollResponseDto = decode(response).await?;
        dto.into_result()
            .map_err(|e| QueueError::Transport(format!("Invalid audio payload: {e}")))
    }
}
