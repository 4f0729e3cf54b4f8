//! Integration tests for the `/api/tts/*` HTTP endpoints.
//!
//! These tests verify:
//!  - every queue route is wired with the right method,
//!  - error responses carry the status code and stable `type` discriminant,
//!  - the reqwest `DeliveryPort` client round-trips against a live server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use readaloud_axum::bootstrap::{AxumContext, CorsConfig, serve};
use readaloud_axum::routes::create_router;
use readaloud_core::{
    DeliveryPort, QueueError, RuleTokenizer, SessionStatus, SpeechSynthesizer, SpeechTokenizer,
    SynthesisRequest, TtsAudio, VoiceError, VoiceGender, VoiceInfo, VoicePrompt,
};
use readaloud_core::ports::voice_info;
use readaloud_playback::HttpDeliveryClient;
use readaloud_tts::{QueueConfig, TtsQueueService};

// ── Mock backend ──────────────────────────────────────────────────────────────

const RATE: u32 = 8_000;

struct WordSynth;

#[async_trait]
impl SpeechSynthesizer for WordSynth {
    fn sample_rate(&self) -> u32 {
        RATE
    }

    fn tokenizer(&self) -> Arc<dyn SpeechTokenizer> {
        Arc::new(RuleTokenizer)
    }

    async fn prepare_voice(&self, voice: &str) -> Result<VoicePrompt, VoiceError> {
        Ok(VoicePrompt::new(voice, 0))
    }

    async fn synthesize(&self, request: SynthesisRequest) -> Result<TtsAudio, VoiceError> {
        let words = request.text.split_whitespace().count();
        Ok(TtsAudio::from_samples(vec![0.5; words * 80], RATE))
    }

    fn available_voices(&self) -> Vec<VoiceInfo> {
        vec![voice_info("af_sarah", "Sarah", "American English", VoiceGender::Female)]
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn queue_config() -> QueueConfig {
    QueueConfig {
        min_tokens: 2,
        max_tokens: 8,
        cleanup_grace: Duration::from_secs(60),
        default_voice: "af_sarah".into(),
    }
}

fn context(with_backend: bool) -> AxumContext {
    let service = if with_backend {
        TtsQueueService::with_backend(queue_config(), Arc::new(WordSynth))
    } else {
        TtsQueueService::new(queue_config())
    };
    AxumContext::new(Arc::new(service))
}

fn app(with_backend: bool) -> Router {
    create_router(context(with_backend), &CorsConfig::AllowAll)
}

/// Assert the response body is valid JSON and return the parsed value.
async fn parse_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|e| panic!("Expected valid JSON body: {e}"))
}

/// Assert a response has `application/json` content-type.
fn assert_json_content_type(response: &axum::response::Response) {
    let ct = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap_or(""))
        .unwrap_or("");
    assert!(
        ct.starts_with("application/json"),
        "Expected application/json content-type, got: {ct}"
    );
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn create(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(post_json("/api/tts/queues", &json!({"voice": "af_sarah"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_json(response).await;
    body["queueId"].as_str().unwrap().to_string()
}

// ── Status & voices ───────────────────────────────────────────────────────────

#[tokio::test]
async fn status_reports_backend_readiness() {
    let response = app(true).oneshot(get("/api/tts/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_json_content_type(&response);
    let body = parse_json(response).await;
    assert_eq!(body["modelLoaded"], true);
    assert_eq!(body["sampleRate"], RATE);
    assert_eq!(body["activeQueues"], 0);

    let body = parse_json(app(false).oneshot(get("/api/tts/status")).await.unwrap()).await;
    assert_eq!(body["modelLoaded"], false);
    assert!(body["sampleRate"].is_null());
}

#[tokio::test]
async fn voices_lists_backend_voices() {
    let response = app(true).oneshot(get("/api/tts/voices")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_json(response).await;
    assert_eq!(body[0]["id"], "af_sarah");
    assert_eq!(body[0]["gender"], "female");
}

#[tokio::test]
async fn health_returns_ok() {
    let response = app(false).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ── Queue lifecycle ───────────────────────────────────────────────────────────

#[tokio::test]
async fn full_lifecycle_over_http() {
    let app = app(true);
    let id = create(&app).await;
    assert_eq!(id.len(), 12);

    let text = "Hello there. How are you today?";
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/tts/queues/{id}/text"),
            &json!({"text": text}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_json(response).await["queued"], true);

    let response = app
        .clone()
        .oneshot(post_empty(&format!("/api/tts/queues/{id}/end")))
        .await
        .unwrap();
    assert_eq!(
        parse_json(response).await,
        json!({"ended": true, "alreadyEnded": false})
    );

    let mut chunks = Vec::new();
    let mut last = Value::Null;
    for _ in 0..200 {
        let response = app
            .clone()
            .oneshot(post_empty(&format!("/api/tts/queues/{id}/poll")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        last = parse_json(response).await;
        chunks.extend(last["chunks"].as_array().unwrap().iter().cloned());
        if last["done"] == true {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(last["done"], true);
    assert_eq!(last["status"], "complete");
    assert!(!chunks.is_empty());
    assert_eq!(chunks[0]["charStart"], 0);
    assert_eq!(
        chunks.last().unwrap()["charEnd"],
        text.chars().count()
    );
    for chunk in &chunks {
        assert!(chunk["audioBase64"].is_string());
        assert!(chunk["durationMs"].is_number());
    }

    let response = app
        .clone()
        .oneshot(get(&format!("/api/tts/queues/{id}")))
        .await
        .unwrap();
    let info = parse_json(response).await;
    assert_eq!(info["queueId"], id);
    assert_eq!(info["status"], "complete");
    assert_eq!(info["deliveredCount"], chunks.len());
}

#[tokio::test]
async fn create_without_body_uses_default_voice() {
    let app = app(true);
    let response = app
        .clone()
        .oneshot(post_empty("/api/tts/queues"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = parse_json(response).await["queueId"]
        .as_str()
        .unwrap()
        .to_string();

    let info = parse_json(
        app.oneshot(get(&format!("/api/tts/queues/{id}")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(info["voice"], "af_sarah");
}

#[tokio::test]
async fn cancel_removes_queue() {
    let app = app(true);
    let id = create(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/tts/queues/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(parse_json(response).await, json!({"cancelled": true}));

    let response = app
        .oneshot(post_empty(&format!("/api/tts/queues/{id}/poll")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_queue_is_404_not_found() {
    let response = app(true)
        .oneshot(post_empty("/api/tts/queues/000000000000/poll"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_json_content_type(&response);
    let body = parse_json(response).await;
    assert_eq!(body["type"], "NOT_FOUND");
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn text_after_end_is_409_already_ended() {
    let app = app(true);
    let id = create(&app).await;
    app.clone()
        .oneshot(post_empty(&format!("/api/tts/queues/{id}/end")))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_empty(&format!("/api/tts/queues/{id}/end")))
        .await
        .unwrap();
    assert_eq!(
        parse_json(response).await,
        json!({"ended": true, "alreadyEnded": true})
    );

    let response = app
        .oneshot(post_json(
            &format!("/api/tts/queues/{id}/text"),
            &json!({"text": "too late"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(parse_json(response).await["type"], "ALREADY_ENDED");
}

#[tokio::test]
async fn missing_model_is_503() {
    let response = app(false)
        .oneshot(post_json("/api/tts/queues", &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(parse_json(response).await["type"], "MODEL_UNAVAILABLE");
}

#[tokio::test]
async fn malformed_text_body_is_400() {
    let app = app(true);
    let id = create(&app).await;
    let response = app
        .oneshot(post_json(
            &format!("/api/tts/queues/{id}/text"),
            &json!({"words": "nope"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_json(response).await;
    assert_eq!(body["status"], 400);
    assert!(body.get("type").is_none());
}

// ── HTTP client against a live server ─────────────────────────────────────────

#[tokio::test]
async fn http_client_round_trips_queue_operations() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let server = tokio::spawn(serve(
        listener,
        context(true),
        CorsConfig::AllowAll,
        cancel.clone(),
    ));

    let client = HttpDeliveryClient::new(format!("http://{addr}")).unwrap();
    let created = client.create_queue("af_sarah").await.unwrap();
    assert_eq!(created.sample_rate, RATE);

    client
        .add_text(&created.queue_id, "One two three. Four five six.")
        .await
        .unwrap();
    client.end_queue(&created.queue_id).await.unwrap();

    let mut chunks = Vec::new();
    let last = loop {
        let result = client.poll(&created.queue_id).await.unwrap();
        chunks.extend(result.chunks.iter().cloned());
        if result.done {
            break result;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    };
    assert_eq!(last.status, SessionStatus::Complete);
    let samples: usize = chunks.iter().map(|c| c.pcm.len() / 2).sum();
    assert_eq!(samples, 6 * 80);

    let err = client.add_text(&created.queue_id, "more").await.unwrap_err();
    assert!(matches!(err, QueueError::AlreadyEnded(_)));

    let err = client.poll("ffffffffffff").await.unwrap_err();
    assert_eq!(err, QueueError::NotFound("ffffffffffff".into()));

    // Reserved characters stay inside the id segment.
    let err = client.end_queue("a/b?c").await.unwrap_err();
    assert_eq!(err, QueueError::NotFound("a/b?c".into()));

    assert_eq!(client.voices().await.unwrap().len(), 1);
    assert!(client.status().await.unwrap().model_loaded);

    cancel.cancel();
    server.await.unwrap().unwrap();
}
