use crate::e2e::helpers;

use helpers::mock_engine::{tone_for, MockBehavior, SAMPLES_PER_CHUNK};
use helpers::{test_pipeline, TestContext, MAX_REQUEST_CHARS};
use hyper::StatusCode;
use readaloud_backend::domain::synthesis::PipelineConfig;
use serde_json::json;
use std::io::Cursor;
use std::time::Duration;
use test_context::test_context;

fn wav_samples(data: &[u8]) -> Vec<i16> {
    hound::WavReader::new(Cursor::new(data.to_vec()))
        .unwrap()
        .into_samples::<i16>()
        .map(|s| s.unwrap())
        .collect()
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_accept_text_and_return_job_id(ctx: &TestContext) {

    let response = ctx
        .client
        .post("/generate-audio", &json!({ "text": "Hello world. This is a test." }))
        .await
        .unwrap();

    response.assert_status(StatusCode::ACCEPTED);

    let body = response.body.as_ref().unwrap();
    assert_eq!(body["status"], "processing");
    let job_id = body["job_id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(job_id).is_ok());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_complete_job_and_serve_audio(ctx: &TestContext) {

    let job_id = ctx.submit("Hello world. This is a test.").await;

    let status = ctx.wait_for_job(&job_id).await;
    assert_eq!(status["status"], "completed");
    assert_eq!(status["job_id"], job_id.as_str());
    assert!(status.get("error").is_none());

    let response = ctx.client.get(&format!("/audio/{}", job_id)).await.unwrap();
    response.assert_status(StatusCode::OK);
    response.assert_header("content-type", "audio/wav");
    response.assert_header(
        "content-disposition",
        &format!("attachment; filename=\"pdf_audio_{}.wav\"", job_id),
    );
    assert!(!response.body_bytes.is_empty());
    assert_eq!(wav_samples(&response.body_bytes).len(), SAMPLES_PER_CHUNK);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_empty_text(ctx: &TestContext) {

    let response = ctx
        .client
        .post("/generate-audio", &json!({ "text": "   \n  " }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Text cannot be empty");
    assert_eq!(ctx.engine.calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_text_above_request_limit(ctx: &TestContext) {

    let text = "a".repeat(MAX_REQUEST_CHARS + 1);
    let response = ctx
        .client
        .post("/generate-audio", &json!({ "text": text }))
        .await
        .unwrap();

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_json(ctx: &TestContext) {

    let response = ctx.client.post_raw("/generate-audio", "{not json").await.unwrap();

    assert!(response.status.is_client_error());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_accept_language_code_as_voice(ctx: &TestContext) {

    let response = ctx
        .client
        .post("/generate-audio", &json!({ "text": "Bonjour le monde.", "voice": "fr" }))
        .await
        .unwrap();

    response.assert_status(StatusCode::ACCEPTED);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_not_found_for_unknown_job(ctx: &TestContext) {

    let job_id = uuid::Uuid::new_v4().to_string();
    let response = ctx.client.get(&format!("/status/{}", job_id)).await.unwrap();

    response.assert_status(StatusCode::NOT_FOUND);
    let body = response.body.as_ref().unwrap();
    assert_eq!(body["status"], "not_found");
    assert_eq!(body["job_id"], job_id.as_str());

    let response = ctx.client.get(&format!("/audio/{}", job_id)).await.unwrap();
    response.assert_status(StatusCode::NOT_FOUND);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_not_found_for_malformed_job_id(ctx: &TestContext) {

    let response = ctx.client.get("/status/not-a-job").await.unwrap();
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.body.as_ref().unwrap()["status"], "not_found");

    let response = ctx.client.get("/audio/..%2F..%2Fetc%2Fpasswd").await.unwrap();
    response.assert_status(StatusCode::NOT_FOUND);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_same_status_on_repeated_polls(ctx: &TestContext) {

    let job_id = ctx.submit("Hello world.").await;
    let first = ctx.wait_for_job(&job_id).await;

    for _ in 0..3 {
        let response = ctx.client.get(&format!("/status/{}", job_id)).await.unwrap();
        assert_eq!(response.body.as_ref().unwrap(), &first);
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_voices(ctx: &TestContext) {

    let response = ctx.client.get("/voices").await.unwrap();
    response.assert_status(StatusCode::OK);

    let body = response.body.as_ref().unwrap();
    assert_eq!(body["default_voice"], "en-US-ChristopherNeural");
    assert_eq!(body["voices"]["fr"], "fr-FR-HenriNeural");
    assert_eq!(body["voices"]["zh-CN"], "zh-CN-YunxiNeural");
}

#[tokio::test]
async fn it_should_fail_job_when_engine_always_times_out() {
    let ctx = TestContext::with_engine(MockBehavior::Hang, test_pipeline())
        .await
        .unwrap();

    let job_id = ctx.submit("Hello world. This is a test.").await;
    let status = ctx.wait_for_job(&job_id).await;

    assert_eq!(status["status"], "failed");
    let error = status["error"].as_str().unwrap();
    assert!(error.contains("no valid audio"), "unexpected error: {}", error);

    // One chunk per attempt, one attempt plus two retries
    assert_eq!(ctx.engine.calls(), 3);

    let response = ctx.client.get(&format!("/audio/{}", job_id)).await.unwrap();
    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_message("no valid audio");
}

#[tokio::test]
async fn it_should_skip_failed_chunk_and_keep_order() {
    let pipeline = PipelineConfig {
        max_chunk_chars: 20,
        ..test_pipeline()
    };
    let ctx = TestContext::with_engine(MockBehavior::FailWhenContains("Bravo"), pipeline)
        .await
        .unwrap();

    let job_id = ctx
        .submit("Alpha one two. Bravo one two. Charlie one two.")
        .await;
    let status = ctx.wait_for_job(&job_id).await;
    assert_eq!(status["status"], "completed");
    assert_eq!(ctx.engine.calls(), 3);

    let response = ctx.client.get(&format!("/audio/{}", job_id)).await.unwrap();
    response.assert_status(StatusCode::OK);

    let samples = wav_samples(&response.body_bytes);
    assert_eq!(samples.len(), 2 * SAMPLES_PER_CHUNK);
    assert!((samples[0] - tone_for("Alpha")).abs() <= 1);
    assert!((samples[SAMPLES_PER_CHUNK] - tone_for("Charlie")).abs() <= 1);
}

#[tokio::test]
async fn it_should_return_conflict_while_job_is_processing() {
    let pipeline = PipelineConfig {
        chunk_timeout: Duration::from_secs(30),
        ..test_pipeline()
    };
    let ctx = TestContext::with_engine(MockBehavior::Hang, pipeline)
        .await
        .unwrap();

    let job_id = ctx.submit("Hello world.").await;

    let response = ctx.client.get(&format!("/status/{}", job_id)).await.unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.body.as_ref().unwrap()["status"], "processing");

    let response = ctx.client.get(&format!("/audio/{}", job_id)).await.unwrap();
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn it_should_truncate_overlong_text_and_still_complete() {
    let pipeline = PipelineConfig {
        max_text_chars: 100,
        max_chunk_chars: 60,
        max_chunks: 3,
        ..test_pipeline()
    };
    let ctx = TestContext::with_engine(MockBehavior::Succeed, pipeline)
        .await
        .unwrap();

    let job_id = ctx.submit(&"This sentence is repeated. ".repeat(40)).await;
    let status = ctx.wait_for_job(&job_id).await;

    assert_eq!(status["status"], "completed");
    assert!(ctx.engine.calls() <= 3);
}
