use abstractor::llm::GeminiClient;
use serde_json::json;
use wiremock::{
  matchers::{body_partial_json, header, method, path},
  Mock, MockServer, ResponseTemplate,
};

use super::*;

const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
  GeminiClient::new("test-key").with_host(&server.uri()).with_model("gemini-test")
}

async fn respond_with(template: ResponseTemplate) -> (MockServer, GeminiClient) {
  let server = MockServer::start().await;
  Mock::given(method("POST")).and(path(ENDPOINT)).respond_with(template).mount(&server).await;
  let client = client_for(&server);
  (server, client)
}

#[tokio::test]
async fn test_request_shape() -> TestResult<()> {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path(ENDPOINT))
    .and(header("x-goog-api-key", "test-key"))
    .and(body_partial_json(json!({
      "contents": [{ "role": "user", "parts": [{ "text": "Summarize me" }] }]
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "candidates": [{ "content": { "parts": [{ "text": " A summary. \n" }] }, "finishReason": "STOP" }]
    })))
    .expect(1)
    .mount(&server)
    .await;

  let client = client_for(&server);
  assert_eq!(client.call(&Prompt::from("Summarize me")).await, Ok("A summary.".to_string()));
  Ok(())
}

#[tokio::test]
async fn test_blocked_response() -> TestResult<()> {
  let (_server, client) = respond_with(
    ResponseTemplate::new(200).set_body_json(json!({ "promptFeedback": { "blockReason": "SAFETY" } })),
  )
  .await;

  assert_eq!(
    client.call(&Prompt::from("p")).await,
    Err(CallError::Blocked("Response blocked: SAFETY".to_string()))
  );
  Ok(())
}

#[tokio::test]
async fn test_quota_response() -> TestResult<()> {
  let (_server, client) = respond_with(ResponseTemplate::new(429).set_body_json(json!({
    "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
  })))
  .await;

  let error = client.call(&Prompt::from("p")).await.unwrap_err();
  assert_eq!(
    error,
    CallError::QuotaExceeded("Rate limit exceeded: Resource has been exhausted".to_string())
  );
  assert!(error.is_retryable());
  Ok(())
}

#[tokio::test]
async fn test_invalid_argument_response() -> TestResult<()> {
  let (_server, client) = respond_with(ResponseTemplate::new(400).set_body_json(json!({
    "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
  })))
  .await;

  let error = client.call(&Prompt::from("p")).await.unwrap_err();
  assert_eq!(error, CallError::InvalidInput("Invalid argument error: API key not valid".to_string()));
  assert!(!error.is_retryable());
  Ok(())
}

#[tokio::test]
async fn test_server_error_is_transient() -> TestResult<()> {
  let (_server, client) =
    respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>")).await;

  assert_eq!(
    client.call(&Prompt::from("p")).await,
    Err(CallError::Transient("HTTP 500: Internal Server Error".to_string()))
  );
  Ok(())
}

#[tokio::test]
async fn test_garbage_body_is_transient() -> TestResult<()> {
  let (_server, client) = respond_with(ResponseTemplate::new(200).set_body_string("not json")).await;

  assert!(matches!(client.call(&Prompt::from("p")).await, Err(CallError::Transient(_))));
  Ok(())
}

#[tokio::test]
async fn test_unreachable_host_is_transient() -> TestResult<()> {
  let server = MockServer::start().await;
  let client = client_for(&server);
  drop(server);

  assert!(matches!(client.call(&Prompt::from("p")).await, Err(CallError::Transient(_))));
  Ok(())
}

#[tokio::test]
async fn test_probe_sends_a_test_prompt() -> TestResult<()> {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path(ENDPOINT))
    .and(body_partial_json(json!({ "contents": [{ "parts": [{ "text": "test" }] }] })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
    })))
    .expect(1)
    .mount(&server)
    .await;

  client_for(&server).probe().await?;
  Ok(())
}
