use async_trait::async_trait;
use gemini_drive_assistant::{
    Assistant, AssistantConfig, ClientError, ContentGenerator, GenerateContentRequest,
    GenerationResponse, GeoLocation, LatLng, LocationMode, Tool, CONNECTION_LOST_REPLY,
    EMPTY_RESPONSE_REPLY, MISSING_API_KEY_REPLY,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Answers every request with a canned response and keeps what it was sent.
#[derive(Clone)]
struct Recording {
    response: GenerationResponse,
    requests: Arc<Mutex<Vec<GenerateContentRequest>>>,
}

impl Recording {
    fn new(response: serde_json::Value) -> Self {
        Self {
            response: serde_json::from_value(response).unwrap(),
            requests: Arc::default(),
        }
    }

    fn text(text: &str) -> Self {
        Self::new(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }]
        }))
    }

    fn sent(&self) -> Vec<GenerateContentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentGenerator for Recording {
    async fn generate(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, ClientError> {
        self.requests.lock().unwrap().push(request);
        Ok(self.response.clone())
    }
}

/// Fails like an overloaded backend would.
struct Failing;

#[async_trait]
impl ContentGenerator for Failing {
    async fn generate(
        &self,
        _request: GenerateContentRequest,
    ) -> Result<GenerationResponse, ClientError> {
        Err(ClientError::BadResponse {
            code: 503,
            description: Some("The model is overloaded.".to_string()),
        })
    }
}

/// Must never be reached.
struct Unreachable;

#[async_trait]
impl ContentGenerator for Unreachable {
    async fn generate(
        &self,
        _request: GenerateContentRequest,
    ) -> Result<GenerationResponse, ClientError> {
        panic!("no request may be sent without a credential");
    }
}

#[tokio::test]
async fn missing_credential_returns_fixed_message() {
    let assistant = Assistant::new(AssistantConfig::new()).unwrap();
    assert!(!assistant.is_configured());

    let reply = assistant
        .generate_response("Navigate home", Some(GeoLocation::new(1.0, 2.0)))
        .await;
    assert_eq!(reply, MISSING_API_KEY_REPLY);
    assert_eq!(reply, "Error: API Key missing.");
}

#[tokio::test]
async fn blank_explicit_key_returns_fixed_message() {
    let assistant = Assistant::new(AssistantConfig::new().with_api_key("  ")).unwrap();
    assert!(!assistant.is_configured());
    let reply = assistant.generate_response("Navigate home", None).await;
    assert_eq!(reply, MISSING_API_KEY_REPLY);
}

#[tokio::test]
async fn unconfigured_assistant_never_calls_a_generator() {
    let assistant = Assistant::<Unreachable>::unconfigured(LocationMode::MapsGrounding);
    let reply = assistant.generate_response("Navigate home", None).await;
    assert_eq!(reply, MISSING_API_KEY_REPLY);
}

#[tokio::test]
async fn prompt_without_location_is_sent_unchanged() {
    let generator = Recording::text("Sure.");
    let assistant = Assistant::with_generator(generator.clone(), LocationMode::PromptContext);

    let reply = assistant.generate_response("Call mom", None).await;
    assert_eq!(reply, "Sure.");

    let sent = generator.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].texts().collect::<Vec<_>>(), ["Call mom"]);
    assert_eq!(sent[0].tools, None);
}

#[tokio::test]
async fn location_is_embedded_in_prompt_context() {
    let generator = Recording::text("Exit 12 has a station.");
    let assistant = Assistant::with_generator(generator.clone(), LocationMode::PromptContext);

    assistant
        .generate_response(
            "Where can I refuel?",
            Some(GeoLocation::new(48.8566, 2.3522)),
        )
        .await;

    let sent = generator.sent();
    let prompt: String = sent[0].texts().collect();
    assert!(prompt.contains("latitude 48.8566"), "{prompt}");
    assert!(prompt.contains("longitude 2.3522"), "{prompt}");
    assert!(prompt.contains("driving"), "{prompt}");
    assert!(prompt.ends_with("User question: Where can I refuel?"), "{prompt}");
    assert_eq!(sent[0].tools, None);
}

#[tokio::test]
async fn location_is_passed_as_maps_retrieval_config() {
    let generator = Recording::text("Two chargers nearby.");
    let assistant = Assistant::with_generator(generator.clone(), LocationMode::MapsGrounding);

    assistant
        .generate_response("Any EV chargers?", Some(GeoLocation::new(35.6762, 139.6503)))
        .await;

    let sent = generator.sent();
    let request = &sent[0];
    assert_eq!(request.texts().collect::<Vec<_>>(), ["Any EV chargers?"]);
    assert_eq!(request.tools, Some(vec![Tool::google_maps(None)]));
    let lat_lng = request
        .tool_config
        .as_ref()
        .and_then(|config| config.retrieval_config.as_ref())
        .and_then(|retrieval| retrieval.lat_lng);
    assert_eq!(lat_lng, Some(LatLng::new(35.6762, 139.6503)));
    assert!(request.system_instruction.is_some());

    let body = serde_json::to_string(request).unwrap();
    assert!(body.contains("35.6762") && body.contains("139.6503"), "{body}");
}

#[tokio::test]
async fn remote_failure_returns_apology() {
    let assistant = Assistant::with_generator(Failing, LocationMode::PromptContext);
    let reply = assistant
        .generate_response("What's the weather?", Some(GeoLocation::new(0.0, 0.0)))
        .await;
    assert_eq!(reply, CONNECTION_LOST_REPLY);
    assert_eq!(reply, "Sorry, I lost connection to the cloud.");
}

#[tokio::test]
async fn safety_blocked_answer_returns_apology() {
    let generator = Recording::new(json!({
        "candidates": [{ "finishReason": "SAFETY" }]
    }));
    let assistant = Assistant::with_generator(generator, LocationMode::PromptContext);
    let reply = assistant.generate_response("Drive faster?", None).await;
    assert_eq!(reply, CONNECTION_LOST_REPLY);
    assert_eq!(reply, "Sorry, I lost connection to the cloud.");
}

#[tokio::test]
async fn blocked_prompt_returns_apology() {
    let generator = Recording::new(json!({
        "promptFeedback": { "blockReason": "SAFETY" }
    }));
    let assistant = Assistant::with_generator(generator, LocationMode::MapsGrounding);
    let reply = assistant
        .generate_response("Drive faster?", Some(GeoLocation::new(1.0, 2.0)))
        .await;
    assert_eq!(reply, CONNECTION_LOST_REPLY);
}

#[tokio::test]
async fn empty_text_returns_fallback() {
    let generator = Recording::text("");
    let assistant = Assistant::with_generator(generator, LocationMode::PromptContext);
    let reply = assistant.generate_response("Hmm", None).await;
    assert_eq!(reply, EMPTY_RESPONSE_REPLY);
    assert_eq!(reply, "I'm not sure how to help with that while driving.");
}

#[tokio::test]
async fn grounded_places_are_appended() {
    let generator = Recording::new(json!({
        "candidates": [{
            "content": { "parts": [{ "text": "There are two cafes ahead." }], "role": "model" },
            "groundingMetadata": {
                "groundingChunks": [
                    { "maps": { "title": "Cafe A", "uri": "https://maps.google.com/?cid=1" } },
                    { "maps": { "title": "Cafe B", "uri": "https://maps.google.com/?cid=2" } }
                ]
            }
        }]
    }));
    let assistant = Assistant::with_generator(generator, LocationMode::MapsGrounding);

    let reply = assistant
        .generate_response("Coffee?", Some(GeoLocation::new(37.78193, -122.40476)))
        .await;
    assert!(reply.starts_with("There are two cafes ahead."), "{reply}");
    assert!(reply.ends_with("Found nearby: Cafe A, Cafe B"), "{reply}");
}

#[tokio::test]
async fn grounded_places_follow_the_empty_fallback() {
    let generator = Recording::new(json!({
        "candidates": [{
            "content": { "parts": [] },
            "groundingMetadata": {
                "groundingChunks": [{ "maps": { "title": "Cafe A" } }]
            }
        }]
    }));
    let assistant = Assistant::with_generator(generator, LocationMode::MapsGrounding);

    let reply = assistant.generate_response("Coffee?", None).await;
    assert_eq!(reply, format!("{EMPTY_RESPONSE_REPLY}\n\nFound nearby: Cafe A"));
}

#[tokio::test]
async fn transport_failure_from_real_client_returns_apology() {
    // Nothing listens on port 1, so the connection is refused without leaving the host
    let config = AssistantConfig::new()
        .with_api_key("test-key")
        .with_base_url("http://127.0.0.1:1/v1beta/");
    let assistant = Assistant::new(config).unwrap();
    assert!(assistant.is_configured());

    let reply = assistant
        .generate_response("Hello", Some(GeoLocation::new(1.5, 2.5)))
        .await;
    assert_eq!(reply, CONNECTION_LOST_REPLY);
}

#[test]
fn invalid_base_url_is_a_construction_error() {
    let config = AssistantConfig::new()
        .with_api_key("test-key")
        .with_base_url("not a url");
    let error = Assistant::new(config).unwrap_err();
    assert!(error.to_string().contains("not a url"), "{error}");
}
