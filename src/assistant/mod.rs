//! # In-car assistant replies
//!
//! [`Assistant`] turns a driver's prompt, and optionally their position, into a single
//! short text reply. It never fails at call time: a missing API key and any remote error
//! both come back as fixed reply strings, with the error logged through `tracing`.
//!
//! ## Example usage:
//! ```rust,ignore
//! use gemini_drive_assistant::{Assistant, GeoLocation};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let assistant = Assistant::from_env()?;
//!     let reply = assistant
//!         .generate_response("Where can I get coffee?", Some(GeoLocation::new(37.78, -122.40)))
//!         .await;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```

mod config;
mod location;

pub use config::{AssistantConfig, API_KEY_VARS, BASE_URL_VAR, LOCATION_MODE_VAR, MODEL_VAR};
pub use location::{
    driving_prompt, GeoLocation, LocationMode, UnknownLocationMode, DRIVING_SYSTEM_INSTRUCTION,
};

use async_trait::async_trait;
use snafu::{ResultExt, Snafu};
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::{
    client::{Error as ClientError, Gemini},
    generation::{BlockReason, FinishReason, GenerateContentRequest, GenerationResponse},
};

/// Reply when no API key is configured.
pub const MISSING_API_KEY_REPLY: &str = "Error: API Key missing.";
/// Reply when the model answered with no text.
pub const EMPTY_RESPONSE_REPLY: &str = "I'm not sure how to help with that while driving.";
/// Reply when the request to the model failed or the answer was blocked.
pub const CONNECTION_LOST_REPLY: &str = "Sorry, I lost connection to the cloud.";
/// Label in front of the grounded place names appended to a reply.
pub const FOUND_NEARBY_LABEL: &str = "Found nearby: ";

/// Errors from building an [`Assistant`].
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to create the Gemini client"))]
    Client { source: Box<ClientError> },

    #[snafu(display("invalid Gemini base URL '{url}'"))]
    ParseBaseUrl { source: url::ParseError, url: String },
}

/// Why a prompt produced no usable reply.
///
/// [`Assistant::generate_response`] logs these and answers with [`CONNECTION_LOST_REPLY`].
#[derive(Debug, Snafu)]
pub enum ReplyError {
    #[snafu(display("Gemini request failed"))]
    Request { source: ClientError },

    #[snafu(display("prompt was blocked: {reason:?}"))]
    PromptBlocked { reason: BlockReason },

    #[snafu(display("answer was blocked: {reason:?}"))]
    CandidateBlocked { reason: FinishReason },
}

/// Something that can answer a `generateContent` request.
///
/// [`Gemini`] is the real implementation; tests substitute their own.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, ClientError>;
}

#[async_trait]
impl ContentGenerator for Gemini {
    async fn generate(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, ClientError> {
        self.execute_request(request).await
    }
}

/// Produces short, driver-friendly replies.
///
/// Built once with [`Assistant::new`] or [`Assistant::from_env`] and then shared; the
/// underlying client is cheap to clone.
#[derive(Debug, Clone)]
pub struct Assistant<G = Gemini> {
    generator: Option<G>,
    location_mode: LocationMode,
}

impl Assistant<Gemini> {
    /// Build an assistant talking to Gemini.
    ///
    /// A missing API key is not an error: the assistant is created without a backend and
    /// answers every prompt with [`MISSING_API_KEY_REPLY`].
    pub fn new(config: AssistantConfig) -> Result<Self, Error> {
        let AssistantConfig {
            api_key,
            model,
            base_url,
            location_mode,
        } = config;

        let Some(api_key) = api_key else {
            warn!(
                vars = ?API_KEY_VARS,
                "Gemini API key is missing; replies will report the missing key"
            );
            return Ok(Self::unconfigured(location_mode));
        };

        let gemini = match base_url {
            Some(url) => {
                let base_url = Url::parse(&url).context(ParseBaseUrlSnafu { url })?;
                Gemini::with_model_and_base_url(&api_key, model, base_url)
            }
            None => Gemini::with_model(&api_key, model),
        }
        .map_err(Box::new)
        .context(ClientSnafu)?;

        debug!(model = gemini.model(), %location_mode, "assistant ready");
        Ok(Self::with_generator(gemini, location_mode))
    }

    /// Build an assistant from [`AssistantConfig::from_env`].
    pub fn from_env() -> Result<Self, Error> {
        Self::new(AssistantConfig::from_env())
    }
}

impl<G: ContentGenerator> Assistant<G> {
    /// Wrap an existing generator.
    pub fn with_generator(generator: G, location_mode: LocationMode) -> Self {
        Self {
            generator: Some(generator),
            location_mode,
        }
    }

    /// An assistant with no credential; every reply is [`MISSING_API_KEY_REPLY`].
    pub fn unconfigured(location_mode: LocationMode) -> Self {
        Self {
            generator: None,
            location_mode,
        }
    }

    /// Whether an API key was available when this assistant was built.
    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    pub fn location_mode(&self) -> LocationMode {
        self.location_mode
    }

    /// The request [`generate_response`](Self::generate_response) sends for these inputs.
    pub fn build_request(
        &self,
        prompt: &str,
        location: Option<GeoLocation>,
    ) -> GenerateContentRequest {
        let request = GenerateContentRequest::default();
        match (location, self.location_mode) {
            (None, _) => request.with_user_message(prompt),
            (Some(location), LocationMode::PromptContext) => {
                request.with_user_message(driving_prompt(prompt, location))
            }
            (Some(location), LocationMode::MapsGrounding) => request
                .with_user_message(prompt)
                .with_system_instruction(DRIVING_SYSTEM_INSTRUCTION)
                .with_google_maps()
                .with_location(location.into()),
        }
    }

    /// Answer `prompt`, using `location` when known.
    ///
    /// Always returns displayable text; see the reply constants in this module for the
    /// fixed answers.
    #[instrument(skip_all, fields(
        prompt.len = prompt.len(),
        location.present = location.is_some(),
        location.mode = %self.location_mode,
    ))]
    pub async fn generate_response(&self, prompt: &str, location: Option<GeoLocation>) -> String {
        let Some(generator) = &self.generator else {
            warn!("no Gemini API key configured");
            return MISSING_API_KEY_REPLY.to_string();
        };

        let request = self.build_request(prompt, location);
        let reply = generator
            .generate(request)
            .await
            .context(RequestSnafu)
            .and_then(|response| render_reply(&response));
        match reply {
            Ok(reply) => reply,
            Err(error) => {
                error!(
                    error = &error as &(dyn std::error::Error + 'static),
                    "no reply from Gemini"
                );
                CONNECTION_LOST_REPLY.to_string()
            }
        }
    }
}

/// Reply text for a response, with grounded places appended.
///
/// A blocked prompt, or a first candidate stopped by a content filter, is an error
/// rather than an empty answer.
pub fn render_reply(response: &GenerationResponse) -> Result<String, ReplyError> {
    if let Some(reason) = response.prompt_block_reason() {
        return PromptBlockedSnafu {
            reason: reason.clone(),
        }
        .fail();
    }
    if let Some(reason) = response
        .candidates
        .first()
        .and_then(|candidate| candidate.finish_reason.as_ref())
        .filter(|reason| reason.is_blocked())
    {
        return CandidateBlockedSnafu {
            reason: reason.clone(),
        }
        .fail();
    }

    let text = response.text();
    let mut reply = if text.trim().is_empty() {
        EMPTY_RESPONSE_REPLY.to_string()
    } else {
        text
    };

    let places = response.maps_place_titles();
    if !places.is_empty() {
        debug!(places = places.len(), "appending grounded places");
        reply.push_str("\n\n");
        reply.push_str(FOUND_NEARBY_LABEL);
        reply.push_str(&places.join(", "));
    }

    Ok(reply)
}
