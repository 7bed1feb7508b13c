//! # gemini-drive-assistant
//!
//! Short, driver-friendly replies from Google's Gemini API, optionally grounded on
//! Google Maps around the driver's position.

pub mod assistant;
mod client;
pub mod generation;
mod models;
pub mod prelude;
pub mod tools;


pub use assistant::{
    driving_prompt, render_reply, Assistant, AssistantConfig, ContentGenerator,
    Error as AssistantError, GeoLocation, LocationMode, ReplyError, CONNECTION_LOST_REPLY,
    EMPTY_RESPONSE_REPLY, FOUND_NEARBY_LABEL, MISSING_API_KEY_REPLY,
};
pub use client::{Error as ClientError, Gemini, DEFAULT_MODEL, PRO_MODEL};
pub use generation::{
    BlockReason, Candidate, ContentBuilder, FinishReason, GenerateContentRequest, GenerationConfig,
    GenerationResponse, GroundingChunk, GroundingMetadata, GroundingSupport, MapsGroundingChunk,
    PromptFeedback, Segment, UsageMetadata, WebGroundingChunk,
};
pub use models::{CitationMetadata, CitationSource, Content, Message, Part, Role};
pub use tools::{GoogleMapsConfig, GoogleSearchConfig, LatLng, RetrievalConfig, Tool, ToolConfig};
