use std::sync::Arc;
use tracing::instrument;

use crate::{
    client::{Error as ClientError, GeminiClient},
    generation::{GenerateContentRequest, GenerationConfig, GenerationResponse},
    tools::{LatLng, RetrievalConfig, Tool, ToolConfig},
    Content, Message,
};

/// Fluent construction of a request without a client attached.
///
/// [`ContentBuilder`] forwards to these, so a request built here is the same one
/// `Gemini::generate_content()` would send.
impl GenerateContentRequest {
    /// Sets the system instruction for the request.
    ///
    /// System instructions are used to provide high-level guidance to the model, such as
    /// setting a persona, providing context, or defining the desired output format.
    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(Content::text(text));
        self
    }

    /// Adds a user message to the conversation history.
    pub fn with_user_message(mut self, text: impl Into<String>) -> Self {
        self.contents.push(Message::user(text).content);
        self
    }

    /// Adds a model message to the conversation history.
    pub fn with_model_message(mut self, text: impl Into<String>) -> Self {
        self.contents.push(Message::model(text).content);
        self
    }

    /// Adds a `Message` to the conversation history.
    pub fn with_message(mut self, message: Message) -> Self {
        let content = message.content;
        let role = content.role.unwrap_or(message.role);
        self.contents.push(content.with_role(role));
        self
    }

    /// Adds raw content to the conversation history.
    pub fn with_content(mut self, content: Content) -> Self {
        self.contents.push(content);
        self
    }

    /// Sets the generation configuration for the request.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    /// Sets the temperature for the request.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .temperature = Some(temperature);
        self
    }

    /// Sets the maximum number of output tokens for the request.
    pub fn with_max_output_tokens(mut self, max_output_tokens: i32) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Adds a tool to the request.
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.get_or_insert_with(Vec::new).push(tool);
        self
    }

    /// Adds the Google Maps grounding tool, without the widget token.
    pub fn with_google_maps(self) -> Self {
        self.with_tool(Tool::google_maps(None))
    }

    /// Sets the tool configuration for the request.
    pub fn with_tool_config(mut self, tool_config: ToolConfig) -> Self {
        self.tool_config = Some(tool_config);
        self
    }

    /// Sets the location that grounding tools should answer around.
    ///
    /// Keeps any other tool configuration already present.
    pub fn with_location(mut self, lat_lng: LatLng) -> Self {
        self.tool_config
            .get_or_insert_with(Default::default)
            .retrieval_config
            .get_or_insert_with(RetrievalConfig::default)
            .lat_lng = Some(lat_lng);
        self
    }
}

/// Builder for content generation requests
#[derive(Clone)]
pub struct ContentBuilder {
    client: Arc<GeminiClient>,
    request: GenerateContentRequest,
}

impl ContentBuilder {
    /// Creates a new `ContentBuilder`.
    pub(crate) fn new(client: Arc<GeminiClient>) -> Self {
        Self {
            client,
            request: GenerateContentRequest::default(),
        }
    }

    fn map(mut self, f: impl FnOnce(GenerateContentRequest) -> GenerateContentRequest) -> Self {
        self.request = f(self.request);
        self
    }

    /// Sets the system instruction for the request.
    pub fn with_system_instruction(self, text: impl Into<String>) -> Self {
        self.map(|request| request.with_system_instruction(text))
    }

    /// Adds a user message to the conversation history.
    pub fn with_user_message(self, text: impl Into<String>) -> Self {
        self.map(|request| request.with_user_message(text))
    }

    /// Adds a model message to the conversation history.
    pub fn with_model_message(self, text: impl Into<String>) -> Self {
        self.map(|request| request.with_model_message(text))
    }

    /// Adds a `Message` to the conversation history.
    pub fn with_message(self, message: Message) -> Self {
        self.map(|request| request.with_message(message))
    }

    /// Adds raw content to the conversation history.
    pub fn with_content(self, content: Content) -> Self {
        self.map(|request| request.with_content(content))
    }

    /// Sets the generation configuration for the request.
    pub fn with_generation_config(self, config: GenerationConfig) -> Self {
        self.map(|request| request.with_generation_config(config))
    }

    /// Sets the temperature for the request.
    ///
    /// Temperature controls the randomness of the output. Higher values (e.g., 1.0) produce
    /// more creative results, while lower values (e.g., 0.2) produce more deterministic results.
    pub fn with_temperature(self, temperature: f32) -> Self {
        self.map(|request| request.with_temperature(temperature))
    }

    /// Sets the maximum number of output tokens for the request.
    pub fn with_max_output_tokens(self, max_output_tokens: i32) -> Self {
        self.map(|request| request.with_max_output_tokens(max_output_tokens))
    }

    /// Adds a tool to the request.
    pub fn with_tool(self, tool: Tool) -> Self {
        self.map(|request| request.with_tool(tool))
    }

    /// Adds the Google Maps grounding tool, without the widget token.
    pub fn with_google_maps(self) -> Self {
        self.map(GenerateContentRequest::with_google_maps)
    }

    /// Sets the tool configuration for the request.
    pub fn with_tool_config(self, tool_config: ToolConfig) -> Self {
        self.map(|request| request.with_tool_config(tool_config))
    }

    /// Sets the location that grounding tools should answer around.
    pub fn with_location(self, lat_lng: LatLng) -> Self {
        self.map(|request| request.with_location(lat_lng))
    }

    /// Builds the `GenerateContentRequest`.
    pub fn build(self) -> GenerateContentRequest {
        self.request
    }

    /// Executes the content generation request.
    #[instrument(skip_all, fields(
        messages.parts.count = self.request.contents.len(),
        tools.present = self.request.tools.is_some(),
        system.instruction.present = self.request.system_instruction.is_some(),
    ))]
    pub async fn execute(self) -> Result<GenerationResponse, ClientError> {
        let client = self.client.clone();
        let request = self.build();
        client.generate_content_raw(request).await
    }
}

#[cfg(test)]
mod tests {
    use crate::{Gemini, GenerateContentRequest, LatLng, Role, Tool};

    fn builder() -> super::ContentBuilder {
        Gemini::new("test-key").unwrap().generate_content()
    }

    #[test]
    fn user_message_carries_user_role() {
        let request = builder().with_user_message("Where can I park?").build();
        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].role, Some(Role::User));
        assert_eq!(request.texts().collect::<Vec<_>>(), ["Where can I park?"]);
    }

    #[test]
    fn location_lands_in_retrieval_config() {
        let request = builder()
            .with_user_message("Coffee?")
            .with_google_maps()
            .with_location(LatLng::new(52.52, 13.405))
            .build();

        assert_eq!(request.tools, Some(vec![Tool::google_maps(None)]));
        let lat_lng = request
            .tool_config
            .and_then(|config| config.retrieval_config)
            .and_then(|retrieval| retrieval.lat_lng)
            .unwrap();
        assert_eq!(lat_lng, LatLng::new(52.52, 13.405));
    }

    #[test]
    fn temperature_and_token_limit_share_one_config() {
        let request = builder()
            .with_temperature(0.2)
            .with_max_output_tokens(128)
            .build();
        let config = request.generation_config.unwrap();
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.max_output_tokens, Some(128));
    }

    #[test]
    fn client_builder_and_detached_request_agree() {
        let from_client = builder()
            .with_system_instruction("Be brief.")
            .with_user_message("Coffee?")
            .with_google_maps()
            .with_location(LatLng::new(1.0, 2.0))
            .build();
        let detached = GenerateContentRequest::default()
            .with_system_instruction("Be brief.")
            .with_user_message("Coffee?")
            .with_google_maps()
            .with_location(LatLng::new(1.0, 2.0));
        assert_eq!(from_client, detached);
    }
}
