use crate::generation::{ContentBuilder, GenerateContentRequest, GenerationResponse};
use reqwest::{
    header::{HeaderMap, HeaderValue, InvalidHeaderValue},
    Client, Response,
};
use snafu::{ResultExt, Snafu};
use std::sync::{Arc, LazyLock};
use tracing::instrument;
use url::Url;

static DEFAULT_BASE_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://generativelanguage.googleapis.com/v1beta/")
        .expect("unreachable error: failed to parse default base URL")
});

pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash";
pub const PRO_MODEL: &str = "models/gemini-2.5-pro";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to construct URL (probably incorrect model name): {suffix}"))]
    ConstructUrl {
        source: url::ParseError,
        suffix: String,
    },

    #[snafu(display("failed to perform request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    #[snafu(display(
        "bad response from server; code {code}; description: {}",
        description.as_deref().unwrap_or("none")
    ))]
    BadResponse {
        /// HTTP status code
        code: u16,
        /// HTTP error description
        description: Option<String>,
    },

    #[snafu(display("failed to decode JSON response"))]
    DecodeResponse { source: reqwest::Error },

    #[snafu(display("invalid API key"))]
    InvalidApiKey { source: InvalidHeaderValue },

    #[snafu(display("failed to build the HTTP client"))]
    BuildHttpClient { source: reqwest::Error },
}

/// Internal client for making requests to the Gemini API
#[derive(Debug)]
pub(crate) struct GeminiClient {
    http_client: Client,
    pub model: String,
    base_url: Url,
}

impl GeminiClient {
    /// Create a new client with custom base URL
    fn with_base_url(api_key: &str, model: String, base_url: Url) -> Result<Self, Error> {
        let mut api_key = HeaderValue::from_str(api_key).context(InvalidApiKeySnafu)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", api_key);

        let http_client = Client::builder()
            .default_headers(headers)
            .build()
            .context(BuildHttpClientSnafu)?;

        Ok(Self {
            http_client,
            model: normalize_model(model),
            base_url,
        })
    }

    /// Generate content
    #[instrument(skip_all, fields(model = %self.model))]
    pub(crate) async fn generate_content_raw(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        let url = self.build_url("generateContent")?;

        let response = self
            .http_client
            .post(url.clone())
            .json(&request)
            .send()
            .await
            .context(PerformRequestSnafu { url })?;

        let response = Self::check_response(response).await?;
        response.json().await.context(DecodeResponseSnafu)
    }

    /// Turn a non-2xx response into [`Error::BadResponse`]
    async fn check_response(response: Response) -> Result<Response, Error> {
        let status = response.status();
        if !status.is_success() {
            let description = response.text().await.ok();
            BadResponseSnafu {
                code: status.as_u16(),
                description,
            }
            .fail()
        } else {
            Ok(response)
        }
    }

    /// Build a URL for the API
    fn build_url(&self, endpoint: &str) -> Result<Url, Error> {
        let suffix = format!("{}:{endpoint}", self.model);
        self.base_url
            .join(&suffix)
            .context(ConstructUrlSnafu { suffix })
    }
}

/// Prefix bare model names such as `gemini-2.5-flash` with `models/`.
fn normalize_model(model: String) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model
    } else {
        format!("models/{model}")
    }
}

/// Client for the Gemini API
#[derive(Clone, Debug)]
pub struct Gemini {
    client: Arc<GeminiClient>,
}

impl Gemini {
    /// Create a new client with the specified API key
    pub fn new(api_key: impl AsRef<str>) -> Result<Self, Error> {
        Self::with_model(api_key, DEFAULT_MODEL.to_string())
    }

    /// Create a new client for the Gemini Pro model
    pub fn pro(api_key: impl AsRef<str>) -> Result<Self, Error> {
        Self::with_model(api_key, PRO_MODEL.to_string())
    }

    /// Create a new client with the specified API key and model
    pub fn with_model(api_key: impl AsRef<str>, model: impl Into<String>) -> Result<Self, Error> {
        Self::with_model_and_base_url(api_key, model, DEFAULT_BASE_URL.clone())
    }

    /// Create a new client with the specified API key, model, and base URL
    pub fn with_model_and_base_url(
        api_key: impl AsRef<str>,
        model: impl Into<String>,
        base_url: Url,
    ) -> Result<Self, Error> {
        let client = GeminiClient::with_base_url(api_key.as_ref(), model.into(), base_url)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Fully qualified name of the model this client talks to
    pub fn model(&self) -> &str {
        &self.client.model
    }

    /// Start building a content generation request
    pub fn generate_content(&self) -> ContentBuilder {
        ContentBuilder::new(self.client.clone())
    }

    /// Send a prebuilt request
    pub async fn execute_request(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        self.client.generate_content_raw(request).await
    }
}
