//! Hosted text-generation client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use sanstha_shared::{AppConfig, Result, SansthaError, generation_api_key};

use crate::build_client;

/// Produces raw text for a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the generated text, or [`SansthaError::Generation`] with the
    /// upstream message when the service reports one.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub do_sample: bool,
    pub return_full_text: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 800,
            temperature: 0.7,
            top_p: 0.9,
            do_sample: true,
            return_full_text: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParams,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Generated(Vec<GeneratedText>),
    Failed { error: String },
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    #[serde(default)]
    generated_text: Option<String>,
}

/// Client for a Hugging Face style inference endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    endpoint: String,
    api_key: String,
    params: GenerationParams,
}

impl InferenceClient {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        params: GenerationParams,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            params,
        }
    }

    /// Build from the `[generation]` config section.
    ///
    /// Fails with a config error when the API key env var is unset.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = generation_api_key(config)?;
        let client = build_client(config.gateway.timeout_secs)?;
        let params = GenerationParams {
            max_new_tokens: config.generation.max_new_tokens,
            temperature: config.generation.temperature,
            top_p: config.generation.top_p,
            ..GenerationParams::default()
        };
        Ok(Self::new(
            client,
            config.generation.endpoint.clone(),
            api_key,
            params,
        ))
    }
}

#[async_trait]
impl TextGenerator for InferenceClient {
    #[instrument(skip_all, fields(prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = InferenceRequest {
            inputs: prompt,
            parameters: &self.params,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SansthaError::Generation(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| {
                SansthaError::Generation(format!("{}: failed to read body: {e}", self.endpoint))
            })?;

        let parsed = serde_json::from_str::<InferenceResponse>(&text);

        if !status.is_success() {
            let message = match parsed {
                Ok(InferenceResponse::Failed { error }) => error,
                _ => format!("HTTP {status}"),
            };
            warn!(%status, %message, "generation request rejected");
            return Err(SansthaError::Generation(message));
        }

        match parsed {
            Ok(InferenceResponse::Generated(outputs)) => {
                let generated = outputs
                    .into_iter()
                    .find_map(|o| o.generated_text)
                    .filter(|t| !t.trim().is_empty())
                    .ok_or_else(|| {
                        SansthaError::Generation("response contained no generated_text".into())
                    })?;
                debug!(chars = generated.len(), "text generated");
                Ok(generated)
            }
            Ok(InferenceResponse::Failed { error }) => Err(SansthaError::Generation(error)),
            Err(e) => Err(SansthaError::Generation(format!(
                "unexpected response shape: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> InferenceClient {
        InferenceClient::new(
            build_client(5).unwrap(),
            format!("{}/models/test", server.uri()),
            "hf_test",
            GenerationParams::default(),
        )
    }

    #[tokio::test]
    async fn sends_prompt_and_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/test"))
            .and(header("authorization", "Bearer hf_test"))
            .and(body_partial_json(serde_json::json!({
                "inputs": "Write about SEO",
                "parameters": { "max_new_tokens": 800, "do_sample": true, "return_full_text": false }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "generated_text": "Body text" }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server).generate("Write about SEO").await.unwrap();
        assert_eq!(text, "Body text");
    }

    #[tokio::test]
    async fn missing_generated_text_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{}])))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("x").await.unwrap_err();
        assert!(matches!(err, SansthaError::Generation(_)));
    }

    #[tokio::test]
    async fn upstream_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(serde_json::json!({ "error": "Model is currently loading" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).generate("x").await.unwrap_err();
        match err {
            SansthaError::Generation(msg) => assert_eq!(msg, "Model is currently loading"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_failure_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("x").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_generation_error() {
        let client = InferenceClient::new(
            build_client(2).unwrap(),
            "http://127.0.0.1:9/models/test",
            "hf_test",
            GenerationParams::default(),
        );

        let err = client.generate("x").await.unwrap_err();
        match err {
            SansthaError::Generation(msg) => assert!(msg.contains("127.0.0.1:9/models/test")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "generated_text": "late" }]))
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = InferenceClient::new(
            build_client(1).unwrap(),
            format!("{}/models/test", server.uri()),
            "hf_test",
            GenerationParams::default(),
        );
        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, SansthaError::Generation(_)));
    }
}
