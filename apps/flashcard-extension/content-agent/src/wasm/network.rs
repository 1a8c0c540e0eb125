use std::time::Duration;

use async_trait::async_trait;
use flashcard_client_core::config::EndpointVariant;
use flashcard_client_core::wire::{build_request, classify_response};
use flashcard_client_core::{
    ClientError, DisplayTimer, GenerationClient, GenerationOutcome, GenerationPayload,
};
use gloo_net::http::Request;

use super::*;

/// POSTs to the generation service with `fetch`. One attempt, no timeout.
pub(crate) struct HttpGenerationClient {
    config: AgentConfig,
    variant: EndpointVariant,
}

impl HttpGenerationClient {
    pub(crate) fn new(config: &AgentConfig, variant: EndpointVariant) -> Self {
        Self {
            config: config.clone(),
            variant,
        }
    }
}

#[async_trait(?Send)]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, payload: &GenerationPayload) -> Result<GenerationOutcome, ClientError> {
        let request = build_request(payload, self.variant);
        let url = self.config.endpoint_url(request.path());
        let body = request.body_json()?;
        tracing::debug!(%url, variant = self.variant.as_str(), "sending generation request");

        let response = Request::post(&url)
            .header("Content-Type", "application/json")
            .body(body)
            .map_err(|error| ClientError::Encode(error.to_string()))?
            .send()
            .await
            .map_err(|error| ClientError::Network(error.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| ClientError::Network(error.to_string()))?;
        classify_response(&request, status, &text)
    }
}

pub(crate) struct GlooDisplayTimer;

#[async_trait(?Send)]
impl DisplayTimer for GlooDisplayTimer {
    async fn wait(&self, duration: Duration) {
        sleep(duration).await;
    }
}
