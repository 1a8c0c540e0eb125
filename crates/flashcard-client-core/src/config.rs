use serde::{Deserialize, Serialize};

use crate::payload::{CardCount, Destination};

pub const DEFAULT_SERVICE_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_CONVERSATION_DECK: &str = "ChatGPT Conversations";
pub const DEFAULT_TEXT_DECK: &str = "Web Learning";
pub const DEFAULT_CHAT_HOSTS: [&str; 2] = ["chat.openai.com", "chatgpt.com"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("service base url must not be empty")]
    EmptyBaseUrl,
    #[error("service base url must use http:// or https:// and include a host")]
    InvalidBaseUrl,
    #[error("failed to decode agent config: {0}")]
    Decode(String),
}

/// Which request/response contract the agent speaks to the generation service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointVariant {
    /// `POST /api/v1/flashcards/generate`, identity-scoped, array response.
    #[default]
    Current,
    /// `POST /flashcards` and `POST /flashcards/from-text`, status-flag response.
    Legacy,
}

impl EndpointVariant {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Legacy => "legacy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub service_base_url: String,
    pub endpoint_variant: EndpointVariant,
    pub conversation_deck: String,
    pub text_deck: String,
    pub default_card_count: CardCount,
    pub default_destination: Destination,
    pub chat_hosts: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            service_base_url: DEFAULT_SERVICE_BASE_URL.to_string(),
            endpoint_variant: EndpointVariant::Current,
            conversation_deck: DEFAULT_CONVERSATION_DECK.to_string(),
            text_deck: DEFAULT_TEXT_DECK.to_string(),
            default_card_count: CardCount::DEFAULT,
            default_destination: Destination::Anki,
            chat_hosts: DEFAULT_CHAT_HOSTS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl AgentConfig {
    /// Decodes a JSON override and normalizes it. Missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|error| ConfigError::Decode(error.to_string()))?;
        config.normalized()
    }

    pub fn normalized(mut self) -> Result<Self, ConfigError> {
        self.service_base_url = normalize_base_url(&self.service_base_url)?;
        self.chat_hosts = self
            .chat_hosts
            .iter()
            .map(|host| host.trim().to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect();
        Ok(self)
    }

    /// Joins an endpoint path onto the configured base url.
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.service_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// The conversation entry point is only offered on known chat hosts.
    #[must_use]
    pub fn is_chat_host(&self, hostname: &str) -> bool {
        let hostname = hostname.trim().to_ascii_lowercase();
        self.chat_hosts
            .iter()
            .any(|host| hostname == *host || hostname.ends_with(&format!(".{host}")))
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl);
    }
    let Some((_, remainder)) = trimmed.split_once("://") else {
        return Err(ConfigError::InvalidBaseUrl);
    };
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(ConfigError::InvalidBaseUrl);
    }
    Ok(trimmed.to_string())
}
