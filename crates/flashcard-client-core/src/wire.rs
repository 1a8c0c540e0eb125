//! HTTP contract of the generation service.
//!
//! Two incompatible shapes coexist: the identity-scoped endpoint answers with an
//! array of generated cards, the legacy endpoints answer with a status flag.
//! Both are expressed as [`GenerationRequest`] variants and classified by
//! [`classify_response`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EndpointVariant;
use crate::machine::ErrorKind;
use crate::payload::{Destination, GenerationPayload, PayloadContent};
use crate::transcript::Message;

pub const GENERATE_PATH: &str = "/api/v1/flashcards/generate";
pub const LEGACY_CONVERSATION_PATH: &str = "/flashcards";
pub const LEGACY_TEXT_PATH: &str = "/flashcards/from-text";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequestBody {
    pub user_id: String,
    pub text: String,
    pub source_url: String,
    pub source_title: String,
    pub deck_name: String,
    pub card_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyConversationBody {
    pub conversation: Vec<Message>,
    pub destination: Destination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyTextBody {
    pub text: String,
    pub destination: Destination,
    pub card_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    Generate(GenerateRequestBody),
    LegacyConversation(LegacyConversationBody),
    LegacyText(LegacyTextBody),
}

impl GenerationRequest {
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Generate(_) => GENERATE_PATH,
            Self::LegacyConversation(_) => LEGACY_CONVERSATION_PATH,
            Self::LegacyText(_) => LEGACY_TEXT_PATH,
        }
    }

    pub fn body_json(&self) -> Result<String, ClientError> {
        let encoded = match self {
            Self::Generate(body) => serde_json::to_string(body),
            Self::LegacyConversation(body) => serde_json::to_string(body),
            Self::LegacyText(body) => serde_json::to_string(body),
        };
        encoded.map_err(|error| ClientError::Encode(error.to_string()))
    }
}

#[must_use]
pub fn build_request(payload: &GenerationPayload, variant: EndpointVariant) -> GenerationRequest {
    let draft = &payload.draft;
    match (variant, &draft.content) {
        (EndpointVariant::Current, content) => GenerationRequest::Generate(GenerateRequestBody {
            user_id: payload.identity.to_string(),
            text: content.to_text(),
            source_url: draft.source.url.clone(),
            source_title: draft.source.title.clone(),
            deck_name: draft.deck_name.clone(),
            card_count: draft.card_count.get(),
        }),
        (EndpointVariant::Legacy, PayloadContent::Transcript(transcript)) => {
            GenerationRequest::LegacyConversation(LegacyConversationBody {
                conversation: transcript.messages().to_vec(),
                destination: draft.destination,
            })
        }
        (EndpointVariant::Legacy, PayloadContent::FreeText(text)) => {
            GenerationRequest::LegacyText(LegacyTextBody {
                text: text.trim().to_string(),
                destination: draft.destination,
                card_count: draft.card_count.get(),
                topic: draft.topic.clone(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Identity-scoped endpoint: number of cards in the response array.
    Produced(u32),
    /// Legacy endpoints: accepted, with the count when the server reported one.
    Accepted { count: Option<u32> },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    UnexpectedBody(String),
    #[error("failed to encode request body: {0}")]
    Encode(String),
}

impl ClientError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Encode(_) => ErrorKind::NetworkFailure,
            Self::Rejected { .. } | Self::UnexpectedBody(_) => ErrorKind::ServerRejected,
        }
    }
}

/// One attempt against the generation service; no retries.
#[async_trait(?Send)]
pub trait GenerationClient {
    async fn generate(&self, payload: &GenerationPayload) -> Result<GenerationOutcome, ClientError>;
}

#[derive(Debug, Deserialize)]
struct LegacyStatusBody {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<LegacyStatusData>,
}

#[derive(Debug, Deserialize)]
struct LegacyStatusData {
    #[serde(default)]
    count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetailBody {
    detail: serde_json::Value,
}

pub fn classify_response(
    request: &GenerationRequest,
    status: u16,
    body: &str,
) -> Result<GenerationOutcome, ClientError> {
    if !(200..=299).contains(&status) {
        return Err(ClientError::Rejected {
            status,
            message: error_message(status, body),
        });
    }

    match request {
        GenerationRequest::Generate(_) => {
            let items: Vec<serde_json::Value> = serde_json::from_str(body)
                .map_err(|error| ClientError::UnexpectedBody(error.to_string()))?;
            let produced = u32::try_from(items.len()).unwrap_or(u32::MAX);
            Ok(GenerationOutcome::Produced(produced))
        }
        GenerationRequest::LegacyConversation(_) | GenerationRequest::LegacyText(_) => {
            let parsed: LegacyStatusBody = serde_json::from_str(body)
                .map_err(|error| ClientError::UnexpectedBody(error.to_string()))?;
            if parsed.status != "success" {
                return Err(ClientError::Rejected {
                    status,
                    message: parsed
                        .message
                        .unwrap_or_else(|| format!("service reported status {}", parsed.status)),
                });
            }
            Ok(GenerationOutcome::Accepted {
                count: parsed.data.and_then(|data| data.count),
            })
        }
    }
}

fn error_message(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorDetailBody>(body)
        .ok()
        .and_then(|parsed| match parsed.detail {
            serde_json::Value::String(message) => Some(message),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        });
    detail.unwrap_or_else(|| format!("request failed with status {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::payload::{CardCount, PayloadDraft, SourceMetadata};
    use crate::transcript::{MessageRole, Transcript};
    use serde_json::json;

    fn payload(content: PayloadContent) -> GenerationPayload {
        PayloadDraft::new(
            content,
            SourceMetadata {
                url: "https://chatgpt.com/c/1".to_string(),
                title: "Monads".to_string(),
            },
            "ChatGPT Conversations",
        )
        .with_card_count(CardCount::clamped(3))
        .with_destination(Destination::Notion)
        .with_topic(Some("FP"))
        .bind(Identity::from_persisted("user-1").expect("non-empty identity"))
    }

    fn transcript() -> Transcript {
        [
            Message::new(MessageRole::User, "What is a monad?"),
            Message::new(MessageRole::Assistant, "A pattern."),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    #[test]
    fn current_variant_flattens_transcript_with_identity() {
        let request = build_request(
            &payload(PayloadContent::Transcript(transcript())),
            EndpointVariant::Current,
        );
        assert_eq!(request.path(), GENERATE_PATH);
        let body: serde_json::Value =
            serde_json::from_str(&request.body_json().expect("body encodes")).expect("json");
        assert_eq!(
            body,
            json!({
                "user_id": "user-1",
                "text": "user: What is a monad?\n\nassistant: A pattern.",
                "source_url": "https://chatgpt.com/c/1",
                "source_title": "Monads",
                "deck_name": "ChatGPT Conversations",
                "card_count": 3
            })
        );
    }

    #[test]
    fn legacy_variant_picks_endpoint_by_content() {
        let conversation = build_request(
            &payload(PayloadContent::Transcript(transcript())),
            EndpointVariant::Legacy,
        );
        assert_eq!(conversation.path(), LEGACY_CONVERSATION_PATH);
        let body: serde_json::Value =
            serde_json::from_str(&conversation.body_json().expect("encodes")).expect("json");
        assert_eq!(body["destination"], "notion");
        assert_eq!(body["conversation"][1]["role"], "assistant");

        let text = build_request(
            &payload(PayloadContent::FreeText("  Photosynthesis converts light. ".to_string())),
            EndpointVariant::Legacy,
        );
        assert_eq!(text.path(), LEGACY_TEXT_PATH);
        let body: serde_json::Value =
            serde_json::from_str(&text.body_json().expect("encodes")).expect("json");
        assert_eq!(
            body,
            json!({
                "text": "Photosynthesis converts light.",
                "destination": "notion",
                "card_count": 3,
                "topic": "FP"
            })
        );
    }

    #[test]
    fn array_response_counts_items() {
        let request = build_request(
            &payload(PayloadContent::FreeText("text".to_string())),
            EndpointVariant::Current,
        );
        assert_eq!(
            classify_response(&request, 200, r#"[{"id":1},{"id":2},{"id":3}]"#),
            Ok(GenerationOutcome::Produced(3))
        );
        assert_eq!(
            classify_response(&request, 200, "[]"),
            Ok(GenerationOutcome::Produced(0))
        );
        assert!(matches!(
            classify_response(&request, 200, r#"{"status":"success"}"#),
            Err(ClientError::UnexpectedBody(_))
        ));
    }

    #[test]
    fn non_success_status_surfaces_fastapi_detail() {
        let request = build_request(
            &payload(PayloadContent::FreeText("text".to_string())),
            EndpointVariant::Current,
        );
        let error = classify_response(
            &request,
            400,
            r#"{"detail":"No flashcards could be generated from the provided text"}"#,
        )
        .expect_err("400 is a rejection");
        assert_eq!(
            error,
            ClientError::Rejected {
                status: 400,
                message: "No flashcards could be generated from the provided text".to_string()
            }
        );
        assert_eq!(error.kind(), ErrorKind::ServerRejected);

        let error = classify_response(&request, 502, "<html>").expect_err("502 is a rejection");
        assert!(error.to_string().contains("status 502"));
    }

    #[test]
    fn legacy_status_flag_is_checked() {
        let request = build_request(
            &payload(PayloadContent::Transcript(transcript())),
            EndpointVariant::Legacy,
        );
        assert_eq!(
            classify_response(
                &request,
                200,
                r#"{"status":"success","message":"ok","data":{"count":4,"file_path":"/tmp/x.apkg"}}"#
            ),
            Ok(GenerationOutcome::Accepted { count: Some(4) })
        );
        assert_eq!(
            classify_response(&request, 200, r#"{"status":"success"}"#),
            Ok(GenerationOutcome::Accepted { count: None })
        );
        assert!(matches!(
            classify_response(&request, 200, r#"{"status":"error","message":"Unsupported destination"}"#),
            Err(ClientError::Rejected { .. })
        ));
    }

    #[test]
    fn transport_errors_map_to_network_failure() {
        assert_eq!(
            ClientError::Network("connection refused".to_string()).kind(),
            ErrorKind::NetworkFailure
        );
        assert_eq!(
            ClientError::UnexpectedBody("eof".to_string()).kind(),
            ErrorKind::ServerRejected
        );
    }
}
