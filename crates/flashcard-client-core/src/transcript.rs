use serde::{Deserialize, Serialize};

pub const DEFAULT_TURN_SELECTOR: &str = r#"article[data-testid^="conversation-turn"]"#;
pub const DEFAULT_USER_CONTENT_SELECTOR: &str =
    r#"[data-message-author-role="user"] .whitespace-pre-wrap"#;
pub const DEFAULT_ASSISTANT_CONTENT_SELECTOR: &str =
    r#"[data-message-author-role="assistant"] .markdown"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    /// Trims `raw`; blank content produces no message.
    #[must_use]
    pub fn new(role: MessageRole, raw: &str) -> Option<Self> {
        let content = raw.trim();
        if content.is_empty() {
            return None;
        }
        Some(Self {
            role,
            content: content.to_string(),
        })
    }
}

/// Messages in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// `role: content` blocks separated by blank lines.
    #[must_use]
    pub fn to_prompt_text(&self) -> String {
        self.messages
            .iter()
            .map(|message| format!("{}: {}", message.role.as_str(), message.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl FromIterator<Message> for Transcript {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSelectors {
    pub turn: String,
    pub user_content: String,
    pub assistant_content: String,
}

impl Default for TranscriptSelectors {
    fn default() -> Self {
        Self {
            turn: DEFAULT_TURN_SELECTOR.to_string(),
            user_content: DEFAULT_USER_CONTENT_SELECTOR.to_string(),
            assistant_content: DEFAULT_ASSISTANT_CONTENT_SELECTOR.to_string(),
        }
    }
}

/// Raw text of the first user and assistant node found inside one turn container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnText {
    pub user: Option<String>,
    pub assistant: Option<String>,
}

/// Read-only view of a page that can enumerate conversation turns.
pub trait ConversationDocument {
    /// Turn containers in document order.
    fn conversation_turns(&self, selectors: &TranscriptSelectors) -> Vec<TurnText>;
}

#[must_use]
pub fn extract_transcript<D>(document: &D, selectors: &TranscriptSelectors) -> Transcript
where
    D: ConversationDocument + ?Sized,
{
    let transcript = document
        .conversation_turns(selectors)
        .into_iter()
        .flat_map(|turn| {
            let user = turn
                .user
                .as_deref()
                .and_then(|text| Message::new(MessageRole::User, text));
            let assistant = turn
                .assistant
                .as_deref()
                .and_then(|text| Message::new(MessageRole::Assistant, text));
            user.into_iter().chain(assistant)
        })
        .collect::<Transcript>();
    tracing::debug!(messages = transcript.len(), "extracted transcript");
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTurns(Vec<TurnText>);

    impl ConversationDocument for FixedTurns {
        fn conversation_turns(&self, _selectors: &TranscriptSelectors) -> Vec<TurnText> {
            self.0.clone()
        }
    }

    fn turn(user: Option<&str>, assistant: Option<&str>) -> TurnText {
        TurnText {
            user: user.map(ToString::to_string),
            assistant: assistant.map(ToString::to_string),
        }
    }

    #[test]
    fn keeps_document_order_and_skips_blank_halves() {
        let document = FixedTurns(vec![
            turn(Some("  What is a monad? "), None),
            turn(None, Some("A monoid in the category of endofunctors.\n")),
            turn(Some("   "), None),
            turn(Some("Thanks"), Some("You're welcome")),
        ]);

        let transcript = extract_transcript(&document, &TranscriptSelectors::default());
        let roles = transcript
            .messages()
            .iter()
            .map(|message| message.role)
            .collect::<Vec<_>>();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant
            ]
        );
        assert_eq!(transcript.messages()[0].content, "What is a monad?");
        assert_eq!(transcript.messages()[2].content, "Thanks");
    }

    #[test]
    fn no_turns_is_an_empty_transcript() {
        let transcript = extract_transcript(&FixedTurns(Vec::new()), &TranscriptSelectors::default());
        assert!(transcript.is_empty());
    }

    #[test]
    fn prompt_text_prefixes_roles() {
        let transcript = [
            Message::new(MessageRole::User, "Q"),
            Message::new(MessageRole::Assistant, "A"),
        ]
        .into_iter()
        .flatten()
        .collect::<Transcript>();
        assert_eq!(transcript.to_prompt_text(), "user: Q\n\nassistant: A");
    }

    #[test]
    fn transcript_serializes_as_message_array() {
        let transcript = std::iter::once(Message::new(MessageRole::Assistant, "hi"))
            .flatten()
            .collect::<Transcript>();
        let encoded = serde_json::to_value(&transcript).expect("transcript encodes");
        assert_eq!(
            encoded,
            serde_json::json!([{"role": "assistant", "content": "hi"}])
        );
    }
}
