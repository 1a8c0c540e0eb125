use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::transcript::Transcript;

/// Requested number of cards, clamped to `[MIN, MAX]` at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u32")]
pub struct CardCount(u32);

impl CardCount {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 50;
    pub const DEFAULT: Self = Self(5);

    #[must_use]
    pub fn clamped(raw: i64) -> Self {
        let bounded = raw.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        Self(u32::try_from(bounded).unwrap_or(Self::MIN))
    }

    /// Parses a form field value. Unparseable input yields `fallback`.
    #[must_use]
    pub fn parse_or(raw: &str, fallback: Self) -> Self {
        let trimmed = raw.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return Self::clamped(value);
        }
        // number inputs may hand back "7.0"
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::clamped(value.trunc() as i64),
            _ => fallback,
        }
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for CardCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for CardCount {
    fn from(raw: i64) -> Self {
        Self::clamped(raw)
    }
}

impl From<CardCount> for u32 {
    fn from(count: CardCount) -> Self {
        count.0
    }
}

impl std::fmt::Display for CardCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    #[default]
    Anki,
    Notion,
}

impl Destination {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anki => "anki",
            Self::Notion => "notion",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "anki" => Some(Self::Anki),
            "notion" => Some(Self::Notion),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadContent {
    Transcript(Transcript),
    FreeText(String),
}

impl PayloadContent {
    /// Empty content never reaches the network.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Transcript(transcript) => transcript.is_empty(),
            Self::FreeText(text) => text.trim().is_empty(),
        }
    }

    /// Flattened text form used by the identity-scoped endpoint.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Transcript(transcript) => transcript.to_prompt_text(),
            Self::FreeText(text) => text.trim().to_string(),
        }
    }
}

/// Everything an entry point knows before the identity is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDraft {
    pub content: PayloadContent,
    pub source: SourceMetadata,
    pub deck_name: String,
    pub destination: Destination,
    pub card_count: CardCount,
    pub topic: Option<String>,
}

impl PayloadDraft {
    #[must_use]
    pub fn new(content: PayloadContent, source: SourceMetadata, deck_name: impl Into<String>) -> Self {
        Self {
            content,
            source,
            deck_name: deck_name.into(),
            destination: Destination::default(),
            card_count: CardCount::DEFAULT,
            topic: None,
        }
    }

    #[must_use]
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    #[must_use]
    pub fn with_card_count(mut self, card_count: CardCount) -> Self {
        self.card_count = card_count;
        self
    }

    #[must_use]
    pub fn with_topic(mut self, topic: Option<&str>) -> Self {
        self.topic = topic
            .map(str::trim)
            .filter(|topic| !topic.is_empty())
            .map(ToString::to_string);
        self
    }

    #[must_use]
    pub fn bind(self, identity: Identity) -> GenerationPayload {
        GenerationPayload {
            identity,
            draft: self,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPayload {
    pub identity: Identity,
    pub draft: PayloadDraft,
}
