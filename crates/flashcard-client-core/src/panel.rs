use std::time::Duration;

use crate::payload::{CardCount, Destination, PayloadContent, PayloadDraft, SourceMetadata};

pub const WORDS_PER_CARD: usize = 100;
/// Delay between a successful panel submission and the panel closing.
pub const PANEL_CLOSE_DELAY: Duration = Duration::from_millis(1_500);
/// Slide-out animation length before the panel node is removed.
pub const PANEL_SLIDE_OUT: Duration = Duration::from_millis(300);

#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// `max(1, ceil(words / 100))`, clamped to the card-count bounds.
#[must_use]
pub fn recommended_card_count(words: usize) -> CardCount {
    let cards = words.div_ceil(WORDS_PER_CARD).max(1);
    CardCount::clamped(i64::try_from(cards).unwrap_or(i64::MAX))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelMetrics {
    pub words: usize,
    pub recommended: CardCount,
    /// Set when the card-count field should be overwritten with `recommended`.
    pub apply: Option<CardCount>,
}

/// Decides when a fresh recommendation may overwrite the card-count field.
///
/// The field is only touched while it still shows its default or the previous
/// recommendation. A manual edit that happens to equal either gets overwritten;
/// that imprecision is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationGuard {
    default_value: CardCount,
    last_recommendation: Option<CardCount>,
}

impl RecommendationGuard {
    #[must_use]
    pub fn new(default_value: CardCount) -> Self {
        Self {
            default_value,
            last_recommendation: None,
        }
    }

    /// Metrics for the initial render. Never overwrites the field and leaves the
    /// guard untouched, so the first edit is judged against the default.
    #[must_use]
    pub fn measure(&self, text: &str) -> PanelMetrics {
        let words = word_count(text);
        PanelMetrics {
            words,
            recommended: recommended_card_count(words),
            apply: None,
        }
    }

    /// Metrics after an edit; `apply` is set when the field may be overwritten.
    pub fn observe(&mut self, text: &str, field_value: &str) -> PanelMetrics {
        let words = word_count(text);
        let recommended = recommended_card_count(words);
        let field = field_value.trim().parse::<i64>().ok();
        let untouched = field == Some(i64::from(self.default_value.get()))
            || (field.is_some()
                && field == self.last_recommendation.map(|count| i64::from(count.get())));
        self.last_recommendation = Some(recommended);
        PanelMetrics {
            words,
            recommended,
            apply: untouched.then_some(recommended),
        }
    }
}

/// Clipboard text with platform line endings folded to `\n`.
#[must_use]
pub fn normalize_pasted_text(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub value: String,
    /// Caret position after the inserted text, in UTF-16 code units.
    pub caret: u32,
}

/// Replaces the selection `[start, end)` of `value` with `insert`. Offsets are
/// UTF-16 code units, as text controls report them, and are clamped to the value.
#[must_use]
pub fn splice_at_selection(value: &str, start: u32, end: u32, insert: &str) -> Splice {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let start_byte = utf16_to_byte_offset(value, start);
    let end_byte = utf16_to_byte_offset(value, end);

    let mut spliced = String::with_capacity(value.len() + insert.len());
    spliced.push_str(&value[..start_byte]);
    spliced.push_str(insert);
    spliced.push_str(&value[end_byte..]);

    let caret_prefix = utf16_len(&value[..start_byte]) + utf16_len(insert);
    Splice {
        value: spliced,
        caret: u32::try_from(caret_prefix).unwrap_or(u32::MAX),
    }
}

fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

fn utf16_to_byte_offset(text: &str, offset: u32) -> usize {
    let target = offset as usize;
    let mut units = 0;
    for (byte, ch) in text.char_indices() {
        if units >= target {
            return byte;
        }
        units += ch.len_utf16();
    }
    text.len()
}

/// Current field values of the input panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelForm {
    pub text: String,
    pub card_count: String,
    pub destination: String,
    pub topic: String,
}

impl PanelForm {
    #[must_use]
    pub fn into_draft(
        self,
        deck_name: &str,
        source: SourceMetadata,
        fallback_count: CardCount,
        fallback_destination: Destination,
    ) -> PayloadDraft {
        let card_count = CardCount::parse_or(&self.card_count, fallback_count);
        let destination = Destination::parse(&self.destination).unwrap_or(fallback_destination);
        PayloadDraft::new(
            PayloadContent::FreeText(self.text.trim().to_string()),
            source,
            deck_name,
        )
        .with_card_count(card_count)
        .with_destination(destination)
        .with_topic(Some(&self.topic))
    }
}
