use crate::payload::{Destination, PayloadContent, PayloadDraft, SourceMetadata};
use crate::transcript::{Message, MessageRole, Transcript};

/// A selection must be longer than this many characters to offer a quick card.
pub const MIN_SELECTION_CHARS: usize = 10;

#[must_use]
pub fn qualifying_selection(raw: &str) -> Option<&str> {
    (raw.chars().count() > MIN_SELECTION_CHARS).then_some(raw)
}

/// Quick cards always go to Notion as a single user message.
#[must_use]
pub fn selection_draft(selection: &str, source: SourceMetadata, deck_name: &str) -> PayloadDraft {
    let transcript = Message::new(MessageRole::User, selection)
        .into_iter()
        .collect::<Transcript>();
    PayloadDraft::new(PayloadContent::Transcript(transcript), source, deck_name)
        .with_destination(Destination::Notion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_selections_do_not_qualify() {
        assert_eq!(qualifying_selection(""), None);
        assert_eq!(qualifying_selection("0123456789"), None);
        assert_eq!(qualifying_selection("0123456789a"), Some("0123456789a"));
        // counted in characters, not bytes
        assert_eq!(qualifying_selection("ééééééééé"), None);
    }

    #[test]
    fn selection_becomes_single_user_message_for_notion() {
        let draft = selection_draft(
            "  the mitochondria is the powerhouse ",
            SourceMetadata::default(),
            "Web Learning",
        );
        let PayloadContent::Transcript(transcript) = &draft.content else {
            panic!("selection drafts carry a transcript");
        };
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].role, MessageRole::User);
        assert_eq!(
            transcript.messages()[0].content,
            "the mitochondria is the powerhouse"
        );
        assert_eq!(draft.destination, Destination::Notion);
    }

    #[test]
    fn whitespace_only_selection_is_empty_content() {
        let draft = selection_draft("             ", SourceMetadata::default(), "Web Learning");
        assert!(draft.content.is_empty());
    }
}
