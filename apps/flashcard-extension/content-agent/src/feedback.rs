use flashcard_client_core::surface::EntryPointKind;
use flashcard_client_core::{EntryPointView, ErrorKind, UiState};

pub const COLOR_PRIMARY: &str = "#007bff";
pub const COLOR_SUCCESS: &str = "#28a745";
pub const COLOR_DANGER: &str = "#dc3545";
pub const COLOR_MUTED: &str = "#6c757d";

/// Which control a state is painted on; each has its own wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackTarget {
    ConversationButton,
    PanelSubmit,
    SelectionButton,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonAppearance {
    pub label: String,
    pub background: &'static str,
    pub disabled: bool,
}

impl FeedbackTarget {
    fn idle(self) -> (&'static str, &'static str) {
        match self {
            Self::ConversationButton => (EntryPointKind::Conversation.idle_label(), COLOR_PRIMARY),
            Self::PanelSubmit => ("🚀 Generate Cards", COLOR_SUCCESS),
            Self::SelectionButton => ("Make Flashcard", COLOR_PRIMARY),
        }
    }

    fn sending(self) -> &'static str {
        match self {
            Self::ConversationButton => "⏳ Sending...",
            Self::PanelSubmit => "⏳ Generating...",
            Self::SelectionButton => "⏳ Sending...",
        }
    }

    fn empty_input(self) -> &'static str {
        match self {
            Self::ConversationButton => "❌ No Chat Found",
            Self::PanelSubmit => "❌ Add Some Text",
            Self::SelectionButton => "❌ Nothing Selected",
        }
    }
}

#[must_use]
pub fn appearance(target: FeedbackTarget, view: EntryPointView) -> ButtonAppearance {
    let (label, background) = match view.state {
        UiState::Idle => {
            let (label, background) = target.idle();
            (label.to_string(), background)
        }
        UiState::Sending => (target.sending().to_string(), COLOR_MUTED),
        UiState::Success(count) => {
            let label = match (target, count) {
                (FeedbackTarget::SelectionButton, _) => "✅ Sent!".to_string(),
                (_, 1) => "✅ 1 Card Created!".to_string(),
                (_, count) => format!("✅ {count} Cards Created!"),
            };
            (label, COLOR_SUCCESS)
        }
        UiState::Error(ErrorKind::EmptyInput) => (target.empty_input().to_string(), COLOR_DANGER),
        UiState::Error(ErrorKind::NetworkFailure) => ("❌ No Connection".to_string(), COLOR_DANGER),
        UiState::Error(ErrorKind::EmptyResult) => ("❌ No Cards Generated".to_string(), COLOR_DANGER),
        UiState::Error(ErrorKind::ServerRejected) => ("❌ Failed".to_string(), COLOR_DANGER),
    };
    ButtonAppearance {
        label,
        background,
        disabled: !view.enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(state: UiState, enabled: bool) -> EntryPointView {
        EntryPointView { state, enabled }
    }

    #[test]
    fn sending_is_muted_and_disabled() {
        let painted = appearance(FeedbackTarget::ConversationButton, view(UiState::Sending, false));
        assert_eq!(
            painted,
            ButtonAppearance {
                label: "⏳ Sending...".to_string(),
                background: COLOR_MUTED,
                disabled: true,
            }
        );
    }

    #[test]
    fn success_reports_card_count() {
        let painted = appearance(FeedbackTarget::PanelSubmit, view(UiState::Success(3), true));
        assert_eq!(painted.label, "✅ 3 Cards Created!");
        assert_eq!(painted.background, COLOR_SUCCESS);
        assert!(!painted.disabled);

        let single = appearance(FeedbackTarget::ConversationButton, view(UiState::Success(1), true));
        assert_eq!(single.label, "✅ 1 Card Created!");
    }

    #[test]
    fn errors_are_worded_per_kind() {
        let network = appearance(
            FeedbackTarget::ConversationButton,
            view(UiState::Error(ErrorKind::NetworkFailure), true),
        );
        assert_eq!(network.label, "❌ No Connection");

        let empty = appearance(
            FeedbackTarget::ConversationButton,
            view(UiState::Error(ErrorKind::EmptyInput), true),
        );
        assert_eq!(empty.label, "❌ No Chat Found");
        assert_eq!(empty.background, COLOR_DANGER);
    }

    #[test]
    fn idle_restores_idle_label() {
        let painted = appearance(FeedbackTarget::PanelSubmit, view(UiState::Idle, true));
        assert_eq!(painted.label, "🚀 Generate Cards");
        assert_eq!(painted.background, COLOR_SUCCESS);
    }
}
