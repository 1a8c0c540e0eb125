use std::time::Duration;

pub(crate) const AGENT_CONFIG_GLOBAL: &str = "__FLASHCARD_AGENT_CONFIG__";
pub(crate) const CHROME_SYNC_STORE_NAME: &str = "chrome.storage.sync";
pub(crate) const LOCAL_STORAGE_STORE_NAME: &str = "localStorage";
pub(crate) const SURFACE_Z_INDEX: &str = "10000";
pub(crate) const PANEL_Z_INDEX: &str = "20000";
pub(crate) const SETTINGS_Z_INDEX: &str = "100000";
pub(crate) const FONT_STACK: &str = r#"-apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif"#;
pub(crate) const PANEL_ID: &str = "text-flashcard-panel";
pub(crate) const PANEL_FORM_ID: &str = "text-flashcard-form";
pub(crate) const PANEL_TEXT_ID: &str = "text-input";
pub(crate) const PANEL_WORD_COUNT_ID: &str = "word-count";
pub(crate) const PANEL_RECOMMENDED_ID: &str = "recommended-cards";
pub(crate) const PANEL_CARD_COUNT_ID: &str = "card-count";
pub(crate) const PANEL_DESTINATION_ID: &str = "destination";
pub(crate) const PANEL_TOPIC_ID: &str = "topic";
pub(crate) const PANEL_CLOSE_ID: &str = "close-btn";
pub(crate) const PANEL_CANCEL_ID: &str = "cancel-btn";
pub(crate) const PANEL_GENERATE_ID: &str = "generate-btn";
pub(crate) const PANEL_TEXT_PLACEHOLDER: &str = "Select and copy text from anywhere on this page (you can scroll and interact with the main page), then paste it here to generate flashcards!";
pub(crate) const PANEL_FOCUS_DELAY: Duration = Duration::from_millis(100);
pub(crate) const SETTINGS_OVERLAY_ID: &str = "settings-modal-overlay";
pub(crate) const SETTINGS_IDENTITY_ID: &str = "user-id-display";
pub(crate) const SETTINGS_COPY_ID: &str = "copy-user-id-btn";
pub(crate) const SETTINGS_CLOSE_ID: &str = "close-settings-btn";
pub(crate) const SETTINGS_COPY_LABEL: &str = "📋 Copy";
pub(crate) const SETTINGS_COPIED_LABEL: &str = "✅ Copied!";
pub(crate) const SETTINGS_COPY_FAILED_ALERT: &str =
    "Failed to copy. Please select and copy manually.";
pub(crate) const COPY_FEEDBACK_WINDOW: Duration = Duration::from_secs(2);
pub(crate) const SETTINGS_SETUP_STEPS: [&str; 5] = [
    "Copy your User ID above",
    "Open Anki Desktop",
    "Go to Tools → Add-ons → Flashcard Sync → Config",
    "Paste your User ID in the settings",
    "Click Save and sync!",
];
pub(crate) const SELECTION_BUTTON_ID: &str = "flashcard-selection-button";
pub(crate) const DESTINATION_OPTIONS: [(&str, &str); 2] = [("anki", "Anki"), ("notion", "Notion")];
pub(crate) const ENTRY_BUTTON_STYLE: [(&str, &str); 8] = [
    ("padding", "10px 16px"),
    ("color", "white"),
    ("border", "none"),
    ("border-radius", "8px"),
    ("cursor", "pointer"),
    ("font-size", "14px"),
    ("font-weight", "500"),
    ("box-shadow", "0 2px 8px rgba(0, 0, 0, 0.2)"),
];
pub(crate) const FIELD_STYLE: [(&str, &str); 8] = [
    ("width", "100%"),
    ("padding", "8px"),
    ("border", "2px solid #e1e5e9"),
    ("border-radius", "6px"),
    ("box-sizing", "border-box"),
    ("font-size", "14px"),
    ("background-color", "white"),
    ("color", "black"),
];
pub(crate) const LABEL_STYLE: [(&str, &str); 5] = [
    ("display", "block"),
    ("margin-bottom", "6px"),
    ("font-weight", "600"),
    ("color", "#333"),
    ("font-size", "14px"),
];
pub(crate) const PANEL_SLIDE_IN_DELAY: Duration = Duration::from_millis(10);
