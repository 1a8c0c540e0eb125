use flashcard_client_core::Identity;
use js_sys::{Function, Promise, Reflect};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, HtmlInputElement, KeyboardEvent};

use super::*;

/// Resolves the identity first, then shows the dialog. Opening replaces any
/// dialog that is already up.
pub(super) fn open_settings() {
    let Some(context) = agent_context() else {
        tracing::warn!("settings opened before the agent finished booting");
        return;
    };
    spawn_local(async move {
        let identity = context.identity.get_identity().await;
        if let Err(error) = show_settings(&identity) {
            tracing::warn!(%error, "failed to open settings");
        }
    });
}

fn styled(document: &Document, tag: &str, what: &str, styles: &[(&str, &str)]) -> Result<HtmlElement, String> {
    let element: HtmlElement = create_element(document, tag, what)?;
    apply_styles(&element, styles, what)?;
    Ok(element)
}

fn append(parent: &Element, child: &Element, what: &str) -> Result<(), String> {
    parent
        .append_child(child)
        .map(|_| ())
        .map_err(|_| format!("failed to append {what}"))
}

fn show_settings(identity: &Identity) -> Result<(), String> {
    let document = document()?;
    close_settings();

    let overlay = styled(
        &document,
        "div",
        "settings overlay",
        &[
            ("position", "fixed"),
            ("inset", "0"),
            ("background-color", "rgba(0, 0, 0, 0.5)"),
            ("display", "flex"),
            ("align-items", "center"),
            ("justify-content", "center"),
            ("z-index", SETTINGS_Z_INDEX),
            ("font-family", FONT_STACK),
        ],
    )?;
    overlay.set_id(SETTINGS_OVERLAY_ID);

    let modal = styled(
        &document,
        "div",
        "settings dialog",
        &[
            ("background-color", "white"),
            ("border-radius", "12px"),
            ("padding", "24px"),
            ("width", "480px"),
            ("max-width", "90vw"),
            ("box-shadow", "0 10px 40px rgba(0, 0, 0, 0.3)"),
            ("color", "#333"),
        ],
    )?;

    let title = styled(&document, "h2", "settings title", &[("margin", "0 0 16px"), ("font-size", "20px")])?;
    title.set_text_content(Some("⚙️ Flashcard Settings"));
    append(&modal, &title, "settings title")?;

    let label = styled(&document, "label", "identity label", &LABEL_STYLE)?;
    label.set_text_content(Some("Your User ID:"));
    let _ = label.set_attribute("for", SETTINGS_IDENTITY_ID);
    append(&modal, &label, "identity label")?;

    let row = styled(&document, "div", "identity row", &[("display", "flex"), ("gap", "8px")])?;
    let field: HtmlInputElement = create_element(&document, "input", "identity field")?;
    field.set_id(SETTINGS_IDENTITY_ID);
    field.set_type("text");
    field.set_read_only(true);
    field.set_value(identity.as_str());
    apply_styles(&field, &FIELD_STYLE, "identity field")?;
    apply_styles(&field, &[("font-family", "monospace"), ("flex", "1")], "identity field")?;
    append(&row, &field, "identity field")?;

    let copy: HtmlButtonElement = create_element(&document, "button", "copy button")?;
    copy.set_id(SETTINGS_COPY_ID);
    copy.set_type("button");
    copy.set_text_content(Some(SETTINGS_COPY_LABEL));
    apply_styles(&copy, &ENTRY_BUTTON_STYLE, "copy button")?;
    apply_styles(&copy, &[("background-color", crate::feedback::COLOR_PRIMARY)], "copy button")?;
    append(&row, &copy, "copy button")?;
    append(&modal, &row, "identity row")?;

    let steps = styled(
        &document,
        "ol",
        "setup steps",
        &[("margin", "16px 0"), ("padding-left", "20px"), ("font-size", "14px"), ("line-height", "1.6")],
    )?;
    for step in SETTINGS_SETUP_STEPS {
        let item = styled(&document, "li", "setup step", &[])?;
        item.set_text_content(Some(step));
        append(&steps, &item, "setup step")?;
    }
    append(&modal, &steps, "setup steps")?;

    let close: HtmlButtonElement = create_element(&document, "button", "close settings button")?;
    close.set_id(SETTINGS_CLOSE_ID);
    close.set_type("button");
    close.set_text_content(Some("Close"));
    apply_styles(&close, &ENTRY_BUTTON_STYLE, "close settings button")?;
    apply_styles(&close, &[("background-color", crate::feedback::COLOR_MUTED)], "close settings button")?;
    append(&modal, &close, "close settings button")?;
    append(&overlay, &modal, "settings dialog")?;

    let mut listeners = Vec::with_capacity(4);
    {
        let button = copy.clone();
        let text = identity.as_str().to_string();
        listeners.push(BoundListener::bind(&copy, "click", move |_event| {
            spawn_local(copy_identity(text.clone(), button.clone()));
        })?);
    }
    listeners.push(BoundListener::bind(&close, "click", |_event| close_settings())?);
    listeners.push(BoundListener::bind(&overlay, "click", |event| {
        let on_backdrop = event
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
            .is_some_and(|target| target.id() == SETTINGS_OVERLAY_ID);
        if on_backdrop {
            close_settings();
        }
    })?);
    listeners.push(BoundListener::bind(&document, "keydown", |event| {
        if event
            .dyn_ref::<KeyboardEvent>()
            .is_some_and(|event| event.key() == "Escape")
        {
            close_settings();
        }
    })?);

    append_to_body(&document, &overlay, "settings overlay")?;
    SETTINGS.with(|slot| {
        *slot.borrow_mut() = Some(SettingsBindings {
            overlay,
            _listeners: listeners,
        });
    });
    Ok(())
}

pub(super) fn close_settings() {
    if let Some(bindings) = SETTINGS.with(|slot| slot.borrow_mut().take()) {
        bindings.overlay.remove();
        defer_drop(bindings);
    }
}

/// `navigator.clipboard` via reflection; the typed bindings sit behind the
/// unstable web-sys API flag.
async fn write_clipboard(text: &str) -> Result<(), String> {
    let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
    let clipboard = Reflect::get(&window.navigator(), &JsValue::from_str("clipboard"))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
        .ok_or_else(|| "clipboard api is unavailable".to_string())?;
    let write_text = Reflect::get(&clipboard, &JsValue::from_str("writeText"))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
        .ok_or_else(|| "clipboard writeText is unavailable".to_string())?;
    let promise = write_text
        .call1(&clipboard, &JsValue::from_str(text))
        .map_err(|_| "clipboard write was rejected".to_string())?
        .dyn_into::<Promise>()
        .map_err(|_| "clipboard write did not return a promise".to_string())?;
    JsFuture::from(promise)
        .await
        .map(|_| ())
        .map_err(|error| error.as_string().unwrap_or_else(|| "clipboard write failed".to_string()))
}

async fn copy_identity(text: String, button: HtmlButtonElement) {
    match write_clipboard(&text).await {
        Ok(()) => {
            button.set_text_content(Some(SETTINGS_COPIED_LABEL));
            sleep(COPY_FEEDBACK_WINDOW).await;
            if button.is_connected() {
                button.set_text_content(Some(SETTINGS_COPY_LABEL));
            }
        }
        Err(error) => {
            tracing::warn!(%error, "failed to copy identity");
            if let Some(window) = web_sys::window() {
                let _ = window.alert_with_message(SETTINGS_COPY_FAILED_ALERT);
            }
        }
    }
}
