use flashcard_client_core::panel::{
    PANEL_CLOSE_DELAY, PANEL_SLIDE_OUT, PanelForm, PanelMetrics, RecommendationGuard,
    normalize_pasted_text, splice_at_selection,
};
use web_sys::{
    ClipboardEvent, Element, HtmlInputElement, HtmlOptionElement, HtmlSelectElement,
    HtmlTextAreaElement, KeyboardEvent,
};

use super::*;

/// The controls a panel's handlers read and write.
#[derive(Clone)]
struct PanelFields {
    text: HtmlTextAreaElement,
    card_count: HtmlInputElement,
    destination: HtmlSelectElement,
    topic: HtmlInputElement,
    word_count: HtmlElement,
    recommended: HtmlElement,
    generate: HtmlButtonElement,
}

impl PanelFields {
    fn refresh_metrics(&self, guard: &RefCell<RecommendationGuard>) {
        let metrics = guard
            .borrow_mut()
            .observe(&self.text.value(), &self.card_count.value());
        self.show_metrics(&metrics);
    }

    fn show_metrics(&self, metrics: &PanelMetrics) {
        self.word_count
            .set_text_content(Some(&metrics.words.to_string()));
        self.recommended
            .set_text_content(Some(&metrics.recommended.to_string()));
        if let Some(count) = metrics.apply {
            self.card_count.set_value(&count.to_string());
        }
    }

    fn form(&self) -> PanelForm {
        PanelForm {
            text: self.text.value(),
            card_count: self.card_count.value(),
            destination: self.destination.value(),
            topic: self.topic.value(),
        }
    }
}

fn append(parent: &Element, child: &Element, what: &str) -> Result<(), String> {
    parent
        .append_child(child)
        .map(|_| ())
        .map_err(|_| format!("failed to append {what}"))
}

fn text_element(document: &Document, tag: &str, text: &str, styles: &[(&str, &str)]) -> Result<HtmlElement, String> {
    let element: HtmlElement = create_element(document, tag, tag)?;
    element.set_text_content(Some(text));
    apply_styles(&element, styles, tag)?;
    Ok(element)
}

/// A labelled form group; returns the group so the caller can append the control.
fn field_group(document: &Document, label: &str, for_id: &str) -> Result<HtmlElement, String> {
    let group: HtmlElement = create_element(document, "div", "form group")?;
    let label = text_element(document, "label", label, &LABEL_STYLE)?;
    label
        .set_attribute("for", for_id)
        .map_err(|_| "failed to label form field".to_string())?;
    append(&group, &label, "field label")?;
    Ok(group)
}

fn build_header(document: &Document) -> Result<(HtmlElement, HtmlButtonElement), String> {
    let header: HtmlElement = create_element(document, "div", "panel header")?;
    apply_styles(
        &header,
        &[
            ("display", "flex"),
            ("justify-content", "space-between"),
            ("align-items", "center"),
            ("padding", "16px 20px"),
            ("border-bottom", "1px solid #e1e5e9"),
            ("background-color", "#f8f9fa"),
        ],
        "panel header",
    )?;
    let title = text_element(
        document,
        "h3",
        "📝 Text to Flashcards",
        &[("margin", "0"), ("color", "#333"), ("font-size", "18px")],
    )?;
    append(&header, &title, "panel title")?;

    let close: HtmlButtonElement = create_element(document, "button", "close button")?;
    close.set_id(PANEL_CLOSE_ID);
    close.set_type("button");
    close.set_text_content(Some("×"));
    apply_styles(
        &close,
        &[
            ("background", "none"),
            ("border", "none"),
            ("font-size", "24px"),
            ("cursor", "pointer"),
            ("color", "#666"),
            ("line-height", "1"),
        ],
        "close button",
    )?;
    append(&header, &close, "close button")?;
    Ok((header, close))
}

struct PanelParts {
    root: HtmlElement,
    form: HtmlElement,
    close: HtmlButtonElement,
    cancel: HtmlButtonElement,
    fields: PanelFields,
}

fn build_panel(document: &Document, config: &AgentConfig) -> Result<PanelParts, String> {
    let root: HtmlElement = create_element(document, "div", "text panel")?;
    root.set_id(PANEL_ID);
    apply_styles(
        &root,
        &[
            ("position", "fixed"),
            ("top", "0"),
            ("right", "0"),
            ("width", "420px"),
            ("max-width", "100vw"),
            ("height", "100vh"),
            ("background-color", "white"),
            ("box-shadow", "-4px 0 20px rgba(0, 0, 0, 0.15)"),
            ("z-index", PANEL_Z_INDEX),
            ("display", "flex"),
            ("flex-direction", "column"),
            ("box-sizing", "border-box"),
            ("font-family", FONT_STACK),
            ("transform", "translateX(100%)"),
            ("transition", "transform 0.3s ease"),
        ],
        "text panel",
    )?;

    let (header, close) = build_header(document)?;
    append(&root, &header, "panel header")?;

    let form: HtmlElement = create_element(document, "form", "panel form")?;
    form.set_id(PANEL_FORM_ID);
    apply_styles(
        &form,
        &[
            ("flex", "1"),
            ("overflow-y", "auto"),
            ("padding", "20px"),
            ("display", "flex"),
            ("flex-direction", "column"),
            ("gap", "16px"),
        ],
        "panel form",
    )?;

    let text_group = field_group(document, "Text content", PANEL_TEXT_ID)?;
    let text: HtmlTextAreaElement = create_element(document, "textarea", "text input")?;
    text.set_id(PANEL_TEXT_ID);
    text.set_rows(12);
    text.set_placeholder(PANEL_TEXT_PLACEHOLDER);
    apply_styles(&text, &FIELD_STYLE, "text input")?;
    apply_styles(
        &text,
        &[("resize", "vertical"), ("min-height", "200px"), ("font-family", "inherit")],
        "text input",
    )?;
    append(&text_group, &text, "text input")?;
    append(&form, &text_group, "text group")?;

    let stats = text_element(document, "div", "Words: ", &[("font-size", "13px"), ("color", "#666")])?;
    let word_count = text_element(document, "span", "0", &[("font-weight", "600")])?;
    word_count.set_id(PANEL_WORD_COUNT_ID);
    append(&stats, &word_count, "word count")?;
    let separator = text_element(document, "span", " · Recommended cards: ", &[])?;
    append(&stats, &separator, "stats separator")?;
    let recommended = text_element(document, "span", "1", &[("font-weight", "600")])?;
    recommended.set_id(PANEL_RECOMMENDED_ID);
    append(&stats, &recommended, "recommended count")?;
    append(&form, &stats, "panel stats")?;

    let count_group = field_group(document, "Number of cards", PANEL_CARD_COUNT_ID)?;
    let card_count: HtmlInputElement = create_element(document, "input", "card count")?;
    card_count.set_id(PANEL_CARD_COUNT_ID);
    card_count.set_type("number");
    card_count.set_min("1");
    card_count.set_max("50");
    card_count.set_value(&config.default_card_count.to_string());
    apply_styles(&card_count, &FIELD_STYLE, "card count")?;
    append(&count_group, &card_count, "card count")?;
    append(&form, &count_group, "card count group")?;

    let destination_group = field_group(document, "Destination", PANEL_DESTINATION_ID)?;
    let destination: HtmlSelectElement = create_element(document, "select", "destination")?;
    destination.set_id(PANEL_DESTINATION_ID);
    apply_styles(&destination, &FIELD_STYLE, "destination")?;
    for (value, label) in DESTINATION_OPTIONS {
        let option: HtmlOptionElement = create_element(document, "option", "destination option")?;
        option.set_value(value);
        option.set_text_content(Some(label));
        option.set_selected(value == config.default_destination.as_str());
        append(&destination, &option, "destination option")?;
    }
    append(&destination_group, &destination, "destination")?;
    append(&form, &destination_group, "destination group")?;

    let topic_group = field_group(document, "Topic (optional)", PANEL_TOPIC_ID)?;
    let topic: HtmlInputElement = create_element(document, "input", "topic")?;
    topic.set_id(PANEL_TOPIC_ID);
    topic.set_type("text");
    topic.set_placeholder("e.g. Biology, History");
    apply_styles(&topic, &FIELD_STYLE, "topic")?;
    append(&topic_group, &topic, "topic")?;
    append(&form, &topic_group, "topic group")?;

    let actions: HtmlElement = create_element(document, "div", "panel actions")?;
    apply_styles(
        &actions,
        &[("display", "flex"), ("gap", "10px"), ("justify-content", "flex-end")],
        "panel actions",
    )?;
    let cancel: HtmlButtonElement = create_element(document, "button", "cancel button")?;
    cancel.set_id(PANEL_CANCEL_ID);
    cancel.set_type("button");
    cancel.set_text_content(Some("Cancel"));
    apply_styles(&cancel, &ENTRY_BUTTON_STYLE, "cancel button")?;
    apply_styles(&cancel, &[("background-color", crate::feedback::COLOR_MUTED)], "cancel button")?;
    append(&actions, &cancel, "cancel button")?;
    let generate: HtmlButtonElement = create_element(document, "button", "generate button")?;
    generate.set_id(PANEL_GENERATE_ID);
    generate.set_type("submit");
    apply_styles(&generate, &ENTRY_BUTTON_STYLE, "generate button")?;
    append(&actions, &generate, "generate button")?;
    append(&form, &actions, "panel actions")?;

    append(&root, &form, "panel form")?;

    Ok(PanelParts {
        root,
        form,
        close,
        cancel,
        fields: PanelFields {
            text,
            card_count,
            destination,
            topic,
            word_count,
            recommended,
            generate,
        },
    })
}

fn next_panel_serial() -> u64 {
    PANEL_SERIAL.with(|serial| {
        let next = serial.get() + 1;
        serial.set(next);
        next
    })
}

/// Opens a fresh panel, replacing any open one.
pub(super) fn open_panel() -> Result<(), String> {
    let context = agent_context().ok_or_else(|| "agent has not booted".to_string())?;
    let document = document()?;
    remove_open_panel();

    let serial = next_panel_serial();
    let parts = build_panel(&document, &context.config)?;
    let fields = parts.fields;
    let machine = Rc::new(RefCell::new(RequestMachine::default()));
    let guard = Rc::new(RefCell::new(RecommendationGuard::new(
        context.config.default_card_count,
    )));

    let mut listeners = Vec::with_capacity(6);
    {
        let fields = fields.clone();
        let guard = Rc::clone(&guard);
        listeners.push(BoundListener::bind(&fields.text.clone(), "input", move |_event| {
            fields.refresh_metrics(&guard);
        })?);
    }
    {
        let fields = fields.clone();
        let guard = Rc::clone(&guard);
        listeners.push(BoundListener::bind(&fields.text.clone(), "paste", move |event| {
            paste_plain_text(&event, &fields, &guard);
        })?);
    }
    {
        let fields = fields.clone();
        let machine = Rc::clone(&machine);
        listeners.push(BoundListener::bind(&parts.form, "submit", move |event| {
            event.prevent_default();
            submit_panel(serial, &fields, &machine);
        })?);
    }
    listeners.push(BoundListener::bind(&parts.close, "click", move |_event| {
        close_panel(serial);
    })?);
    listeners.push(BoundListener::bind(&parts.cancel, "click", move |_event| {
        close_panel(serial);
    })?);
    listeners.push(BoundListener::bind(&document, "keydown", move |event| {
        let escape = event
            .dyn_ref::<KeyboardEvent>()
            .is_some_and(|event| event.key() == "Escape");
        if escape {
            close_panel(serial);
        }
    })?);

    append_to_body(&document, &parts.root, "text panel")?;
    render_entry_point(&fields.generate, FeedbackTarget::PanelSubmit, machine.borrow().view());
    fields.show_metrics(&guard.borrow().measure(&fields.text.value()));

    PANEL.with(|slot| {
        *slot.borrow_mut() = Some(PanelBindings {
            serial,
            root: parts.root.clone(),
            _listeners: listeners,
        });
    });
    tracing::debug!(serial, "text panel opened");

    let root = parts.root;
    let text = fields.text;
    spawn_local(async move {
        sleep(PANEL_SLIDE_IN_DELAY).await;
        let _ = root.style().set_property("transform", "translateX(0)");
        sleep(PANEL_FOCUS_DELAY).await;
        if text.is_connected() {
            let _ = text.focus();
        }
    });
    Ok(())
}

/// Inserts clipboard text as plain text at the selection, then recomputes
/// the counts. Pastes without a text flavour keep the browser default.
fn paste_plain_text(event: &web_sys::Event, fields: &PanelFields, guard: &RefCell<RecommendationGuard>) {
    let Some(data) = event
        .dyn_ref::<ClipboardEvent>()
        .and_then(ClipboardEvent::clipboard_data)
    else {
        return;
    };
    let raw = data
        .get_data("text/plain")
        .ok()
        .filter(|text| !text.is_empty())
        .or_else(|| data.get_data("text").ok())
        .unwrap_or_default();
    if raw.is_empty() {
        return;
    }
    event.prevent_default();

    let value = fields.text.value();
    let start = fields.text.selection_start().ok().flatten().unwrap_or(u32::MAX);
    let end = fields.text.selection_end().ok().flatten().unwrap_or(start);
    let splice = splice_at_selection(&value, start, end, &normalize_pasted_text(&raw));
    fields.text.set_value(&splice.value);
    let _ = fields.text.set_selection_range(splice.caret, splice.caret);
    fields.refresh_metrics(guard);
}

fn submit_panel(serial: u64, fields: &PanelFields, machine: &Rc<RefCell<RequestMachine>>) {
    let Some(context) = agent_context() else {
        return;
    };
    let draft = fields.form().into_draft(
        &context.config.text_deck,
        current_source(),
        context.config.default_card_count,
        context.config.default_destination,
    );
    spawn_submission(
        context,
        EntrySubmission {
            machine: Rc::clone(machine),
            button: fields.generate.clone(),
            target: FeedbackTarget::PanelSubmit,
            route: ClientRoute::Configured,
        },
        draft,
        move |view| {
            if matches!(view.state, UiState::Success(_)) {
                spawn_local(async move {
                    sleep(PANEL_CLOSE_DELAY).await;
                    close_panel(serial);
                });
            }
        },
        |_| {},
    );
}

fn take_panel(serial: Option<u64>) -> Option<PanelBindings> {
    PANEL.with(|slot| {
        let mut slot = slot.borrow_mut();
        let matches = slot
            .as_ref()
            .is_some_and(|bindings| serial.is_none_or(|serial| bindings.serial == serial));
        if matches { slot.take() } else { None }
    })
}

/// Slides the panel out and removes it. A no-op when `serial` is no longer
/// the open panel.
pub(super) fn close_panel(serial: u64) {
    let Some(bindings) = take_panel(Some(serial)) else {
        return;
    };
    tracing::debug!(serial, "closing text panel");
    let _ = bindings
        .root
        .style()
        .set_property("transform", "translateX(100%)");
    spawn_local(async move {
        sleep(PANEL_SLIDE_OUT).await;
        bindings.root.remove();
        drop(bindings);
    });
}

fn remove_open_panel() {
    if let Some(bindings) = take_panel(None) {
        bindings.root.remove();
        defer_drop(bindings);
    }
}
