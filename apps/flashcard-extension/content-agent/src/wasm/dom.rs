use flashcard_client_core::SourceMetadata;
use flashcard_client_core::surface::{EntryPointKind, SurfaceError, SurfaceHost};
use flashcard_client_core::transcript::{ConversationDocument, TurnText};
use web_sys::{Element, EventTarget};

use crate::feedback::{COLOR_MUTED, COLOR_PRIMARY, COLOR_SUCCESS};

use super::*;

/// An event listener that detaches itself when dropped.
///
/// Never drop one from inside its own callback; hand it to `defer_drop`.
pub(crate) struct BoundListener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl BoundListener {
    pub(super) fn bind<F>(target: &EventTarget, event: &'static str, handler: F) -> Result<Self, String>
    where
        F: FnMut(web_sys::Event) + 'static,
    {
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(handler));
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(|_| format!("failed to bind {event} handler"))?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for BoundListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

/// Drops `value` on a later tick, after the handler that released it returned.
pub(super) fn defer_drop<T: 'static>(value: T) {
    spawn_local(async move {
        drop(value);
    });
}

pub(super) fn document() -> Result<Document, String> {
    let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
    window
        .document()
        .ok_or_else(|| "document is unavailable".to_string())
}

pub(super) fn create_element<T: JsCast>(document: &Document, tag: &str, what: &str) -> Result<T, String> {
    document
        .create_element(tag)
        .map_err(|_| format!("failed to create {what}"))?
        .dyn_into::<T>()
        .map_err(|_| format!("{what} has an unexpected element type"))
}

pub(super) fn apply_styles(element: &HtmlElement, styles: &[(&str, &str)], what: &str) -> Result<(), String> {
    let style = element.style();
    for (property, value) in styles {
        style
            .set_property(property, value)
            .map_err(|_| format!("failed to style {what}"))?;
    }
    Ok(())
}

pub(super) fn append_to_body(document: &Document, element: &Element, what: &str) -> Result<(), String> {
    let body = document
        .body()
        .ok_or_else(|| "document body is unavailable".to_string())?;
    body.append_child(element)
        .map(|_| ())
        .map_err(|_| format!("failed to append {what}"))
}

pub(super) fn current_source() -> SourceMetadata {
    let Some(window) = web_sys::window() else {
        return SourceMetadata::default();
    };
    SourceMetadata {
        url: window.location().href().unwrap_or_default(),
        title: window.document().map(|document| document.title()).unwrap_or_default(),
    }
}

pub(super) fn current_hostname() -> String {
    web_sys::window()
        .and_then(|window| window.location().hostname().ok())
        .unwrap_or_default()
}

/// Reads conversation turns straight out of the live document.
pub(super) struct DomConversation<'a> {
    document: &'a Document,
}

impl<'a> DomConversation<'a> {
    pub(super) fn new(document: &'a Document) -> Self {
        Self { document }
    }
}

fn first_match_text(turn: &Element, selector: &str) -> Option<String> {
    let node = turn.query_selector(selector).ok().flatten()?;
    match node.dyn_into::<HtmlElement>() {
        Ok(element) => Some(element.inner_text()),
        Err(node) => node.text_content(),
    }
}

impl ConversationDocument for DomConversation<'_> {
    fn conversation_turns(&self, selectors: &TranscriptSelectors) -> Vec<TurnText> {
        let Ok(nodes) = self.document.query_selector_all(&selectors.turn) else {
            tracing::warn!(selector = %selectors.turn, "turn selector was rejected by the document");
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|index| nodes.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|turn| TurnText {
                user: first_match_text(&turn, &selectors.user_content),
                assistant: first_match_text(&turn, &selectors.assistant_content),
            })
            .collect()
    }
}

/// The real page as a [`SurfaceHost`].
pub(super) struct DomSurfaceHost {
    document: Document,
}

impl DomSurfaceHost {
    pub(super) fn new(document: Document) -> Self {
        Self { document }
    }

    fn build_entry_point(
        &self,
        kind: EntryPointKind,
        machine: &Rc<RefCell<RequestMachine>>,
    ) -> Result<(HtmlButtonElement, BoundListener), String> {
        let button: HtmlButtonElement = create_element(&self.document, "button", kind.element_id())?;
        button.set_id(kind.element_id());
        button.set_type("button");
        button.set_text_content(Some(kind.idle_label()));
        apply_styles(&button, &ENTRY_BUTTON_STYLE, kind.element_id())?;
        apply_styles(
            &button,
            &[("background-color", idle_background(kind)), ("font-family", FONT_STACK)],
            kind.element_id(),
        )?;

        let listener = match kind {
            EntryPointKind::Conversation => {
                let machine = Rc::clone(machine);
                let target = button.clone();
                BoundListener::bind(&button, "click", move |_event| {
                    submit_conversation(Rc::clone(&machine), target.clone());
                })?
            }
            EntryPointKind::TextPanel => BoundListener::bind(&button, "click", |_event| {
                if let Err(error) = panel::open_panel() {
                    tracing::warn!(%error, "failed to open text panel");
                }
            })?,
            EntryPointKind::Settings => BoundListener::bind(&button, "click", |_event| {
                settings::open_settings();
            })?,
        };
        Ok((button, listener))
    }
}

fn idle_background(kind: EntryPointKind) -> &'static str {
    match kind {
        EntryPointKind::Conversation => COLOR_PRIMARY,
        EntryPointKind::TextPanel => COLOR_SUCCESS,
        EntryPointKind::Settings => COLOR_MUTED,
    }
}

impl SurfaceHost for DomSurfaceHost {
    fn is_present(&self, root_id: &str) -> bool {
        self.document.get_element_by_id(root_id).is_some()
    }

    fn mount(&mut self, spec: &SurfaceSpec, generation: u64) -> Result<(), SurfaceError> {
        let build_error = |element: &'static str| move |message: String| SurfaceError::Build { element, message };

        let root: HtmlElement =
            create_element(&self.document, "div", "surface root").map_err(build_error("surface root"))?;
        root.set_id(spec.root_id);
        apply_styles(
            &root,
            &[
                ("position", "fixed"),
                ("bottom", "20px"),
                ("right", "20px"),
                ("z-index", SURFACE_Z_INDEX),
                ("display", "flex"),
                ("flex-direction", "column"),
                ("gap", "10px"),
            ],
            "surface root",
        )
        .map_err(build_error("surface root"))?;

        let conversation_machine = Rc::new(RefCell::new(RequestMachine::default()));
        let mut listeners = Vec::with_capacity(spec.entry_points.len());
        for kind in &spec.entry_points {
            let (button, listener) = self
                .build_entry_point(*kind, &conversation_machine)
                .map_err(build_error(kind.element_id()))?;
            root.append_child(&button)
                .map_err(|_| SurfaceError::Build {
                    element: kind.element_id(),
                    message: "failed to append entry point".to_string(),
                })?;
            listeners.push(listener);
        }

        append_to_body(&self.document, &root, "surface root")
            .map_err(SurfaceError::DocumentUnavailable)?;

        let previous = SURFACE.with(|slot| {
            slot.borrow_mut()
                .replace(SurfaceBindings { generation, listeners })
        });
        if let Some(previous) = previous {
            tracing::debug!(
                generation = previous.generation,
                listeners = previous.listeners.len(),
                "dropping handlers of a removed surface"
            );
        }
        Ok(())
    }
}
