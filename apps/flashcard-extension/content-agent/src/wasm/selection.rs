use flashcard_client_core::selection::{qualifying_selection, selection_draft};
use web_sys::{MouseEvent, Node};

use super::*;

pub(super) fn install_selection_listener() -> Result<(), String> {
    let document = document()?;
    SELECTION_MOUSEUP_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return Ok(());
        }
        let listener = BoundListener::bind(&document, "mouseup", |event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                offer_quick_card(event);
            }
        })?;
        *slot.borrow_mut() = Some(listener);
        Ok(())
    })
}

fn is_on_quick_card(event: &MouseEvent) -> bool {
    let Some(target) = event.target().and_then(|target| target.dyn_into::<Node>().ok()) else {
        return false;
    };
    SELECTION.with(|slot| {
        slot.borrow()
            .as_ref()
            .is_some_and(|bindings| bindings.button.contains(Some(&target)))
    })
}

fn offer_quick_card(event: &MouseEvent) {
    if is_on_quick_card(event) {
        return;
    }
    let selected = web_sys::window()
        .and_then(|window| window.get_selection().ok().flatten())
        .map(|selection| String::from(selection.to_string()))
        .unwrap_or_default();
    let Some(selected) = qualifying_selection(&selected) else {
        return;
    };
    if let Err(error) = show_quick_card(selected.to_string(), event.client_x(), event.client_y()) {
        tracing::warn!(%error, "failed to offer quick card");
    }
}

fn show_quick_card(selected: String, x: i32, y: i32) -> Result<(), String> {
    if agent_context().is_none() {
        return Err("agent has not booted".to_string());
    }
    let document = document()?;
    remove_quick_card(None);
    let chars = selected.chars().count();

    let serial = SELECTION_SERIAL.with(|cell| {
        let next = cell.get() + 1;
        cell.set(next);
        next
    });
    let button: HtmlButtonElement = create_element(&document, "button", "quick card button")?;
    button.set_id(SELECTION_BUTTON_ID);
    button.set_type("button");
    apply_styles(
        &button,
        &[
            ("position", "fixed"),
            ("top", &format!("{y}px")),
            ("left", &format!("{x}px")),
            ("z-index", SURFACE_Z_INDEX),
            ("color", "white"),
            ("border", "none"),
            ("padding", "8px"),
            ("border-radius", "4px"),
            ("cursor", "pointer"),
            ("font-family", FONT_STACK),
        ],
        "quick card button",
    )?;

    let machine = Rc::new(RefCell::new(RequestMachine::default()));
    let listener = {
        let button = button.clone();
        let machine = Rc::clone(&machine);
        BoundListener::bind(&button.clone(), "click", move |_event| {
            let Some(context) = agent_context() else {
                return;
            };
            let draft =
                selection_draft(&selected, current_source(), &context.config.conversation_deck);
            spawn_submission(
                context,
                EntrySubmission {
                    machine: Rc::clone(&machine),
                    button: button.clone(),
                    target: FeedbackTarget::SelectionButton,
                    route: ClientRoute::Legacy,
                },
                draft,
                |_| {},
                move |report| {
                    let succeeded = matches!(
                        report,
                        SubmissionReport::Completed {
                            settled: UiState::Success(_),
                            ..
                        }
                    );
                    if succeeded {
                        remove_quick_card(Some(serial));
                    }
                },
            );
        })?
    };

    append_to_body(&document, &button, "quick card button")?;
    render_entry_point(&button, FeedbackTarget::SelectionButton, machine.borrow().view());
    SELECTION.with(|slot| {
        *slot.borrow_mut() = Some(SelectionBindings {
            serial,
            button,
            _listener: listener,
        });
    });
    tracing::debug!(serial, chars, "offered quick card");
    Ok(())
}

/// Removes the floating button; with `Some(serial)` only if it is still that one.
fn remove_quick_card(serial: Option<u64>) {
    let taken = SELECTION.with(|slot| {
        let mut slot = slot.borrow_mut();
        let matches = slot
            .as_ref()
            .is_some_and(|bindings| serial.is_none_or(|serial| bindings.serial == serial));
        if matches { slot.take() } else { None }
    });
    if let Some(bindings) = taken {
        bindings.button.remove();
        defer_drop(bindings);
    }
}
