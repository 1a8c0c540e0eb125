use flashcard_client_core::transcript::extract_transcript;
use flashcard_client_core::{ErrorKind, PayloadContent, Transcript};

use super::*;

/// Which configured client a submission goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ClientRoute {
    Configured,
    Legacy,
}

/// One entry point's control and the machine that owns its state.
pub(super) struct EntrySubmission {
    pub(super) machine: Rc<RefCell<RequestMachine>>,
    pub(super) button: HtmlButtonElement,
    pub(super) target: FeedbackTarget,
    pub(super) route: ClientRoute,
}

pub(super) fn submit_conversation(machine: Rc<RefCell<RequestMachine>>, button: HtmlButtonElement) {
    let Some(context) = agent_context() else {
        tracing::warn!("conversation trigger before the agent finished booting");
        return;
    };
    let transcript = match document() {
        Ok(document) => extract_transcript(&DomConversation::new(&document), &context.selectors),
        Err(error) => {
            tracing::warn!(%error, "cannot read conversation");
            Transcript::default()
        }
    };
    tracing::debug!(messages = transcript.len(), "extracted conversation");

    let draft = PayloadDraft::new(
        PayloadContent::Transcript(transcript),
        current_source(),
        context.config.conversation_deck.as_str(),
    )
    .with_destination(context.config.default_destination)
    .with_card_count(context.config.default_card_count);

    spawn_submission(
        context,
        EntrySubmission {
            machine,
            button,
            target: FeedbackTarget::ConversationButton,
            route: ClientRoute::Configured,
        },
        draft,
        |_| {},
        |_| {},
    );
}

/// Drives one trigger on the microtask queue. The trigger transition runs
/// before the browser dispatches the next input event, so a double click
/// still sees the entry point disabled.
pub(super) fn spawn_submission<V, D>(
    context: Rc<AgentContext>,
    entry: EntrySubmission,
    draft: PayloadDraft,
    mut on_view: V,
    on_done: D,
) where
    V: FnMut(EntryPointView) + 'static,
    D: FnOnce(SubmissionReport) + 'static,
{
    spawn_local(async move {
        let client = match entry.route {
            ClientRoute::Configured => &context.client,
            ClientRoute::Legacy => &context.legacy_client,
        };
        let button = &entry.button;
        let target = entry.target;
        let report = run_submission(
            &entry.machine,
            draft,
            &context.identity,
            client,
            &context.timer,
            |view| {
                render_entry_point(button, target, view);
                on_view(view);
            },
        )
        .await;
        record_submission(report);
        on_done(report);
    });
}

/// Paints `view` onto `button`. A button that was detached by a host rebuild
/// keeps its in-flight request, but its result is only logged.
pub(super) fn render_entry_point(button: &HtmlButtonElement, target: FeedbackTarget, view: EntryPointView) {
    if !button.is_connected() {
        tracing::debug!(state = ?view.state, "entry point was detached; dropping update");
        return;
    }
    let painted = appearance(target, view);
    button.set_text_content(Some(&painted.label));
    button.set_disabled(painted.disabled);
    let style = button.style();
    let _ = style.set_property("background-color", painted.background);
    let _ = style.set_property("cursor", if painted.disabled { "not-allowed" } else { "pointer" });
}

fn record_submission(report: SubmissionReport) {
    let SubmissionReport::Completed { settled, .. } = report else {
        return;
    };
    DIAGNOSTICS.with(|state| {
        let mut state = state.borrow_mut();
        state.submissions += 1;
        let outcome = match settled {
            UiState::Success(count) => format!("success:{count}"),
            UiState::Error(kind) => {
                if kind != ErrorKind::EmptyInput {
                    state.submission_failures += 1;
                }
                format!("error:{}", kind.as_str())
            }
            UiState::Idle | UiState::Sending => "idle".to_string(),
        };
        state.last_outcome = Some(outcome);
    });
}
