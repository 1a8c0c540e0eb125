use std::cell::RefCell;
use std::time::Duration;

use async_trait::async_trait;

use crate::identity::IdentityProvider;
use crate::machine::{EntryPointView, RequestMachine, TriggerDecision, UiState};
use crate::payload::PayloadDraft;
use crate::wire::GenerationClient;

/// Sleeps for a display window. Never aborts a request.
#[async_trait(?Send)]
pub trait DisplayTimer {
    async fn wait(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionReport {
    /// The entry point already had a request outstanding; nothing happened.
    Busy,
    /// `settled` was shown for its display window. `reverted` is false when a
    /// newer trigger took over in the meantime.
    Completed { settled: UiState, reverted: bool },
}

/// Runs one trigger of an entry point through its whole lifecycle.
///
/// The borrow of `machine` is never held across an await, so other handlers
/// may inspect or trigger it while this submission is suspended.
pub async fn run_submission<C, T, F>(
    machine: &RefCell<RequestMachine>,
    draft: PayloadDraft,
    identity: &IdentityProvider,
    client: &C,
    timer: &T,
    mut observer: F,
) -> SubmissionReport
where
    C: GenerationClient + ?Sized,
    T: DisplayTimer + ?Sized,
    F: FnMut(EntryPointView),
{
    let has_content = !draft.content.is_empty();
    let decision = machine.borrow_mut().trigger(has_content);
    let revert = match decision {
        TriggerDecision::Busy => {
            tracing::debug!("entry point busy; ignoring trigger");
            return SubmissionReport::Busy;
        }
        TriggerDecision::EmptyInput(revert) => {
            tracing::info!("nothing to submit");
            let view = machine.borrow().view();
            observer(view);
            revert
        }
        TriggerDecision::Dispatch => {
            let view = machine.borrow().view();
            observer(view);
            let requested = draft.card_count;
            let payload = draft.bind(identity.get_identity().await);
            tracing::info!(
                deck = %payload.draft.deck_name,
                card_count = requested.get(),
                "submitting generation request"
            );
            let result = client.generate(&payload).await;
            if let Err(error) = &result {
                tracing::warn!(%error, "generation request failed");
            }
            let Some(revert) = machine.borrow_mut().settle(result, requested) else {
                return SubmissionReport::Busy;
            };
            let view = machine.borrow().view();
            observer(view);
            revert
        }
    };

    let settled = machine.borrow().state();
    timer.wait(revert.after).await;
    let reverted = machine.borrow_mut().revert(revert);
    if reverted {
        let view = machine.borrow().view();
        observer(view);
    }
    SubmissionReport::Completed { settled, reverted }
}
