use std::time::Duration;

use crate::payload::CardCount;
use crate::wire::{ClientError, GenerationOutcome};

/// How long `Error(EmptyInput)` stays visible.
pub const EMPTY_INPUT_DISPLAY: Duration = Duration::from_secs(2);
/// How long `Success` and every other `Error` stay visible.
pub const RESULT_DISPLAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Nothing to send; the network is never touched.
    EmptyInput,
    /// Accepted, but zero cards were produced.
    EmptyResult,
    /// Non-success status or a body of the wrong shape.
    ServerRejected,
    /// No response at all.
    NetworkFailure,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::EmptyResult => "empty_result",
            Self::ServerRejected => "server_rejected",
            Self::NetworkFailure => "network_failure",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UiState {
    #[default]
    Idle,
    Sending,
    Success(u32),
    Error(ErrorKind),
}

impl UiState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success(_) | Self::Error(_))
    }
}

/// What a renderer needs to paint one entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPointView {
    pub state: UiState,
    pub enabled: bool,
}

/// A pending return to `Idle`. Stale once the machine has moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevertTimer {
    epoch: u64,
    pub after: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// A request from this entry point is still outstanding.
    Busy,
    /// Moved to `Error(EmptyInput)` without a request.
    EmptyInput(RevertTimer),
    /// Moved to `Sending`; the caller must issue exactly one request.
    Dispatch,
}

/// Per-entry-point lifecycle: `Idle -> Sending -> {Success | Error} -> Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMachine {
    state: UiState,
    enabled: bool,
    epoch: u64,
}

impl Default for RequestMachine {
    fn default() -> Self {
        Self {
            state: UiState::Idle,
            enabled: true,
            epoch: 0,
        }
    }
}

impl RequestMachine {
    #[must_use]
    pub fn state(&self) -> UiState {
        self.state
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn view(&self) -> EntryPointView {
        EntryPointView {
            state: self.state,
            enabled: self.enabled,
        }
    }

    fn enter(&mut self, state: UiState, enabled: bool) {
        self.state = state;
        self.enabled = enabled;
        self.epoch += 1;
    }

    /// Synchronous so the entry point is disabled before control returns to the
    /// event loop. A trigger during a terminal display starts a new cycle and
    /// makes the pending revert stale.
    pub fn trigger(&mut self, has_content: bool) -> TriggerDecision {
        if !self.enabled || self.state == UiState::Sending {
            return TriggerDecision::Busy;
        }
        if !has_content {
            self.enter(UiState::Error(ErrorKind::EmptyInput), true);
            return TriggerDecision::EmptyInput(RevertTimer {
                epoch: self.epoch,
                after: EMPTY_INPUT_DISPLAY,
            });
        }
        self.enter(UiState::Sending, false);
        TriggerDecision::Dispatch
    }

    /// Applies the response of the outstanding request. Returns `None` when the
    /// machine is not `Sending`.
    pub fn settle(
        &mut self,
        result: Result<GenerationOutcome, ClientError>,
        requested: CardCount,
    ) -> Option<RevertTimer> {
        if self.state != UiState::Sending {
            return None;
        }
        let next = match result {
            Ok(GenerationOutcome::Produced(0) | GenerationOutcome::Accepted { count: Some(0) }) => {
                UiState::Error(ErrorKind::EmptyResult)
            }
            Ok(GenerationOutcome::Produced(count)) => UiState::Success(count),
            Ok(GenerationOutcome::Accepted { count }) => {
                UiState::Success(count.unwrap_or_else(|| requested.get()))
            }
            Err(error) => UiState::Error(error.kind()),
        };
        self.enter(next, true);
        Some(RevertTimer {
            epoch: self.epoch,
            after: RESULT_DISPLAY,
        })
    }

    /// Returns to `Idle` unless something happened since `timer` was issued.
    pub fn revert(&mut self, timer: RevertTimer) -> bool {
        if timer.epoch != self.epoch || !self.state.is_terminal() {
            return false;
        }
        self.enter(UiState::Idle, true);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trigger_goes_straight_to_error() {
        let mut machine = RequestMachine::default();
        let TriggerDecision::EmptyInput(timer) = machine.trigger(false) else {
            panic!("expected empty input");
        };
        assert_eq!(timer.after, EMPTY_INPUT_DISPLAY);
        assert_eq!(machine.state(), UiState::Error(ErrorKind::EmptyInput));
        assert!(machine.is_enabled());
        assert!(machine.revert(timer));
        assert_eq!(machine.state(), UiState::Idle);
    }

    #[test]
    fn sending_disables_and_blocks_second_trigger() {
        let mut machine = RequestMachine::default();
        assert_eq!(machine.trigger(true), TriggerDecision::Dispatch);
        assert_eq!(machine.view(), EntryPointView { state: UiState::Sending, enabled: false });
        assert_eq!(machine.trigger(true), TriggerDecision::Busy);
        assert_eq!(machine.trigger(false), TriggerDecision::Busy);
        assert_eq!(machine.state(), UiState::Sending);
    }

    #[test]
    fn produced_items_become_success_and_revert() {
        let mut machine = RequestMachine::default();
        machine.trigger(true);
        let timer = machine
            .settle(Ok(GenerationOutcome::Produced(3)), CardCount::DEFAULT)
            .expect("machine was sending");
        assert_eq!(machine.view(), EntryPointView { state: UiState::Success(3), enabled: true });
        assert_eq!(timer.after, RESULT_DISPLAY);
        assert!(machine.revert(timer));
        assert_eq!(machine.state(), UiState::Idle);
        assert!(!machine.revert(timer));
    }

    #[test]
    fn zero_items_is_empty_result() {
        let mut machine = RequestMachine::default();
        machine.trigger(true);
        machine.settle(Ok(GenerationOutcome::Produced(0)), CardCount::DEFAULT);
        assert_eq!(machine.state(), UiState::Error(ErrorKind::EmptyResult));

        machine.trigger(true);
        machine.settle(
            Ok(GenerationOutcome::Accepted { count: Some(0) }),
            CardCount::DEFAULT,
        );
        assert_eq!(machine.state(), UiState::Error(ErrorKind::EmptyResult));
    }

    #[test]
    fn legacy_acceptance_without_count_uses_requested() {
        let mut machine = RequestMachine::default();
        machine.trigger(true);
        machine.settle(
            Ok(GenerationOutcome::Accepted { count: None }),
            CardCount::clamped(7),
        );
        assert_eq!(machine.state(), UiState::Success(7));
    }

    #[test]
    fn client_errors_map_to_their_kind() {
        let cases = [
            (ClientError::Network("offline".to_string()), ErrorKind::NetworkFailure),
            (
                ClientError::Rejected {
                    status: 500,
                    message: "boom".to_string(),
                },
                ErrorKind::ServerRejected,
            ),
            (ClientError::UnexpectedBody("{}".to_string()), ErrorKind::ServerRejected),
        ];
        for (error, kind) in cases {
            let mut machine = RequestMachine::default();
            machine.trigger(true);
            machine.settle(Err(error), CardCount::DEFAULT);
            assert_eq!(machine.view(), EntryPointView { state: UiState::Error(kind), enabled: true });
        }
    }

    #[test]
    fn retrigger_during_display_makes_old_revert_stale() {
        let mut machine = RequestMachine::default();
        machine.trigger(true);
        let stale = machine
            .settle(Err(ClientError::Network("offline".to_string())), CardCount::DEFAULT)
            .expect("machine was sending");

        assert_eq!(machine.trigger(true), TriggerDecision::Dispatch);
        assert!(!machine.revert(stale));
        assert_eq!(machine.state(), UiState::Sending);
    }

    #[test]
    fn settle_outside_sending_is_ignored() {
        let mut machine = RequestMachine::default();
        assert_eq!(
            machine.settle(Ok(GenerationOutcome::Produced(2)), CardCount::DEFAULT),
            None
        );
        assert_eq!(machine.state(), UiState::Idle);
    }
}
