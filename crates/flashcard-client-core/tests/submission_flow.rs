use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use flashcard_client_core::identity::{IdentityProvider, IdentityStore, StoreError};
use flashcard_client_core::machine::{EMPTY_INPUT_DISPLAY, RESULT_DISPLAY};
use flashcard_client_core::transcript::{
    ConversationDocument, TranscriptSelectors, TurnText, extract_transcript,
};
use flashcard_client_core::{
    ClientError, DisplayTimer, EntryPointView, ErrorKind, GenerationClient, GenerationOutcome,
    GenerationPayload, PayloadContent, PayloadDraft, RequestMachine, SourceMetadata,
    SubmissionReport, UiState, run_submission,
};
use futures::channel::oneshot;

#[derive(Default)]
struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

#[async_trait(?Send)]
impl IdentityStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    async fn persist(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct ScriptedClient {
    responses: RefCell<VecDeque<Result<GenerationOutcome, ClientError>>>,
    gate: RefCell<Option<oneshot::Receiver<Result<GenerationOutcome, ClientError>>>>,
    calls: RefCell<Vec<GenerationPayload>>,
}

impl ScriptedClient {
    fn answering(responses: Vec<Result<GenerationOutcome, ClientError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            ..Self::default()
        }
    }
}

#[async_trait(?Send)]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, payload: &GenerationPayload) -> Result<GenerationOutcome, ClientError> {
        self.calls.borrow_mut().push(payload.clone());
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            return gate
                .await
                .unwrap_or_else(|_| Err(ClientError::Network("gate dropped".to_string())));
        }
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Network("no scripted response".to_string())))
    }
}

#[derive(Default)]
struct RecordingTimer {
    waits: RefCell<Vec<Duration>>,
}

#[async_trait(?Send)]
impl DisplayTimer for RecordingTimer {
    async fn wait(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}

struct StaticPage(Vec<TurnText>);

impl ConversationDocument for StaticPage {
    fn conversation_turns(&self, _selectors: &TranscriptSelectors) -> Vec<TurnText> {
        self.0.clone()
    }
}

fn provider() -> IdentityProvider {
    IdentityProvider::new(vec![Box::new(MemoryStore::default())])
}

fn conversation_draft(page: &StaticPage) -> PayloadDraft {
    let transcript = extract_transcript(page, &TranscriptSelectors::default());
    PayloadDraft::new(
        PayloadContent::Transcript(transcript),
        SourceMetadata {
            url: "https://chatgpt.com/c/42".to_string(),
            title: "Photosynthesis".to_string(),
        },
        "ChatGPT Conversations",
    )
}

fn three_turn_page() -> StaticPage {
    StaticPage(vec![
        TurnText {
            user: Some("How do plants eat?".to_string()),
            assistant: None,
        },
        TurnText {
            user: None,
            assistant: Some("They photosynthesize.".to_string()),
        },
        TurnText {
            user: Some("  ".to_string()),
            assistant: None,
        },
    ])
}

#[tokio::test]
async fn empty_transcript_never_reaches_the_network() {
    let machine = RefCell::new(RequestMachine::default());
    let client = ScriptedClient::default();
    let timer = RecordingTimer::default();
    let identity = provider();
    let mut views = Vec::new();

    let report = run_submission(
        &machine,
        conversation_draft(&StaticPage(Vec::new())),
        &identity,
        &client,
        &timer,
        |view| views.push(view),
    )
    .await;

    assert_eq!(
        report,
        SubmissionReport::Completed {
            settled: UiState::Error(ErrorKind::EmptyInput),
            reverted: true
        }
    );
    assert!(client.calls.borrow().is_empty());
    assert!(identity.cached().is_none());
    assert_eq!(*timer.waits.borrow(), vec![EMPTY_INPUT_DISPLAY]);
    assert_eq!(
        views,
        vec![
            EntryPointView {
                state: UiState::Error(ErrorKind::EmptyInput),
                enabled: true
            },
            EntryPointView {
                state: UiState::Idle,
                enabled: true
            },
        ]
    );
}

#[tokio::test]
async fn successful_submission_walks_sending_success_idle() {
    let machine = RefCell::new(RequestMachine::default());
    let client = ScriptedClient::answering(vec![Ok(GenerationOutcome::Produced(3))]);
    let timer = RecordingTimer::default();
    let identity = provider();
    let mut views = Vec::new();

    let report = run_submission(
        &machine,
        conversation_draft(&three_turn_page()),
        &identity,
        &client,
        &timer,
        |view| views.push(view),
    )
    .await;

    assert_eq!(
        report,
        SubmissionReport::Completed {
            settled: UiState::Success(3),
            reverted: true
        }
    );
    assert_eq!(
        views,
        vec![
            EntryPointView {
                state: UiState::Sending,
                enabled: false
            },
            EntryPointView {
                state: UiState::Success(3),
                enabled: true
            },
            EntryPointView {
                state: UiState::Idle,
                enabled: true
            },
        ]
    );
    assert_eq!(*timer.waits.borrow(), vec![RESULT_DISPLAY]);

    let calls = client.calls.borrow();
    assert_eq!(calls.len(), 1);
    let PayloadContent::Transcript(transcript) = &calls[0].draft.content else {
        panic!("conversation payload carries a transcript");
    };
    assert_eq!(transcript.len(), 2);
}

#[tokio::test]
async fn every_request_carries_the_same_identity() {
    let machine = RefCell::new(RequestMachine::default());
    let client = ScriptedClient::answering(vec![
        Ok(GenerationOutcome::Produced(1)),
        Ok(GenerationOutcome::Produced(2)),
    ]);
    let timer = RecordingTimer::default();
    let identity = provider();

    for _ in 0..2 {
        run_submission(
            &machine,
            conversation_draft(&three_turn_page()),
            &identity,
            &client,
            &timer,
            |_| {},
        )
        .await;
    }

    let calls = client.calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].identity, calls[1].identity);
}

#[tokio::test]
async fn outstanding_request_blocks_duplicate_submission() {
    let machine = RefCell::new(RequestMachine::default());
    let client = ScriptedClient::default();
    let (release, gate) = oneshot::channel();
    *client.gate.borrow_mut() = Some(gate);
    let timer = RecordingTimer::default();
    let identity = provider();

    let first = run_submission(
        &machine,
        conversation_draft(&three_turn_page()),
        &identity,
        &client,
        &timer,
        |_| {},
    );
    let second = run_submission(
        &machine,
        conversation_draft(&three_turn_page()),
        &identity,
        &client,
        &timer,
        |_| {},
    );
    let resolve = async {
        let _ = release.send(Ok(GenerationOutcome::Produced(4)));
    };

    let (first, second, ()) = futures::join!(first, second, resolve);

    assert_eq!(second, SubmissionReport::Busy);
    assert_eq!(
        first,
        SubmissionReport::Completed {
            settled: UiState::Success(4),
            reverted: true
        }
    );
    assert_eq!(client.calls.borrow().len(), 1);
}

#[tokio::test]
async fn transport_failure_shows_network_error_then_recovers() {
    let machine = RefCell::new(RequestMachine::default());
    let client = ScriptedClient::answering(vec![Err(ClientError::Network(
        "connection refused".to_string(),
    ))]);
    let timer = RecordingTimer::default();
    let identity = provider();
    let mut views = Vec::new();

    run_submission(
        &machine,
        conversation_draft(&three_turn_page()),
        &identity,
        &client,
        &timer,
        |view| views.push(view),
    )
    .await;

    assert_eq!(
        views.get(1),
        Some(&EntryPointView {
            state: UiState::Error(ErrorKind::NetworkFailure),
            enabled: true
        })
    );
    assert_eq!(machine.borrow().state(), UiState::Idle);
    assert!(machine.borrow().is_enabled());
}
