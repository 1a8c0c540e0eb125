//! Platform-independent core of the flashcard content agent.
//!
//! Everything here is plain Rust with trait seams for the document, the
//! identity stores, the generation service and the display timer, so it runs
//! unchanged under `wasm32` and in host tests.

pub mod config;
pub mod identity;
pub mod machine;
pub mod panel;
pub mod payload;
pub mod selection;
pub mod submission;
pub mod surface;
pub mod transcript;
pub mod wire;

pub use config::{AgentConfig, ConfigError, EndpointVariant};
pub use identity::{Identity, IdentityProvider, IdentityStore, StoreError};
pub use machine::{EntryPointView, ErrorKind, RequestMachine, UiState};
pub use payload::{CardCount, Destination, GenerationPayload, PayloadContent, PayloadDraft, SourceMetadata};
pub use submission::{DisplayTimer, SubmissionReport, run_submission};
pub use surface::{SurfaceHost, SurfaceReconciler, SurfaceSpec};
pub use transcript::{ConversationDocument, Message, MessageRole, Transcript, TranscriptSelectors};
pub use wire::{ClientError, GenerationClient, GenerationOutcome};
