use flashcard_client_core::{AgentConfig, IdentityProvider, TranscriptSelectors};
use serde::Serialize;
use wasm_bindgen::prelude::Closure;
use web_sys::{HtmlButtonElement, HtmlElement, MutationObserver};

use crate::wasm::{BoundListener, GlooDisplayTimer, HttpGenerationClient};

/// Everything a spawned submission needs; shared by `Rc` so no thread-local
/// borrow is held across an await.
pub(crate) struct AgentContext {
    pub(crate) config: AgentConfig,
    pub(crate) hostname: String,
    pub(crate) selectors: TranscriptSelectors,
    pub(crate) identity: IdentityProvider,
    pub(crate) client: HttpGenerationClient,
    /// Quick cards always use the legacy conversation endpoint.
    pub(crate) legacy_client: HttpGenerationClient,
    pub(crate) timer: GlooDisplayTimer,
}

/// Handlers of one mounted surface. Replaced wholesale on every rebuild.
pub(crate) struct SurfaceBindings {
    pub(crate) generation: u64,
    pub(crate) listeners: Vec<BoundListener>,
}

pub(crate) struct MutationBinding {
    pub(crate) _observer: MutationObserver,
    pub(crate) _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

/// The open input panel. `serial` distinguishes it from panels opened later,
/// so a delayed close never removes a replacement.
pub(crate) struct PanelBindings {
    pub(crate) serial: u64,
    pub(crate) root: HtmlElement,
    pub(crate) _listeners: Vec<BoundListener>,
}

pub(crate) struct SettingsBindings {
    pub(crate) overlay: HtmlElement,
    pub(crate) _listeners: Vec<BoundListener>,
}

pub(crate) struct SelectionBindings {
    pub(crate) serial: u64,
    pub(crate) button: HtmlButtonElement,
    pub(crate) _listener: BoundListener,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AgentDiagnostics {
    pub(crate) phase: String,
    pub(crate) detail: String,
    pub(crate) hostname: Option<String>,
    pub(crate) service_base_url: Option<String>,
    pub(crate) endpoint_variant: Option<String>,
    pub(crate) surface_generation: u64,
    pub(crate) submissions: u64,
    pub(crate) submission_failures: u64,
    pub(crate) last_outcome: Option<String>,
    pub(crate) last_error: Option<String>,
}

impl Default for AgentDiagnostics {
    fn default() -> Self {
        Self {
            phase: "idle".to_string(),
            detail: "content agent not started".to_string(),
            hostname: None,
            service_base_url: None,
            endpoint_variant: None,
            surface_generation: 0,
            submissions: 0,
            submission_failures: 0,
            last_outcome: None,
            last_error: None,
        }
    }
}
