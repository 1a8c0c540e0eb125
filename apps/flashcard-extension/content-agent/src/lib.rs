#[cfg(target_arch = "wasm32")]
mod agent_constants;
#[cfg(target_arch = "wasm32")]
mod agent_state;
#[cfg(any(target_arch = "wasm32", test))]
mod feedback;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use flashcard_client_core::surface::{ReconcileOutcome, SurfaceSpec};
    use flashcard_client_core::{
        AgentConfig, EntryPointView, IdentityProvider, PayloadDraft, RequestMachine,
        SubmissionReport, SurfaceReconciler, TranscriptSelectors, UiState, run_submission,
    };
    use gloo_timers::future::sleep;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{Document, HtmlButtonElement, HtmlElement};

    use crate::agent_constants::*;
    use crate::agent_state::{
        AgentContext, AgentDiagnostics, MutationBinding, PanelBindings, SelectionBindings,
        SettingsBindings, SurfaceBindings,
    };
    use crate::feedback::{FeedbackTarget, appearance};

    mod dom;
    mod entry;
    mod lifecycle;
    mod network;
    mod panel;
    mod selection;
    mod settings;
    mod storage;

    use dom::*;
    pub(crate) use dom::BoundListener;
    use entry::*;
    use lifecycle::*;
    pub(crate) use network::{GlooDisplayTimer, HttpGenerationClient};
    use storage::{ChromeSyncStore, LocalStorageStore};

    thread_local! {
        static CONTEXT: RefCell<Option<Rc<AgentContext>>> = const { RefCell::new(None) };
        static DIAGNOSTICS: RefCell<AgentDiagnostics> = RefCell::new(AgentDiagnostics::default());
        static RECONCILER: RefCell<Option<SurfaceReconciler>> = const { RefCell::new(None) };
        static SURFACE: RefCell<Option<SurfaceBindings>> = const { RefCell::new(None) };
        static MUTATION_OBSERVER: RefCell<Option<MutationBinding>> = const { RefCell::new(None) };
        static PANEL: RefCell<Option<PanelBindings>> = const { RefCell::new(None) };
        static PANEL_SERIAL: Cell<u64> = const { Cell::new(0) };
        static SETTINGS: RefCell<Option<SettingsBindings>> = const { RefCell::new(None) };
        static SELECTION: RefCell<Option<SelectionBindings>> = const { RefCell::new(None) };
        static SELECTION_SERIAL: Cell<u64> = const { Cell::new(0) };
        static SELECTION_MOUSEUP_HANDLER: RefCell<Option<BoundListener>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        install_console_tracing();
        set_agent_phase("booting", "initializing flashcard content agent");
        if let Err(error) = boot() {
            set_agent_error(&error);
        }
    }

    #[wasm_bindgen]
    pub fn agent_diagnostics_json() -> String {
        DIAGNOSTICS.with(|state| {
            serde_json::to_string(&*state.borrow()).unwrap_or_else(|_| {
                "{\"phase\":\"error\",\"detail\":\"diagnostics serialization failed\"}".to_string()
            })
        })
    }

    pub(super) fn agent_context() -> Option<Rc<AgentContext>> {
        CONTEXT.with(|slot| slot.borrow().clone())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::agent_diagnostics_json;

#[cfg(not(target_arch = "wasm32"))]
pub fn agent_diagnostics_json() -> String {
    "{\"phase\":\"native\",\"detail\":\"content agent diagnostics only available on wasm\"}".to_string()
}
