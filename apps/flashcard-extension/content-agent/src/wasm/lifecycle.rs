use std::io;

use flashcard_client_core::IdentityStore;
use flashcard_client_core::config::EndpointVariant;
use tracing_subscriber::fmt::MakeWriter;
use web_sys::{MutationObserver, MutationObserverInit};

use super::*;

/// Buffers one formatted event and hands it to `console.log` on drop.
pub(super) struct ConsoleWriter {
    buffer: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buffer);
        let line = line.trim_end();
        if !line.is_empty() {
            web_sys::console::log_1(&JsValue::from_str(line));
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter { buffer: Vec::new() }
    }
}

/// No timestamps: the system clock is unavailable on `wasm32-unknown-unknown`.
pub(super) fn install_console_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .try_init();
    if installed.is_err() {
        web_sys::console::warn_1(&JsValue::from_str(
            "flashcard agent: tracing subscriber already installed",
        ));
    }
}

pub(super) fn set_agent_phase(phase: &str, detail: &str) {
    DIAGNOSTICS.with(|state| {
        let mut state = state.borrow_mut();
        state.phase = phase.to_string();
        state.detail = detail.to_string();
        if phase != "error" {
            state.last_error = None;
        }
    });
    tracing::debug!(phase, detail, "agent phase");
}

pub(super) fn set_agent_error(message: &str) {
    DIAGNOSTICS.with(|state| {
        let mut state = state.borrow_mut();
        state.phase = "error".to_string();
        state.detail = "startup failed".to_string();
        state.last_error = Some(message.to_string());
    });
    tracing::warn!(error = message, "flashcard agent failed to start");
}

/// Reads the optional JSON override from the page global. An unusable override
/// falls back to the defaults.
pub(super) fn load_agent_config() -> AgentConfig {
    let Some(window) = web_sys::window() else {
        return AgentConfig::default();
    };
    let raw = match js_sys::Reflect::get(&window, &JsValue::from_str(AGENT_CONFIG_GLOBAL)) {
        Ok(value) if value.is_undefined() || value.is_null() => return AgentConfig::default(),
        Ok(value) => value,
        Err(_) => return AgentConfig::default(),
    };
    let json = match js_sys::JSON::stringify(&raw) {
        Ok(json) => String::from(json),
        Err(_) => {
            tracing::warn!("agent config override is not serializable; using defaults");
            return AgentConfig::default();
        }
    };
    match AgentConfig::from_json(&json) {
        Ok(config) => {
            tracing::info!(service = %config.service_base_url, "loaded agent config override");
            config
        }
        Err(error) => {
            tracing::warn!(%error, "invalid agent config override; using defaults");
            AgentConfig::default()
        }
    }
}

fn identity_stores() -> Vec<Box<dyn IdentityStore>> {
    vec![Box::new(ChromeSyncStore), Box::new(LocalStorageStore)]
}

pub(super) fn boot() -> Result<(), String> {
    let config = load_agent_config();
    let hostname = current_hostname();
    let spec = SurfaceSpec::for_host(&config, &hostname);

    DIAGNOSTICS.with(|state| {
        let mut state = state.borrow_mut();
        state.hostname = Some(hostname.clone());
        state.service_base_url = Some(config.service_base_url.clone());
        state.endpoint_variant = Some(config.endpoint_variant.as_str().to_string());
    });

    let context = AgentContext {
        client: HttpGenerationClient::new(&config, config.endpoint_variant),
        legacy_client: HttpGenerationClient::new(&config, EndpointVariant::Legacy),
        timer: GlooDisplayTimer,
        identity: IdentityProvider::new(identity_stores()),
        selectors: TranscriptSelectors::default(),
        hostname,
        config,
    };
    tracing::info!(
        host = %context.hostname,
        variant = context.config.endpoint_variant.as_str(),
        entry_points = spec.entry_points.len(),
        "flashcard agent starting"
    );
    CONTEXT.with(|slot| *slot.borrow_mut() = Some(Rc::new(context)));
    RECONCILER.with(|slot| *slot.borrow_mut() = Some(SurfaceReconciler::new(spec)));

    set_agent_phase("mounting", "injecting control surface");
    reconcile_surface();
    install_mutation_observer()?;
    selection::install_selection_listener()?;
    set_agent_phase("ready", "watching host page");
    Ok(())
}

/// Runs one reconcile pass. Mutation records caused by a mount are delivered
/// after the pass returns, so they only hit the presence check.
pub(super) fn reconcile_surface() {
    RECONCILER.with(|slot| {
        let Ok(mut slot) = slot.try_borrow_mut() else {
            tracing::debug!("reconcile already running");
            return;
        };
        let Some(reconciler) = slot.as_mut() else {
            return;
        };
        let document = match document() {
            Ok(document) => document,
            Err(error) => {
                tracing::warn!(%error, "cannot reconcile surface");
                return;
            }
        };
        match reconciler.ensure_present(&mut DomSurfaceHost::new(document)) {
            Ok(ReconcileOutcome::AlreadyPresent) => {}
            Ok(ReconcileOutcome::Mounted { generation }) => {
                DIAGNOSTICS.with(|state| state.borrow_mut().surface_generation = generation);
            }
            Err(error) => {
                tracing::warn!(%error, "failed to mount control surface");
                DIAGNOSTICS.with(|state| state.borrow_mut().last_error = Some(error.to_string()));
            }
        }
    });
}

fn install_mutation_observer() -> Result<(), String> {
    let document = document()?;
    let body = document
        .body()
        .ok_or_else(|| "document body is unavailable".to_string())?;

    MUTATION_OBSERVER.with(|slot| {
        if slot.borrow().is_some() {
            return Ok(());
        }
        let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::wrap(Box::new(
            |_records: js_sys::Array, _observer: MutationObserver| {
                reconcile_surface();
            },
        ));
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|_| "failed to create mutation observer".to_string())?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer
            .observe_with_options(&body, &init)
            .map_err(|_| "failed to observe document body".to_string())?;
        *slot.borrow_mut() = Some(MutationBinding {
            _observer: observer,
            _callback: callback,
        });
        Ok(())
    })
}
