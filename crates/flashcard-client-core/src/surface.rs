use crate::config::AgentConfig;

/// Presence of the injected control is tested by this id alone.
pub const SURFACE_ROOT_ID: &str = "flashcard-buttons-container";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPointKind {
    /// Extracts the visible chat and submits it.
    Conversation,
    /// Opens the free-text input panel.
    TextPanel,
    /// Opens the identity/settings dialog.
    Settings,
}

impl EntryPointKind {
    #[must_use]
    pub fn element_id(self) -> &'static str {
        match self {
            Self::Conversation => "makeFlashcardButton",
            Self::TextPanel => "textFlashcardButton",
            Self::Settings => "settingsButton",
        }
    }

    #[must_use]
    pub fn idle_label(self) -> &'static str {
        match self {
            Self::Conversation => "💬 Chat → Cards",
            Self::TextPanel => "📝 Text → Cards",
            Self::Settings => "⚙️ Settings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSpec {
    pub root_id: &'static str,
    pub entry_points: Vec<EntryPointKind>,
}

impl SurfaceSpec {
    /// The conversation entry point only appears on chat hosts.
    #[must_use]
    pub fn for_host(config: &AgentConfig, hostname: &str) -> Self {
        let mut entry_points = Vec::with_capacity(3);
        if config.is_chat_host(hostname) {
            entry_points.push(EntryPointKind::Conversation);
        }
        entry_points.push(EntryPointKind::TextPanel);
        entry_points.push(EntryPointKind::Settings);
        Self {
            root_id: SURFACE_ROOT_ID,
            entry_points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("document is unavailable: {0}")]
    DocumentUnavailable(String),
    #[error("failed to build {element}: {message}")]
    Build {
        element: &'static str,
        message: String,
    },
}

/// The document the surface lives in.
pub trait SurfaceHost {
    fn is_present(&self, root_id: &str) -> bool;

    /// Builds the whole surface and binds fresh handlers. `generation` increases
    /// with every mount so handlers from an earlier build can be told apart.
    fn mount(&mut self, spec: &SurfaceSpec, generation: u64) -> Result<(), SurfaceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    AlreadyPresent,
    Mounted { generation: u64 },
}

#[derive(Debug, Clone)]
pub struct SurfaceReconciler {
    spec: SurfaceSpec,
    generation: u64,
}

impl SurfaceReconciler {
    #[must_use]
    pub fn new(spec: SurfaceSpec) -> Self {
        Self {
            spec,
            generation: 0,
        }
    }

    /// Number of mounts so far; zero before the first one.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Idempotent. The presence check runs before anything is created, so the
    /// mutation notifications caused by mounting settle on the next call.
    pub fn ensure_present<H>(&mut self, host: &mut H) -> Result<ReconcileOutcome, SurfaceError>
    where
        H: SurfaceHost + ?Sized,
    {
        if host.is_present(self.spec.root_id) {
            return Ok(ReconcileOutcome::AlreadyPresent);
        }

        let generation = self.generation + 1;
        host.mount(&self.spec, generation)?;
        self.generation = generation;
        if generation > 1 {
            tracing::info!(generation, "surface was removed by the host page; rebuilt");
        } else {
            tracing::debug!(generation, "surface mounted");
        }
        Ok(ReconcileOutcome::Mounted { generation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeHost {
        roots: Vec<(String, u64)>,
        fail_next_mount: bool,
    }

    impl SurfaceHost for FakeHost {
        fn is_present(&self, root_id: &str) -> bool {
            self.roots.iter().any(|(id, _)| id == root_id)
        }

        fn mount(&mut self, spec: &SurfaceSpec, generation: u64) -> Result<(), SurfaceError> {
            if std::mem::take(&mut self.fail_next_mount) {
                return Err(SurfaceError::Build {
                    element: "container",
                    message: "body missing".to_string(),
                });
            }
            self.roots.push((spec.root_id.to_string(), generation));
            Ok(())
        }
    }

    fn reconciler() -> SurfaceReconciler {
        SurfaceReconciler::new(SurfaceSpec::for_host(&AgentConfig::default(), "chatgpt.com"))
    }

    #[test]
    fn repeated_notifications_mount_once() {
        let mut host = FakeHost::default();
        let mut reconciler = reconciler();

        assert_eq!(
            reconciler.ensure_present(&mut host),
            Ok(ReconcileOutcome::Mounted { generation: 1 })
        );
        for _ in 0..10 {
            assert_eq!(
                reconciler.ensure_present(&mut host),
                Ok(ReconcileOutcome::AlreadyPresent)
            );
        }
        assert_eq!(host.roots.len(), 1);
    }

    #[test]
    fn removal_then_notification_rebuilds_exactly_one() {
        let mut host = FakeHost::default();
        let mut reconciler = reconciler();
        reconciler.ensure_present(&mut host).expect("initial mount");

        host.roots.clear();
        reconciler.ensure_present(&mut host).expect("rebuild");
        reconciler.ensure_present(&mut host).expect("no-op");

        assert_eq!(host.roots, vec![(SURFACE_ROOT_ID.to_string(), 2)]);
        assert_eq!(reconciler.generation(), 2);
    }

    #[test]
    fn failed_mount_does_not_advance_generation() {
        let mut host = FakeHost {
            fail_next_mount: true,
            ..FakeHost::default()
        };
        let mut reconciler = reconciler();

        assert!(reconciler.ensure_present(&mut host).is_err());
        assert_eq!(reconciler.generation(), 0);
        assert_eq!(
            reconciler.ensure_present(&mut host),
            Ok(ReconcileOutcome::Mounted { generation: 1 })
        );
    }

    #[test]
    fn conversation_entry_point_only_on_chat_hosts() {
        let config = AgentConfig::default();
        let chat = SurfaceSpec::for_host(&config, "chatgpt.com");
        let other = SurfaceSpec::for_host(&config, "en.wikipedia.org");

        assert_eq!(
            chat.entry_points,
            vec![
                EntryPointKind::Conversation,
                EntryPointKind::TextPanel,
                EntryPointKind::Settings
            ]
        );
        assert_eq!(
            other.entry_points,
            vec![EntryPointKind::TextPanel, EntryPointKind::Settings]
        );
    }
}
