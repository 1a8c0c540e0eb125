use std::cell::OnceCell;

use async_trait::async_trait;
use futures::lock::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const IDENTITY_STORAGE_KEY: &str = "flashcard_user_id";

/// Stable per-installation token sent with every identity-scoped request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Random v4 identifier in lowercase 8-4-4-4-12 form.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Persisted values are opaque; anything non-blank is accepted as-is.
    #[must_use]
    pub fn from_persisted(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks the generated format: lowercase hex groups 8-4-4-4-12, version nibble
/// `4`, variant nibble in `8..=b`.
#[cfg(test)]
fn is_well_formed_identity(raw: &str) -> bool {
    const GROUP_LENGTHS: [usize; 5] = [8, 4, 4, 4, 12];

    let groups = raw.split('-').collect::<Vec<_>>();
    if groups.len() != GROUP_LENGTHS.len() {
        return false;
    }
    let shape_ok = groups.iter().zip(GROUP_LENGTHS).all(|(group, len)| {
        group.len() == len
            && group
                .chars()
                .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch))
    });
    if !shape_ok {
        return false;
    }
    let version = groups[2].chars().next();
    let variant = groups[3].chars().next();
    version == Some('4') && matches!(variant, Some('8' | '9' | 'a' | 'b'))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{store} is unavailable")]
    Unavailable { store: &'static str },
    #[error("{store} {operation} failed: {message}")]
    Backend {
        store: &'static str,
        operation: &'static str,
        message: String,
    },
}

/// Key-value persistence consulted by [`IdentityProvider`].
#[async_trait(?Send)]
pub trait IdentityStore {
    fn name(&self) -> &'static str;

    async fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn persist(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityOrigin {
    Loaded { store: &'static str },
    Created { store: &'static str },
    /// No store accepted the value; it lives only for this session.
    Ephemeral,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub identity: Identity,
    pub origin: IdentityOrigin,
}

/// Read-or-create over an ordered chain of stores, cached after first resolution.
pub struct IdentityProvider {
    key: String,
    stores: Vec<Box<dyn IdentityStore>>,
    cached: OnceCell<ResolvedIdentity>,
    resolving: Mutex<()>,
}

impl IdentityProvider {
    #[must_use]
    pub fn new(stores: Vec<Box<dyn IdentityStore>>) -> Self {
        Self {
            key: IDENTITY_STORAGE_KEY.to_string(),
            stores,
            cached: OnceCell::new(),
            resolving: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn cached(&self) -> Option<&ResolvedIdentity> {
        self.cached.get()
    }

    pub async fn get_identity(&self) -> Identity {
        self.resolve().await.identity
    }

    /// Never fails. Concurrent first calls are serialized so only one value is
    /// ever generated and persisted.
    pub async fn resolve(&self) -> ResolvedIdentity {
        if let Some(resolved) = self.cached.get() {
            return resolved.clone();
        }

        let _guard = self.resolving.lock().await;
        if let Some(resolved) = self.cached.get() {
            return resolved.clone();
        }

        let resolved = self.resolve_uncached().await;
        match resolved.origin {
            IdentityOrigin::Loaded { store } => {
                tracing::info!(store, "loaded persisted identity");
            }
            IdentityOrigin::Created { store } => {
                tracing::info!(store, "created and persisted new identity");
            }
            IdentityOrigin::Ephemeral => {
                tracing::warn!("no identity store available; using a session-only identity");
            }
        }
        let _ = self.cached.set(resolved.clone());
        resolved
    }

    /// Only an absent store hands over to the next one; any other failure
    /// ends the chain with a session-only identity so nothing else is persisted.
    async fn resolve_uncached(&self) -> ResolvedIdentity {
        for store in &self.stores {
            match self.resolve_from(store.as_ref()).await {
                Ok(resolved) => return resolved,
                Err(error @ StoreError::Unavailable { .. }) => {
                    tracing::warn!(store = store.name(), %error, "identity store unavailable; falling back");
                }
                Err(error @ StoreError::Backend { .. }) => {
                    tracing::warn!(store = store.name(), %error, "identity store failed");
                    break;
                }
            }
        }
        ResolvedIdentity {
            identity: Identity::generate(),
            origin: IdentityOrigin::Ephemeral,
        }
    }

    async fn resolve_from(&self, store: &dyn IdentityStore) -> Result<ResolvedIdentity, StoreError> {
        let existing = store.load(&self.key).await?;
        if let Some(identity) = existing.as_deref().and_then(Identity::from_persisted) {
            return Ok(ResolvedIdentity {
                identity,
                origin: IdentityOrigin::Loaded {
                    store: store.name(),
                },
            });
        }

        let identity = Identity::generate();
        store.persist(&self.key, identity.as_str()).await?;
        Ok(ResolvedIdentity {
            identity,
            origin: IdentityOrigin::Created {
                store: store.name(),
            },
        })
    }
}
