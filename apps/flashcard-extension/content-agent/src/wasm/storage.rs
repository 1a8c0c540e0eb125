use async_trait::async_trait;
use flashcard_client_core::{IdentityStore, StoreError};
use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen_futures::JsFuture;

use super::*;

fn js_error_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|message| message.as_string())
        })
        .unwrap_or_else(|| "unknown error".to_string())
}

fn defined(value: JsValue) -> Option<JsValue> {
    (!value.is_undefined() && !value.is_null()).then_some(value)
}

/// The extension's synchronized storage area, reached through `js-sys`
/// reflection since `web-sys` has no bindings for extension APIs.
pub(super) struct ChromeSyncStore;

impl ChromeSyncStore {
    fn backend_error(operation: &'static str, error: &JsValue) -> StoreError {
        StoreError::Backend {
            store: CHROME_SYNC_STORE_NAME,
            operation,
            message: js_error_message(error),
        }
    }

    fn sync_area() -> Result<Object, StoreError> {
        let unavailable = || StoreError::Unavailable {
            store: CHROME_SYNC_STORE_NAME,
        };
        let mut current: JsValue = js_sys::global().into();
        for segment in ["chrome", "storage", "sync"] {
            current = Reflect::get(&current, &JsValue::from_str(segment))
                .ok()
                .and_then(defined)
                .ok_or_else(unavailable)?;
        }
        current.dyn_into::<Object>().map_err(|_| unavailable())
    }

    /// Calls `area[method](argument)` and awaits the promise it returns.
    async fn call(operation: &'static str, method: &str, argument: &JsValue) -> Result<JsValue, StoreError> {
        let area = Self::sync_area()?;
        let function = Reflect::get(&area, &JsValue::from_str(method))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
            .ok_or(StoreError::Unavailable {
                store: CHROME_SYNC_STORE_NAME,
            })?;
        let promise = function
            .call1(&area, argument)
            .map_err(|error| Self::backend_error(operation, &error))?
            .dyn_into::<Promise>()
            .map_err(|_| {
                tracing::debug!(method, "storage area has no promise api");
                StoreError::Unavailable {
                    store: CHROME_SYNC_STORE_NAME,
                }
            })?;
        JsFuture::from(promise)
            .await
            .map_err(|error| Self::backend_error(operation, &error))
    }
}

#[async_trait(?Send)]
impl IdentityStore for ChromeSyncStore {
    fn name(&self) -> &'static str {
        CHROME_SYNC_STORE_NAME
    }

    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let items = Self::call("read", "get", &JsValue::from_str(key)).await?;
        let value = Reflect::get(&items, &JsValue::from_str(key))
            .map_err(|error| Self::backend_error("read", &error))?;
        Ok(value.as_string())
    }

    async fn persist(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let items = Object::new();
        Reflect::set(&items, &JsValue::from_str(key), &JsValue::from_str(value))
            .map_err(|error| Self::backend_error("write", &error))?;
        Self::call("write", "set", &items).await?;
        Ok(())
    }
}

/// Page-local fallback. Shared with the host page's origin.
pub(super) struct LocalStorageStore;

impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .and_then(|window| window.local_storage().ok().flatten())
            .ok_or(StoreError::Unavailable {
                store: LOCAL_STORAGE_STORE_NAME,
            })
    }
}

#[async_trait(?Send)]
impl IdentityStore for LocalStorageStore {
    fn name(&self) -> &'static str {
        LOCAL_STORAGE_STORE_NAME
    }

    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?
            .get_item(key)
            .map_err(|error| StoreError::Backend {
                store: LOCAL_STORAGE_STORE_NAME,
                operation: "read",
                message: js_error_message(&error),
            })
    }

    async fn persist(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|error| StoreError::Backend {
                store: LOCAL_STORAGE_STORE_NAME,
                operation: "write",
                message: js_error_message(&error),
            })
    }
}
