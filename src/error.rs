use wasm_bindgen::{JsCast, JsValue};

/// Failures of the persistent window store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The browser exposes no `indexedDB` in this context.
    #[error("indexedDB is not available")]
    Unavailable,
    /// Opening the database or upgrading its schema failed.
    #[error("failed to open the window store: {0}")]
    Open(String),
    /// A read or write transaction errored or aborted.
    #[error("window store transaction failed: {0}")]
    Transaction(String),
    /// A stored value could not be decoded into a window.
    #[error("malformed window record: {0}")]
    Malformed(String),
}

/// An object URL could not be created for an image payload.
#[derive(Debug, thiserror::Error)]
#[error("could not create an image handle: {0}")]
pub struct HandleError(pub String);

/// Best-effort readable text for a thrown JS value.
pub fn describe_js(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    // DOMException is also an Error, check it first to keep the name
    if let Some(exception) = value.dyn_ref::<web_sys::DomException>() {
        return format!("{}: {}", exception.name(), exception.message());
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{value:?}")
}
