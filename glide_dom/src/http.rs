//! Same-origin HTML fetching shared by primary navigations and prefetches.

use std::fmt;

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortSignal, Headers, RequestInit, Response};

/// Why a page fetch did not produce an HTML document.
///
/// A deliberately aborted request is kept apart from real failures so a
/// superseded navigation is never mistaken for a network error.
#[derive(Debug)]
pub enum FetchError {
    /// The request was aborted through its `AbortSignal`.
    Aborted,
    /// The server answered with a non-2xx status.
    Http(u16),
    /// Transport-level failure, or the environment is missing entirely.
    Network(JsValue),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Aborted => write!(f, "request aborted"),
            FetchError::Http(status) => write!(f, "unexpected status {status}"),
            FetchError::Network(err) => write!(f, "network error: {err:?}"),
        }
    }
}

/// Request priority hint passed to the browser's fetch scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPriority {
    /// Let the browser pick (primary navigations, hover-intent prefetches).
    Auto,
    /// Background work that must not compete with the visible page
    /// (viewport and eager prefetches).
    Low,
}

/// GET a URL expecting a complete HTML document back.
///
/// The `priority` hint is written through `Reflect` since `fetch` priority is
/// not part of the generated bindings.
pub async fn fetch_document(
    url: &str,
    signal: Option<&AbortSignal>,
    priority: FetchPriority,
) -> Result<String, FetchError> {
    let window = web_sys::window()
        .ok_or_else(|| FetchError::Network(JsValue::from_str("window not found")))?;

    let init = RequestInit::new();
    init.set_method("GET");

    let headers = Headers::new().map_err(FetchError::Network)?;
    headers
        .set("Accept", "text/html")
        .map_err(FetchError::Network)?;
    init.set_headers(&headers);

    if let Some(signal) = signal {
        init.set_signal(Some(signal));
    }

    if priority == FetchPriority::Low {
        let _ = js_sys::Reflect::set(&init, &"priority".into(), &"low".into());
    }

    let response = JsFuture::from(window.fetch_with_str_and_init(url, &init))
        .await
        .map_err(classify)?;
    let response: Response = response.dyn_into().map_err(FetchError::Network)?;

    if !response.ok() {
        return Err(FetchError::Http(response.status()));
    }

    let text = JsFuture::from(response.text().map_err(FetchError::Network)?)
        .await
        .map_err(classify)?;

    text.as_string()
        .ok_or_else(|| FetchError::Network(JsValue::from_str("response body was not text")))
}

fn classify(err: JsValue) -> FetchError {
    let is_abort = err
        .dyn_ref::<web_sys::DomException>()
        .map(|e| e.name() == "AbortError")
        .unwrap_or(false);

    if is_abort {
        FetchError::Aborted
    } else {
        FetchError::Network(err)
    }
}
