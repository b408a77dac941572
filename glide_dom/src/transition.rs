//! View-transition orchestration around a DOM mutation.
//!
//! The native facility is feature-detected through `Reflect`; when it is
//! missing or disabled by configuration, the mutation simply runs without
//! animation. Nothing here is an error path.

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlElement};

/// Attribute naming an element across two DOM snapshots so it morphs rather
/// than cross-fades.
pub const TRANSITION_ATTR: &str = "data-glide-transition";
/// Presence opts a tagged element back into the browser's default cross-fade.
pub const CROSSFADE_ATTR: &str = "data-glide-crossfade";
/// Per-element animation duration override, in milliseconds.
pub const DURATION_ATTR: &str = "data-glide-transition-duration";

const STYLE_ID: &str = "glide-transition-style";

/// Wraps a DOM mutation in a native view transition when supported and
/// enabled, with an instant fallback otherwise.
#[derive(Debug, Clone, Copy)]
pub struct TransitionCoordinator {
    enabled: bool,
}

impl TransitionCoordinator {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Whether the document exposes the native view-transition facility.
    pub fn supported(document: &Document) -> bool {
        Reflect::has(document, &"startViewTransition".into()).unwrap_or(false)
    }

    /// Run `mutate` inside a view transition.
    ///
    /// Tags every `data-glide-transition` element before the mutation (old
    /// snapshot) and again inside the transition callback (new snapshot),
    /// awaits the transition's completion, then clears every tag and the
    /// injected per-navigation stylesheet so nothing leaks into the next
    /// cycle.
    pub async fn transition<F>(&self, document: &Document, mutate: F) -> Result<(), JsValue>
    where
        F: FnOnce() + 'static,
    {
        if !self.enabled || !Self::supported(document) {
            mutate();
            return Ok(());
        }

        tag_elements(document)?;

        let start: Function = Reflect::get(document, &"startViewTransition".into())?.dyn_into()?;

        let callback_doc = document.clone();
        let callback = Closure::once_into_js(move || {
            mutate();
            // The swapped-in body carries its own transition attributes;
            // tagging again captures the "new" state.
            let _ = tag_elements(&callback_doc);
        });

        let view_transition = start.call1(document, &callback)?;

        if let Ok(finished) = Reflect::get(&view_transition, &"finished".into())
            && let Ok(promise) = finished.dyn_into::<Promise>()
        {
            // A skipped transition rejects `finished`; that is a normal
            // outcome, not a failure of the navigation.
            let _ = JsFuture::from(promise).await;
        }

        clear_tags(document);

        Ok(())
    }
}

// Assign a `view-transition-name` to every tagged element and accumulate the
// dynamic CSS for this cycle: anti-ghosting rules for elements not opted into
// cross-fade, and per-element duration overrides.
fn tag_elements(document: &Document) -> Result<(), JsValue> {
    let nodes = document.query_selector_all(&format!("[{TRANSITION_ATTR}]"))?;
    let mut css = String::new();

    for i in 0..nodes.length() {
        let Some(node) = nodes.item(i) else { continue };
        let Some(el) = node.dyn_ref::<HtmlElement>() else {
            continue;
        };
        let Some(raw) = el.get_attribute(TRANSITION_ATTR) else {
            continue;
        };

        let name = glide_utils::css_ident(raw.trim());
        if name.is_empty() {
            continue;
        }

        el.style().set_property("view-transition-name", &name)?;

        if !el.has_attribute(CROSSFADE_ATTR) {
            // Hide the old snapshot and suppress fade-in on the new one so
            // the element morphs geometrically instead of ghosting.
            css.push_str(&format!(
                "::view-transition-old({name}){{animation:none;opacity:0;}}\
                 ::view-transition-new({name}){{animation:none;}}"
            ));
        }

        if let Some(duration) = el
            .get_attribute(DURATION_ATTR)
            .as_deref()
            .and_then(glide_utils::parse_delay_ms)
        {
            css.push_str(&format!(
                "::view-transition-group({name}){{animation-duration:{duration}ms;}}"
            ));
        }
    }

    if !css.is_empty() {
        append_transition_css(document, &css)?;
    }

    Ok(())
}

// Appended, not replaced: the rules for the old snapshot must survive the
// second tagging pass that runs inside the transition callback.
fn append_transition_css(document: &Document, css: &str) -> Result<(), JsValue> {
    if let Some(style) = document.get_element_by_id(STYLE_ID) {
        let mut content = style.text_content().unwrap_or_default();
        content.push_str(css);
        style.set_text_content(Some(&content));
        return Ok(());
    }

    let Some(head) = document.head() else {
        return Ok(());
    };

    let style = document.create_element("style")?;
    style.set_id(STYLE_ID);
    style.set_text_content(Some(css));
    head.append_child(&style)?;

    Ok(())
}

fn clear_tags(document: &Document) {
    if let Ok(nodes) = document.query_selector_all(&format!("[{TRANSITION_ATTR}]")) {
        for i in 0..nodes.length() {
            let Some(node) = nodes.item(i) else { continue };
            let Some(el) = node.dyn_ref::<HtmlElement>() else {
                continue;
            };
            let _ = el.style().remove_property("view-transition-name");
        }
    }

    if let Some(style) = document.get_element_by_id(STYLE_ID) {
        style.remove();
    }
}
