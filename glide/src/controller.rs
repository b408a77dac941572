//! The navigation orchestrator.
//!
//! A click or popstate lands here; the controller resolves HTML (prefetch
//! cache or network), parses it detached, emits the cancellable pre-swap
//! signal, updates history, runs the merge inside a view transition, and
//! fires the post-swap signals. Exactly one request may mutate the DOM at a
//! time: issuing a new one invalidates the previous request's token, aborts
//! its fetch, and turns its continuation into a no-op.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{AbortController, Element, MouseEvent, PopStateEvent, Url};

use glide_dom::{
    DocumentMerger, FetchError, FetchPriority, ScrollCoordinator, TransitionCoordinator,
    fetch_document,
};
use glide_prefetch::PrefetchScheduler;

use crate::config::GlideConfig;
use crate::events::{self, Direction};
use crate::log;

/// Options for a programmatic navigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigateOptions {
    /// Overwrite the current history entry instead of pushing a new one.
    pub replace: bool,
}

struct Listeners {
    click: Closure<dyn FnMut(MouseEvent)>,
    popstate: Closure<dyn FnMut(PopStateEvent)>,
}

struct GlideInner {
    config: GlideConfig,
    merger: DocumentMerger,
    scroll: ScrollCoordinator,
    transitions: TransitionCoordinator,
    prefetch: PrefetchScheduler,
    // Monotonic token: only the request holding the latest value may touch
    // the DOM or emit events.
    generation: Cell<u64>,
    abort: RefCell<Option<AbortController>>,
    listeners: RefCell<Option<Listeners>>,
}

/// The client-side navigation engine.
///
/// Listeners are owned by the instance: created in [`start`], removed in
/// [`stop`], never global, so independent instances can coexist.
///
/// [`start`]: Glide::start
/// [`stop`]: Glide::stop
pub struct Glide {
    inner: Rc<GlideInner>,
}

impl Glide {
    pub fn new(config: GlideConfig) -> Self {
        let merger = DocumentMerger::new(config.persist_attr.clone());
        let scroll = ScrollCoordinator::new(config.scroll, config.smooth_scroll);
        let transitions = TransitionCoordinator::new(config.transitions);
        let prefetch = PrefetchScheduler::new(config.prefetch.clone());

        Self {
            inner: Rc::new(GlideInner {
                config,
                merger,
                scroll,
                transitions,
                prefetch,
                generation: Cell::new(0),
                abort: RefCell::new(None),
                listeners: RefCell::new(None),
            }),
        }
    }

    /// Build an engine from the build-pipeline-injected JSON configuration,
    /// falling back to defaults when none is present.
    pub fn from_document() -> Self {
        Self::new(GlideConfig::from_document())
    }

    /// Attach the click and popstate listeners and start the prefetch
    /// scheduler. Idempotent.
    pub fn start(&self) -> Result<(), JsValue> {
        if self.inner.listeners.borrow().is_some() {
            return Ok(());
        }

        let window = web_sys::window().ok_or("window not found")?;
        let document = window.document().ok_or("document not found")?;

        let click_inner = self.inner.clone();
        let click = Closure::wrap(Box::new(move |event: MouseEvent| {
            on_click(&click_inner, &event);
        }) as Box<dyn FnMut(MouseEvent)>);

        let pop_inner = self.inner.clone();
        let popstate = Closure::wrap(Box::new(move |_event: PopStateEvent| {
            on_popstate(&pop_inner);
        }) as Box<dyn FnMut(PopStateEvent)>);

        document.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback("popstate", popstate.as_ref().unchecked_ref())?;

        *self.inner.listeners.borrow_mut() = Some(Listeners { click, popstate });

        self.inner.prefetch.start();

        Ok(())
    }

    /// Detach all listeners, stop the prefetch scheduler, and invalidate any
    /// in-flight navigation. Idempotent.
    pub fn stop(&self) {
        let Some(listeners) = self.inner.listeners.borrow_mut().take() else {
            return;
        };

        if let Some(window) = web_sys::window() {
            let _ = window.remove_event_listener_with_callback(
                "popstate",
                listeners.popstate.as_ref().unchecked_ref(),
            );
            if let Some(document) = window.document() {
                let _ = document.remove_event_listener_with_callback(
                    "click",
                    listeners.click.as_ref().unchecked_ref(),
                );
            }
        }

        self.inner.prefetch.stop();

        // a stopped engine must not complete an in-flight swap
        self.inner
            .generation
            .set(self.inner.generation.get().wrapping_add(1));
        if let Some(controller) = self.inner.abort.borrow_mut().take() {
            controller.abort();
        }
    }

    /// Navigate programmatically. Cross-origin targets degrade to a native
    /// browser navigation.
    pub fn navigate(&self, url: &str, options: NavigateOptions) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("window not found")?;
        let location = window.location();
        let base = location.href()?;

        let resolved = Url::new_with_base(url, &base)?;
        if resolved.origin() != location.origin()? {
            location.assign(url)?;
            return Ok(());
        }

        let direction = if options.replace {
            Direction::Replace
        } else {
            Direction::Forward
        };
        perform_navigation(&self.inner, resolved, direction);

        Ok(())
    }

    /// Prefetch a URL into the single-consume cache.
    pub fn prefetch(&self, url: &str) {
        self.inner.prefetch.prefetch(url);
    }
}

impl fmt::Debug for Glide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Glide")
            .field("config", &self.inner.config)
            .field("generation", &self.inner.generation.get())
            .field("started", &self.inner.listeners.borrow().is_some())
            .finish()
    }
}

fn on_click(inner: &Rc<GlideInner>, event: &MouseEvent) {
    if event.default_prevented() {
        return;
    }

    let Some(anchor) = find_anchor(&inner.config.link_selector, event) else {
        return;
    };

    let facts = ClickFacts {
        modifier: event.meta_key() || event.ctrl_key() || event.shift_key() || event.alt_key(),
        primary: event.button() == 0,
        target: anchor.get_attribute("target"),
        download: anchor.has_attribute("download"),
        reload_opt_out: anchor.has_attribute(&inner.config.reload_attr),
        href: anchor.get_attribute("href"),
    };

    if !should_intercept(&facts) {
        return;
    }

    // Cross-origin links stay with the browser.
    let Some(url) = resolve_same_origin(facts.href.as_deref().unwrap_or_default()) else {
        return;
    };

    event.prevent_default();
    log::debug(
        inner.config.debug,
        &format!("glide: intercepted click to {}", url.href()),
    );
    perform_navigation(inner, url, Direction::Forward);
}

fn on_popstate(inner: &Rc<GlideInner>) {
    // The browser has already moved the history pointer; we only need to
    // bring the document in line with the new location.
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(href) = window.location().href() else {
        return;
    };
    let Ok(url) = Url::new(&href) else {
        return;
    };

    perform_navigation(inner, url, Direction::Back);
}

// Ordered candidate ancestors from the physical event target outward,
// including shadow hosts; the first match against the link selector wins.
fn find_anchor(selector: &str, event: &MouseEvent) -> Option<Element> {
    let path = event.composed_path();

    for i in 0..path.length() {
        let node = path.get(i);
        let Some(el) = node.dyn_ref::<Element>() else {
            continue;
        };
        if el.matches(selector).unwrap_or(false) {
            return Some(el.clone());
        }
    }

    None
}

#[derive(Debug, Clone, Default)]
struct ClickFacts {
    modifier: bool,
    primary: bool,
    target: Option<String>,
    download: bool,
    reload_opt_out: bool,
    href: Option<String>,
}

fn should_intercept(facts: &ClickFacts) -> bool {
    if facts.modifier || !facts.primary {
        return false;
    }

    if let Some(target) = facts.target.as_deref()
        && !target.is_empty()
        && target != "_self"
    {
        return false;
    }

    if facts.download || facts.reload_opt_out {
        return false;
    }

    let Some(href) = facts.href.as_deref() else {
        return false;
    };
    if glide_utils::is_hash_only(href) || glide_utils::is_unsupported_scheme(href) {
        return false;
    }

    true
}

fn resolve_same_origin(href: &str) -> Option<Url> {
    let window = web_sys::window()?;
    let location = window.location();
    let base = location.href().ok()?;

    let url = Url::new_with_base(href, &base).ok()?;
    if url.origin() != location.origin().ok()? {
        return None;
    }

    Some(url)
}

fn perform_navigation(inner: &Rc<GlideInner>, url: Url, direction: Direction) {
    // The previous request, if any, is dead from this point on.
    let generation = inner.generation.get().wrapping_add(1);
    inner.generation.set(generation);
    if let Some(previous) = inner.abort.borrow_mut().take() {
        previous.abort();
    }

    let task_inner = inner.clone();
    spawn_local(async move {
        if let Err(reason) = run_navigation(&task_inner, &url, direction, generation).await
            && task_inner.generation.get() == generation
        {
            // Never leave the user on a half-updated page.
            log::debug(
                task_inner.config.debug,
                &format!("glide: falling back to full navigation: {reason}"),
            );
            full_navigation(&url);
        }
    });
}

// Errors returned here mean "fall back to a full browser navigation".
// Cancellation is not an error: a superseded request resolves Ok and simply
// stops emitting.
async fn run_navigation(
    inner: &Rc<GlideInner>,
    url: &Url,
    direction: Direction,
    generation: u64,
) -> Result<(), String> {
    let window = web_sys::window().ok_or("window not found")?;
    let document = window.document().ok_or("document not found")?;
    let previous_href = window.location().href().map_err(|_| "location unavailable")?;
    let previous_url = Url::new(&previous_href).map_err(|_| "current URL unparsable")?;

    // Fetching: a prefetched page is consumed from the cache, anything else
    // goes to the network under this request's abort token.
    let html = match inner.prefetch.get_cached_html(&url.href()) {
        Some(html) => html,
        None => {
            let controller = AbortController::new().ok();
            let signal = controller.as_ref().map(|c| c.signal());
            *inner.abort.borrow_mut() = controller;

            let result = fetch_document(&url.href(), signal.as_ref(), FetchPriority::Auto).await;

            if inner.generation.get() == generation {
                inner.abort.borrow_mut().take();
            }

            match result {
                Ok(html) => html,
                Err(FetchError::Aborted) => return Ok(()),
                Err(err) => return Err(err.to_string()),
            }
        }
    };

    if inner.generation.get() != generation {
        return Ok(());
    }

    // Merging: parse into a detached document before touching anything live.
    let new_document =
        DocumentMerger::parse(&html).map_err(|_| "response did not parse as HTML")?;

    if events::emit_before_swap(&document, &url.href(), direction, &new_document) {
        // A handler asked for the real thing; no further lifecycle events.
        full_navigation(url);
        return Ok(());
    }
    // A before-swap handler may itself have navigated.
    if inner.generation.get() != generation {
        return Ok(());
    }

    if inner.config.update_history {
        let history = window.history().map_err(|_| "history unavailable")?;
        let target = url.href();
        let write = match direction {
            Direction::Forward => {
                history.push_state_with_url(&JsValue::NULL, "", Some(target.as_str()))
            }
            Direction::Replace => {
                history.replace_state_with_url(&JsValue::NULL, "", Some(target.as_str()))
            }
            // The browser already moved the pointer.
            Direction::Back => Ok(()),
        };
        write.map_err(|_| "history update rejected")?;
    }

    // Anti-FOUC: hint the new stylesheets before anything visible changes.
    let _ = inner.merger.preload_stylesheets(&document, &new_document);

    // Transitioning: the wrapped mutation merges the head, swaps the body,
    // settles scroll, and announces the swap while the snapshot pair is
    // still fresh.
    let mutate_inner = inner.clone();
    let mutate_document = document.clone();
    let mutate_new = new_document.clone();
    let mutate_url = url.clone();
    let mutate = move || {
        let _ = mutate_inner.merger.merge_head(&mutate_document, &mutate_new);
        let _ = mutate_inner.merger.replace_body(&mutate_document, &mutate_new);
        mutate_inner
            .scroll
            .handle_scroll(&mutate_document, &mutate_url, &previous_url);
        events::emit_simple(
            &mutate_document,
            events::AFTER_SWAP,
            &mutate_url.href(),
            direction,
        );
    };

    inner
        .transitions
        .transition(&document, mutate)
        .await
        .map_err(|_| "transition failed")?;

    // The initial scan never saw the links in this body.
    if inner.generation.get() == generation
        && let Some(body) = document.body()
    {
        inner.prefetch.observe_new_links(&body);
    }

    schedule_page_load(inner, url, direction, generation);

    Ok(())
}

// `page-load` waits one animation frame so layout and transition state have
// settled before page code runs measurements.
fn schedule_page_load(inner: &Rc<GlideInner>, url: &Url, direction: Direction, generation: u64) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let frame_inner = inner.clone();
    let href = url.href();
    let callback = Closure::once_into_js(move || {
        if frame_inner.generation.get() != generation {
            return;
        }
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        events::emit_simple(&document, events::PAGE_LOAD, &href, direction);
    });

    let _ = window.request_animation_frame(callback.unchecked_ref());
}

fn full_navigation(url: &Url) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let _ = window.location().assign(&url.href());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_click(href: &str) -> ClickFacts {
        ClickFacts {
            modifier: false,
            primary: true,
            target: None,
            download: false,
            reload_opt_out: false,
            href: Some(href.to_owned()),
        }
    }

    #[test]
    fn test_plain_same_origin_click_is_intercepted() {
        assert!(should_intercept(&plain_click("/blog/post")));
        assert!(should_intercept(&plain_click("/blog/post#comments")));
    }

    #[test]
    fn test_modifier_and_non_primary_clicks_pass_through() {
        let mut facts = plain_click("/a");
        facts.modifier = true;
        assert!(!should_intercept(&facts));

        let mut facts = plain_click("/a");
        facts.primary = false;
        assert!(!should_intercept(&facts));
    }

    #[test]
    fn test_target_other_than_self_passes_through() {
        let mut facts = plain_click("/a");
        facts.target = Some("_blank".to_owned());
        assert!(!should_intercept(&facts));

        facts.target = Some("_self".to_owned());
        assert!(should_intercept(&facts));

        // an empty target attribute behaves like no target at all
        facts.target = Some(String::new());
        assert!(should_intercept(&facts));
    }

    #[test]
    fn test_download_and_reload_opt_out_pass_through() {
        let mut facts = plain_click("/a");
        facts.download = true;
        assert!(!should_intercept(&facts));

        let mut facts = plain_click("/a");
        facts.reload_opt_out = true;
        assert!(!should_intercept(&facts));
    }

    #[test]
    fn test_degenerate_hrefs_pass_through() {
        assert!(!should_intercept(&plain_click("")));
        assert!(!should_intercept(&plain_click("#section")));
        assert!(!should_intercept(&plain_click("javascript:void(0)")));

        let mut facts = plain_click("/a");
        facts.href = None;
        assert!(!should_intercept(&facts));
    }
}
