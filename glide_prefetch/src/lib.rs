//! Link prefetching for the Glide navigation engine.
//!
//! The scheduler watches eligible same-origin links and fetches their HTML
//! ahead of a click, according to a global strategy (`viewport`, `hover`,
//! `intent`) refined by per-link attribute overrides (including an `eager`
//! tier). Fetched HTML lands in a single-consume cache the navigation
//! controller pops on the next visit; the stylesheets of a fetched page are
//! preloaded into the live head so a later swap does not flash unstyled.

mod cache;
mod strategy;

pub use strategy::{DELAY_ATTR, PrefetchStrategy, STRATEGY_ATTR};

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use js_sys::{Function, Reflect};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Element, Event, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, Url,
};

use cache::{AttemptedSet, PrefetchCache};
use glide_dom::{DocumentMerger, FetchPriority, fetch_document, merge};
use strategy::{LinkTier, resolve_tier};

// Links start fetching a little before they actually enter the viewport.
const VIEWPORT_ROOT_MARGIN: &str = "64px";

/// Prefetch configuration, deserializable from the build-pipeline-injected
/// JSON config blob.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrefetchConfig {
    /// Global strategy applied to links without an explicit override.
    pub strategy: PrefetchStrategy,
    /// Hover/focus dwell time before a prefetch is issued, in milliseconds.
    pub hover_delay_ms: u32,
    /// Attribute whose presence opts a link out of prefetching entirely.
    pub opt_out_attr: String,
    /// When true, a data-saver or 2g-class connection disables prefetching.
    pub respect_data_saver: bool,
    /// Selector identifying prefetchable links.
    pub link_selector: String,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            strategy: PrefetchStrategy::default(),
            hover_delay_ms: 80,
            opt_out_attr: "data-glide-noprefetch".to_owned(),
            respect_data_saver: true,
            link_selector: "a[href]".to_owned(),
        }
    }
}

struct TimerHandle {
    id: i32,
    _closure: Closure<dyn FnMut()>,
}

struct HoverListeners {
    enter: Closure<dyn FnMut(Event)>,
    leave: Closure<dyn FnMut(Event)>,
}

struct SchedulerInner {
    config: PrefetchConfig,
    cache: RefCell<PrefetchCache>,
    attempted: RefCell<AttemptedSet>,
    timers: RefCell<HashMap<String, TimerHandle>>,
    observer: RefCell<Option<IntersectionObserver>>,
    observer_callback: RefCell<Option<Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>>>,
    hover_listeners: RefCell<Option<HoverListeners>>,
    started: Cell<bool>,
}

/// Decides when to fetch a link's HTML ahead of a click, caches it once, and
/// preloads its stylesheets.
///
/// All listeners and timers are owned by the instance: created in [`start`],
/// torn down in [`stop`], never global.
///
/// [`start`]: PrefetchScheduler::start
/// [`stop`]: PrefetchScheduler::stop
pub struct PrefetchScheduler {
    inner: Rc<SchedulerInner>,
}

impl PrefetchScheduler {
    pub fn new(config: PrefetchConfig) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                config,
                cache: RefCell::new(PrefetchCache::default()),
                attempted: RefCell::new(AttemptedSet::default()),
                timers: RefCell::new(HashMap::new()),
                observer: RefCell::new(None),
                observer_callback: RefCell::new(None),
                hover_listeners: RefCell::new(None),
                started: Cell::new(false),
            }),
        }
    }

    /// Scan the document and begin watching eligible links. Idempotent.
    pub fn start(&self) {
        if self.inner.started.get() {
            return;
        }
        self.inner.started.set(true);

        let Some(document) = live_document() else {
            return;
        };
        let Some(root) = document.document_element() else {
            return;
        };

        scan(&self.inner, &root);
    }

    /// Disconnect the viewport observer, cancel every pending hover timer,
    /// and detach the delegated listeners. Idempotent.
    pub fn stop(&self) {
        if !self.inner.started.get() {
            return;
        }
        self.inner.started.set(false);

        if let Some(observer) = self.inner.observer.borrow_mut().take() {
            observer.disconnect();
        }
        self.inner.observer_callback.borrow_mut().take();

        if let Some(window) = web_sys::window() {
            for (_, handle) in self.inner.timers.borrow_mut().drain() {
                window.clear_timeout_with_handle(handle.id);
            }

            if let Some(listeners) = self.inner.hover_listeners.borrow_mut().take()
                && let Some(document) = window.document()
            {
                let enter = listeners.enter.as_ref().unchecked_ref();
                let leave = listeners.leave.as_ref().unchecked_ref();
                let _ = document.remove_event_listener_with_callback("mouseover", enter);
                let _ = document.remove_event_listener_with_callback("focusin", enter);
                let _ = document.remove_event_listener_with_callback("mouseout", leave);
                let _ = document.remove_event_listener_with_callback("focusout", leave);
            }
        }
    }

    /// Re-scan a subtree for eligible links, typically the document after a
    /// swap, since the initial scan never saw the new body.
    pub fn observe_new_links(&self, root: &Element) {
        if !self.inner.started.get() {
            return;
        }
        scan(&self.inner, root);
    }

    /// Prefetch a URL right now (low priority). Cross-origin and
    /// already-attempted URLs are a no-op.
    pub fn prefetch(&self, url: &str) {
        let Some(url) = normalize_same_origin(url) else {
            return;
        };
        start_prefetch(&self.inner, url, FetchPriority::Low);
    }

    /// Pop the cached HTML for a URL: returns it on the first call and `None`
    /// afterwards, until the URL is prefetched again. Consumption also clears
    /// the attempted marker so a fresh prefetch of the same URL is allowed.
    pub fn get_cached_html(&self, url: &str) -> Option<String> {
        let key = normalize_same_origin(url)?;
        let html = self.inner.cache.borrow_mut().take(&key)?;
        self.inner.attempted.borrow_mut().unmark(&key);
        Some(html)
    }

    /// False when the connection asks us not to burn bandwidth: data-saver
    /// mode or a 2g-class effective type, if configured to be respected.
    pub fn should_prefetch(&self) -> bool {
        connection_allows_prefetch(&self.inner.config)
    }
}

impl fmt::Debug for PrefetchScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefetchScheduler")
            .field("config", &self.inner.config)
            .field("started", &self.inner.started.get())
            .finish()
    }
}

// ---- scanning -------------------------------------------------------------

fn scan(inner: &Rc<SchedulerInner>, root: &Element) {
    let Ok(nodes) = root.query_selector_all(&inner.config.link_selector) else {
        return;
    };

    for i in 0..nodes.length() {
        let Some(node) = nodes.item(i) else { continue };
        let Some(el) = node.dyn_ref::<Element>() else {
            continue;
        };

        let Some(url) = eligible_url(inner, el) else {
            continue;
        };

        let tier = resolve_tier(inner.config.strategy, el.get_attribute(STRATEGY_ATTR).as_deref());

        if tier == LinkTier::Eager {
            schedule_eager(inner, url);
            continue;
        }

        if tier.wants_viewport() {
            ensure_observer(inner);
            if let Some(observer) = current_observer(inner) {
                observer.observe(el);
            }
        }

        if tier.wants_hover() {
            ensure_hover_listeners(inner);
        }
    }
}

fn current_observer(inner: &Rc<SchedulerInner>) -> Option<IntersectionObserver> {
    inner.observer.borrow().clone()
}

// A link is eligible when it is not opted out and resolves to a same-origin
// URL the engine could actually navigate to. Returns the absolute,
// fragment-stripped URL used as the cache key.
fn eligible_url(inner: &Rc<SchedulerInner>, el: &Element) -> Option<String> {
    if el.has_attribute(&inner.config.opt_out_attr) {
        return None;
    }
    if resolve_tier(inner.config.strategy, el.get_attribute(STRATEGY_ATTR).as_deref())
        == LinkTier::Disabled
    {
        return None;
    }

    let href = el.get_attribute("href")?;
    if glide_utils::is_hash_only(&href) || glide_utils::is_unsupported_scheme(&href) {
        return None;
    }

    normalize_same_origin(&href)
}

fn normalize_same_origin(href: &str) -> Option<String> {
    let window = web_sys::window()?;
    let location = window.location();
    let base = location.href().ok()?;

    let url = Url::new_with_base(href, &base).ok()?;
    if url.origin() != location.origin().ok()? {
        return None;
    }

    url.set_hash("");
    Some(url.href())
}

fn live_document() -> Option<Document> {
    web_sys::window()?.document()
}

// ---- viewport strategy ----------------------------------------------------

fn ensure_observer(inner: &Rc<SchedulerInner>) {
    if inner.observer.borrow().is_some() {
        return;
    }

    let callback_inner = inner.clone();
    let callback = Closure::wrap(Box::new(
        move |entries: js_sys::Array, observer: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                if !entry.is_intersecting() {
                    continue;
                }

                let el = entry.target();
                observer.unobserve(&el);

                if let Some(url) = eligible_url(&callback_inner, &el) {
                    start_prefetch(&callback_inner, url, FetchPriority::Low);
                }
            }
        },
    )
        as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

    let options = IntersectionObserverInit::new();
    options.set_root_margin(VIEWPORT_ROOT_MARGIN);

    let Ok(observer) =
        IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)
    else {
        return;
    };

    *inner.observer.borrow_mut() = Some(observer);
    *inner.observer_callback.borrow_mut() = Some(callback);
}

// ---- hover / focus strategy -----------------------------------------------

fn ensure_hover_listeners(inner: &Rc<SchedulerInner>) {
    if inner.hover_listeners.borrow().is_some() {
        return;
    }
    let Some(document) = live_document() else {
        return;
    };

    let enter_inner = inner.clone();
    let enter = Closure::wrap(Box::new(move |event: Event| {
        on_pointer_enter(&enter_inner, &event);
    }) as Box<dyn FnMut(Event)>);

    let leave_inner = inner.clone();
    let leave = Closure::wrap(Box::new(move |event: Event| {
        on_pointer_leave(&leave_inner, &event);
    }) as Box<dyn FnMut(Event)>);

    let enter_fn = enter.as_ref().unchecked_ref();
    let leave_fn = leave.as_ref().unchecked_ref();
    let _ = document.add_event_listener_with_callback("mouseover", enter_fn);
    let _ = document.add_event_listener_with_callback("focusin", enter_fn);
    let _ = document.add_event_listener_with_callback("mouseout", leave_fn);
    let _ = document.add_event_listener_with_callback("focusout", leave_fn);

    *inner.hover_listeners.borrow_mut() = Some(HoverListeners { enter, leave });
}

fn anchor_of(inner: &Rc<SchedulerInner>, event: &Event) -> Option<Element> {
    let target = event.target()?;
    let el = target.dyn_ref::<Element>()?.clone();
    el.closest(&inner.config.link_selector).ok()?
}

fn on_pointer_enter(inner: &Rc<SchedulerInner>, event: &Event) {
    let Some(anchor) = anchor_of(inner, event) else {
        return;
    };

    let tier = resolve_tier(
        inner.config.strategy,
        anchor.get_attribute(STRATEGY_ATTR).as_deref(),
    );
    if !tier.wants_hover() {
        return;
    }

    let Some(url) = eligible_url(inner, &anchor) else {
        return;
    };

    if inner.attempted.borrow().contains(&url) {
        return;
    }
    // Never more than one pending timer per href.
    if inner.timers.borrow().contains_key(&url) {
        return;
    }

    let delay = anchor
        .get_attribute(DELAY_ATTR)
        .as_deref()
        .and_then(glide_utils::parse_delay_ms)
        .unwrap_or(inner.config.hover_delay_ms);

    schedule_hover_timer(inner, url, delay);
}

fn on_pointer_leave(inner: &Rc<SchedulerInner>, event: &Event) {
    let Some(anchor) = anchor_of(inner, event) else {
        return;
    };

    // Moving between children of the same link is not an exit.
    if let Ok(related) = Reflect::get(event, &"relatedTarget".into())
        && let Some(related_el) = related.dyn_ref::<Element>()
        && let Ok(Some(related_anchor)) = related_el.closest(&inner.config.link_selector)
        && related_anchor == anchor
    {
        return;
    }

    let Some(url) = eligible_url(inner, &anchor) else {
        return;
    };

    if let Some(handle) = inner.timers.borrow_mut().remove(&url)
        && let Some(window) = web_sys::window()
    {
        window.clear_timeout_with_handle(handle.id);
    }
}

fn schedule_hover_timer(inner: &Rc<SchedulerInner>, url: String, delay_ms: u32) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let timer_inner = inner.clone();
    let timer_url = url.clone();
    let closure = Closure::wrap(Box::new(move || {
        timer_inner.timers.borrow_mut().remove(&timer_url);
        // A dwelled-on link is a high-confidence signal; do not deprioritize.
        start_prefetch(&timer_inner, timer_url.clone(), FetchPriority::Auto);
    }) as Box<dyn FnMut()>);

    let Ok(id) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        closure.as_ref().unchecked_ref(),
        delay_ms as i32,
    ) else {
        return;
    };

    inner
        .timers
        .borrow_mut()
        .insert(url, TimerHandle { id, _closure: closure });
}

// ---- eager tier -----------------------------------------------------------

fn schedule_eager(inner: &Rc<SchedulerInner>, url: String) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let idle = Reflect::get(&window, &"requestIdleCallback".into())
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok());

    match idle {
        Some(request_idle) => {
            let idle_inner = inner.clone();
            let callback = Closure::once_into_js(move || {
                start_prefetch(&idle_inner, url, FetchPriority::Low);
            });
            let _ = request_idle.call1(&window, &callback);
        }
        None => start_prefetch(inner, url, FetchPriority::Low),
    }
}

// ---- the fetch itself -----------------------------------------------------

fn start_prefetch(inner: &Rc<SchedulerInner>, url: String, priority: FetchPriority) {
    if !connection_allows_prefetch(&inner.config) {
        return;
    }

    if !inner.attempted.borrow_mut().mark(&url) {
        return;
    }

    let task_inner = inner.clone();
    spawn_local(async move {
        match fetch_document(&url, None, priority).await {
            Ok(html) => {
                // Warm the fetched page's stylesheets before the visit.
                if let Some(live) = live_document()
                    && let Ok(incoming) = DocumentMerger::parse(&html)
                {
                    let _ = merge::preload_new_styles(&live, &incoming);
                }
                task_inner.cache.borrow_mut().insert(url, html);
            }
            Err(err) => {
                // Retry stays possible; a prefetch failure is never surfaced.
                task_inner.attempted.borrow_mut().unmark(&url);
                web_sys::console::warn_1(
                    &format!("glide: prefetch of {url} failed: {err}").into(),
                );
            }
        }
    });
}

fn connection_allows_prefetch(config: &PrefetchConfig) -> bool {
    if !config.respect_data_saver {
        return true;
    }
    let Some(window) = web_sys::window() else {
        return false;
    };

    let navigator = window.navigator();
    let Ok(connection) = Reflect::get(&navigator, &"connection".into()) else {
        return true;
    };
    if connection.is_undefined() || connection.is_null() {
        return true;
    }

    let save_data = Reflect::get(&connection, &"saveData".into())
        .ok()
        .and_then(|value| value.as_bool())
        .unwrap_or(false);
    if save_data {
        return false;
    }

    let effective_type = Reflect::get(&connection, &"effectiveType".into())
        .ok()
        .and_then(|value| value.as_string())
        .unwrap_or_default();

    !effective_type.contains("2g")
}
