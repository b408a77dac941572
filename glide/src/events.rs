//! Lifecycle events dispatched on the document, the same `CustomEvent`
//! channel page code already listens on for everything else.

use std::cell::Cell;
use std::rc::Rc;

use js_sys::{Object, Reflect};
use wasm_bindgen::closure::Closure;
use web_sys::{CustomEvent, CustomEventInit, Document};

/// Fired before the DOM mutates. The detail carries `url`, `direction`, the
/// parsed `newDocument`, and a `reload()` callback that cancels the swap in
/// favor of a full browser navigation.
pub const BEFORE_SWAP: &str = "glide:before-swap";
/// Fired synchronously after the head merge and body swap.
pub const AFTER_SWAP: &str = "glide:after-swap";
/// Fired one animation frame after the swap, once layout has settled.
pub const PAGE_LOAD: &str = "glide:page-load";

/// How a navigation entered the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// A new history entry is pushed.
    Forward,
    /// Browser-driven traversal; history is already updated.
    Back,
    /// The current entry is overwritten.
    Replace,
}

impl Direction {
    /// The wire name used in event payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Back => "back",
            Direction::Replace => "replace",
        }
    }
}

/// Dispatch `glide:before-swap`. Returns `true` when a handler invoked
/// `reload()`, which only counts during the synchronous dispatch; the
/// callback dies with this stack frame.
pub(crate) fn emit_before_swap(
    document: &Document,
    url: &str,
    direction: Direction,
    new_document: &Document,
) -> bool {
    let detail = Object::new();
    let _ = Reflect::set(&detail, &"url".into(), &url.into());
    let _ = Reflect::set(&detail, &"direction".into(), &direction.as_str().into());
    let _ = Reflect::set(&detail, &"newDocument".into(), new_document);

    let reload_requested = Rc::new(Cell::new(false));
    let flag = reload_requested.clone();
    let reload = Closure::wrap(Box::new(move || {
        flag.set(true);
    }) as Box<dyn FnMut()>);
    let _ = Reflect::set(&detail, &"reload".into(), reload.as_ref());

    dispatch(document, BEFORE_SWAP, &detail, true);

    drop(reload);
    reload_requested.get()
}

/// Dispatch `glide:after-swap` or `glide:page-load`.
pub(crate) fn emit_simple(document: &Document, name: &str, url: &str, direction: Direction) {
    let detail = Object::new();
    let _ = Reflect::set(&detail, &"url".into(), &url.into());
    let _ = Reflect::set(&detail, &"direction".into(), &direction.as_str().into());

    dispatch(document, name, &detail, false);
}

fn dispatch(document: &Document, name: &str, detail: &Object, cancelable: bool) {
    let init = CustomEventInit::new();
    init.set_detail(detail);
    init.set_cancelable(cancelable);

    if let Ok(event) = CustomEvent::new_with_event_init_dict(name, &init) {
        let _ = document.dispatch_event(&event);
    }
}
