//! Glide: the client-side navigation engine of a page-based site framework.
//!
//! Glide turns ordinary same-origin links and programmatic calls into
//! single-page-application-style transitions: it fetches the target page's
//! HTML, merges it into the live document without re-downloading stylesheets
//! or re-executing scripts, animates the change with native view transitions
//! when available, and restores scroll, all without a full page reload.
//!
//! ```ignore
//! use glide::prelude::*;
//!
//! let engine = Glide::from_document();
//! engine.start()?;
//! ```
//!
//! Pages opt in and out through data attributes (`data-glide-reload`,
//! `data-glide-prefetch`, `data-glide-transition`, …); page scripts observe
//! the engine through `glide:before-swap` / `glide:after-swap` /
//! `glide:page-load` events on the document.

pub use js_sys;
pub use wasm_bindgen;
pub use web_sys;

pub mod config;
pub mod controller;
pub mod events;
mod log;
pub mod prelude;

pub use config::GlideConfig;
pub use controller::{Glide, NavigateOptions};
pub use events::Direction;

/// Route panics to the console during development.
#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}
