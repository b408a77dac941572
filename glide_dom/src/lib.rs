//! DOM-side building blocks for the Glide navigation engine.
//!
//! This crate holds the leaves of the engine: parsing and merging fetched
//! documents into the live one, deciding and applying scroll position after a
//! swap, wrapping a DOM mutation in a native view transition, and the shared
//! HTML fetch helper. The orchestration lives in the `glide` crate.

pub mod http;
pub mod merge;
pub mod scroll;
pub mod transition;

pub use http::{FetchError, FetchPriority, fetch_document};
pub use merge::DocumentMerger;
pub use scroll::{ScrollCoordinator, ScrollMode};
pub use transition::TransitionCoordinator;
