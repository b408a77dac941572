//! Everything an embedding page script usually needs.

pub use crate::config::GlideConfig;
pub use crate::controller::{Glide, NavigateOptions};
pub use crate::events::{AFTER_SWAP, BEFORE_SWAP, Direction, PAGE_LOAD};
pub use glide_dom::ScrollMode;
pub use glide_prefetch::{PrefetchConfig, PrefetchStrategy};
pub use wasm_bindgen::JsCast;
