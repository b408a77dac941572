#![cfg(target_arch = "wasm32")]
#![allow(missing_docs)]

use glide_prefetch::{PrefetchConfig, PrefetchScheduler};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_start_and_stop_are_idempotent() {
    let scheduler = PrefetchScheduler::new(PrefetchConfig::default());

    scheduler.start();
    scheduler.start();
    scheduler.stop();
    scheduler.stop();

    // a stopped scheduler can start again
    scheduler.start();
    scheduler.stop();
}

#[wasm_bindgen_test]
fn test_cache_miss_returns_none() {
    let scheduler = PrefetchScheduler::new(PrefetchConfig::default());
    assert!(scheduler.get_cached_html("/never-prefetched").is_none());
}

#[wasm_bindgen_test]
fn test_cross_origin_prefetch_is_a_no_op() {
    let scheduler = PrefetchScheduler::new(PrefetchConfig::default());
    // must not panic, must not cache anything
    scheduler.prefetch("https://cross-origin.invalid/page");
    assert!(
        scheduler
            .get_cached_html("https://cross-origin.invalid/page")
            .is_none()
    );
}

#[wasm_bindgen_test]
fn test_independent_instances_coexist() {
    let first = PrefetchScheduler::new(PrefetchConfig::default());
    let second = PrefetchScheduler::new(PrefetchConfig::default());

    first.start();
    second.start();
    first.stop();
    // stopping one instance must not detach the other
    second.stop();
}
