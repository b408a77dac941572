#![cfg(target_arch = "wasm32")]
#![allow(missing_docs)]

use std::cell::Cell;
use std::rc::Rc;

use glide_dom::TransitionCoordinator;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
async fn test_disabled_coordinator_still_runs_the_mutation() {
    let document = web_sys::window().unwrap().document().unwrap();

    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();

    let coordinator = TransitionCoordinator::new(false);
    coordinator
        .transition(&document, move || flag.set(true))
        .await
        .expect("transition failed");

    assert!(ran.get());
}

#[wasm_bindgen_test]
async fn test_transition_runs_mutation_with_or_without_native_support() {
    // Headless test browsers may or may not expose startViewTransition;
    // either way the mutation must run exactly once and no transition state
    // may leak into the document afterwards.
    let document = web_sys::window().unwrap().document().unwrap();

    let count = Rc::new(Cell::new(0u32));
    let counter = count.clone();

    let coordinator = TransitionCoordinator::new(true);
    coordinator
        .transition(&document, move || counter.set(counter.get() + 1))
        .await
        .expect("transition failed");

    assert_eq!(count.get(), 1);
    assert!(document.get_element_by_id("glide-transition-style").is_none());
}
