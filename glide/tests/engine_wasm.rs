#![cfg(target_arch = "wasm32")]
#![allow(missing_docs)]

use glide::prelude::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

#[wasm_bindgen_test]
fn test_start_and_stop_are_idempotent() {
    let engine = Glide::new(GlideConfig::default());

    engine.start().expect("start failed");
    engine.start().expect("second start failed");
    engine.stop();
    engine.stop();

    // a stopped engine can come back
    engine.start().expect("restart failed");
    engine.stop();
}

#[wasm_bindgen_test]
fn test_independent_instances_coexist() {
    let first = Glide::new(GlideConfig::default());
    let second = Glide::new(GlideConfig::default());

    first.start().expect("first start failed");
    second.start().expect("second start failed");
    first.stop();
    second.stop();
}

#[wasm_bindgen_test]
fn test_config_script_is_consumed() {
    let document = document();
    let head = document.head().expect("head not found");

    let script = document.create_element("script").unwrap();
    script.set_id("glide-config");
    script.set_attribute("type", "application/json").unwrap();
    script.set_text_content(Some(
        r#"{"scroll": "top", "debug": true, "prefetch": {"strategy": "viewport"}}"#,
    ));
    head.append_child(&script).unwrap();

    let config = GlideConfig::from_document();

    assert_eq!(config.scroll, ScrollMode::Top);
    assert!(config.debug);
    assert_eq!(config.prefetch.strategy, PrefetchStrategy::Viewport);
    // the blob is single-use: the element is gone
    assert!(document.get_element_by_id("glide-config").is_none());

    // and a second read falls back to defaults
    let fallback = GlideConfig::from_document();
    assert_eq!(fallback.scroll, ScrollMode::Auto);
}

#[wasm_bindgen_test]
fn test_missing_config_script_yields_defaults() {
    let config = GlideConfig::from_document();
    assert_eq!(config.link_selector, "a[href]");
    assert!(config.update_history);
}
