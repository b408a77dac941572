#![cfg(target_arch = "wasm32")]
#![allow(missing_docs)]

use glide_dom::merge::{self, DocumentMerger};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn parse(html: &str) -> web_sys::Document {
    DocumentMerger::parse(html).expect("parse failed")
}

#[wasm_bindgen_test]
fn test_parse_produces_detached_document() {
    let doc = parse("<html><head><title>Hi</title></head><body><div id=\"content\">Post</div></body></html>");

    let body = doc.body().expect("body not found");
    assert!(body.inner_html().contains("Post"));
    assert_eq!(doc.title(), "Hi");
}

#[wasm_bindgen_test]
fn test_merge_head_keeps_live_assets_in_place() {
    let live = parse(
        "<html><head><title>Old</title>\
         <link rel=\"stylesheet\" href=\"/site.css\">\
         <script src=\"/app.js\"></script>\
         </head><body></body></html>",
    );
    let incoming = parse(
        "<html><head><title>New</title>\
         <link rel=\"stylesheet\" href=\"/site.css\">\
         <script src=\"/app.js\"></script>\
         </head><body></body></html>",
    );

    let live_link = live
        .query_selector("link[href='/site.css']")
        .unwrap()
        .expect("live stylesheet missing");

    let merger = DocumentMerger::new("data-glide-persist");
    merger.merge_head(&live, &incoming).expect("merge failed");

    // still exactly one stylesheet and one script, and the stylesheet is the
    // very same element, not a remove-then-reappend clone
    let links = live.query_selector_all("link[href='/site.css']").unwrap();
    assert_eq!(links.length(), 1);
    let after = live
        .query_selector("link[href='/site.css']")
        .unwrap()
        .expect("stylesheet gone after merge");
    assert_eq!(after, live_link);

    let scripts = live.query_selector_all("script[src='/app.js']").unwrap();
    assert_eq!(scripts.length(), 1);

    // titles are always stale
    assert_eq!(live.title(), "New");
}

#[wasm_bindgen_test]
fn test_merge_head_appends_new_assets_only() {
    let live = parse(
        "<html><head><link rel=\"stylesheet\" href=\"/site.css\"></head><body></body></html>",
    );
    let incoming = parse(
        "<html><head>\
         <link rel=\"stylesheet\" href=\"/site.css\">\
         <link rel=\"stylesheet\" href=\"/extra.css\">\
         </head><body></body></html>",
    );

    let merger = DocumentMerger::new("data-glide-persist");
    merger.merge_head(&live, &incoming).expect("merge failed");

    assert_eq!(
        live.query_selector_all("link[rel=stylesheet]").unwrap().length(),
        2
    );
    assert!(
        live.query_selector("link[href='/extra.css']")
            .unwrap()
            .is_some()
    );
}

#[wasm_bindgen_test]
fn test_merge_head_honors_persistence_marker() {
    let live = parse(
        "<html><head>\
         <meta name=\"tracker\" content=\"keep\" data-glide-persist>\
         <meta name=\"description\" content=\"stale\">\
         </head><body></body></html>",
    );
    let incoming = parse("<html><head><title>T</title></head><body></body></html>");

    let merger = DocumentMerger::new("data-glide-persist");
    merger.merge_head(&live, &incoming).expect("merge failed");

    assert!(live.query_selector("meta[name=tracker]").unwrap().is_some());
    assert!(live.query_selector("meta[name=description]").unwrap().is_none());
}

#[wasm_bindgen_test]
fn test_replace_body_swaps_wholesale() {
    let live = parse("<html><head></head><body><main>old</main></body></html>");
    let incoming = parse("<html><head></head><body><div id=\"content\">Post</div></body></html>");

    let merger = DocumentMerger::new("data-glide-persist");
    merger.replace_body(&live, &incoming).expect("swap failed");

    let body = live.body().expect("body not found");
    assert!(body.inner_html().contains("Post"));
    assert!(!body.inner_html().contains("old"));
}

#[wasm_bindgen_test]
fn test_preload_hints_are_injected_once() {
    let live = parse(
        "<html><head><link rel=\"stylesheet\" href=\"/site.css\"></head><body></body></html>",
    );
    let incoming = parse(
        "<html><head>\
         <link rel=\"stylesheet\" href=\"/site.css\">\
         <link rel=\"stylesheet\" href=\"/new.css\">\
         </head><body></body></html>",
    );

    let injected = merge::preload_new_styles(&live, &incoming).expect("preload failed");
    assert_eq!(injected, 1);
    assert!(
        live.query_selector("link[rel=preload][as=style][href='/new.css']")
            .unwrap()
            .is_some()
    );

    // already-preloaded URLs are not hinted again
    let again = merge::preload_new_styles(&live, &incoming).expect("preload failed");
    assert_eq!(again, 0);
    assert_eq!(
        live.query_selector_all("link[rel=preload]").unwrap().length(),
        1
    );
}
