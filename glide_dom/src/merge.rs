//! Head merging and body replacement for fetched documents.
//!
//! The merge has one correctness invariant: a stylesheet or script that is
//! already loaded in the live head must never be removed and re-appended,
//! since that would re-download the CSS or re-execute the script on every
//! navigation. Only `<title>` and `<meta>` elements are treated as always
//! stale; everything else is appended only when its URL is new.

use std::collections::HashSet;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, DomParser, Element, HtmlElement, SupportedType};

/// Parses fetched HTML and merges it into the live document.
#[derive(Debug, Clone)]
pub struct DocumentMerger {
    persist_attr: String,
}

impl DocumentMerger {
    /// `persist_attr` marks head elements exempt from the stale-title/meta
    /// cleanup (analytics snippets and the like).
    pub fn new(persist_attr: impl Into<String>) -> Self {
        Self {
            persist_attr: persist_attr.into(),
        }
    }

    /// Parse raw HTML into a detached document.
    pub fn parse(html: &str) -> Result<Document, JsValue> {
        let parser = DomParser::new()?;
        parser.parse_from_string(html, SupportedType::TextHtml)
    }

    /// Merge the incoming head into the live one.
    ///
    /// Live `<title>`/`<meta>` elements are dropped unless they carry the
    /// persistence marker; incoming children are appended unless they are a
    /// stylesheet or script whose URL is already present.
    pub fn merge_head(&self, live: &Document, incoming: &Document) -> Result<(), JsValue> {
        let Some(live_head) = live.head() else {
            return Ok(());
        };
        let Some(new_head) = incoming.head() else {
            return Ok(());
        };

        let existing = head_asset_urls(live);

        let stale = live_head.query_selector_all("title, meta")?;
        for i in 0..stale.length() {
            let Some(node) = stale.item(i) else { continue };
            let Some(el) = node.dyn_ref::<Element>() else {
                continue;
            };
            if el.has_attribute(&self.persist_attr) {
                continue;
            }
            el.remove();
        }

        let children = new_head.children();
        for i in 0..children.length() {
            let Some(el) = children.item(i) else { continue };
            if let Some(url) = asset_url(&el)
                && existing.contains(&url)
            {
                // Already live; leaving it alone is the whole point.
                continue;
            }
            let imported = live.import_node_with_deep(&el, true)?;
            live_head.append_child(&imported)?;
        }

        Ok(())
    }

    /// Replace the live body wholesale with an imported clone of the
    /// incoming one.
    pub fn replace_body(&self, live: &Document, incoming: &Document) -> Result<(), JsValue> {
        let Some(new_body) = incoming.body() else {
            return Ok(());
        };

        let imported = live.import_node_with_deep(&new_body, true)?;
        let imported: HtmlElement = imported.dyn_into()?;
        live.set_body(Some(&imported));

        Ok(())
    }

    /// Inject `<link rel="preload" as="style">` hints for every incoming
    /// stylesheet URL not already present or preloaded, before anything
    /// visible mutates. Returns how many hints were injected.
    pub fn preload_stylesheets(&self, live: &Document, incoming: &Document) -> Result<u32, JsValue> {
        preload_new_styles(live, incoming)
    }
}

/// Shared by the merger (anti-FOUC before a swap) and the prefetch scheduler
/// (warming styles for a page that may be visited next).
pub fn preload_new_styles(live: &Document, incoming: &Document) -> Result<u32, JsValue> {
    let existing = head_asset_urls(live);
    let preloaded = preloaded_style_urls(live);

    let mut injected = 0;
    for href in stylesheet_urls(incoming) {
        if existing.contains(&href) || preloaded.contains(&href) {
            continue;
        }
        inject_preload_hint(live, &href)?;
        injected += 1;
    }

    Ok(injected)
}

/// Append a single stylesheet preload hint to the live head.
pub fn inject_preload_hint(document: &Document, href: &str) -> Result<(), JsValue> {
    let Some(head) = document.head() else {
        return Ok(());
    };

    let link = document.create_element("link")?;
    link.set_attribute("rel", "preload")?;
    link.set_attribute("as", "style")?;
    link.set_attribute("href", href)?;
    head.append_child(&link)?;

    Ok(())
}

/// Stylesheet hrefs and script srcs present anywhere in a document.
pub fn head_asset_urls(document: &Document) -> HashSet<String> {
    let mut urls = HashSet::new();

    let Ok(nodes) = document.query_selector_all("link[rel~=stylesheet][href], script[src]")
    else {
        return urls;
    };

    for i in 0..nodes.length() {
        let Some(node) = nodes.item(i) else { continue };
        let Some(el) = node.dyn_ref::<Element>() else {
            continue;
        };
        if let Some(url) = asset_url(el) {
            urls.insert(url);
        }
    }

    urls
}

/// Stylesheet hrefs of a document, in document order.
pub fn stylesheet_urls(document: &Document) -> Vec<String> {
    let mut urls = Vec::new();

    let Ok(nodes) = document.query_selector_all("link[rel~=stylesheet][href]") else {
        return urls;
    };

    for i in 0..nodes.length() {
        let Some(node) = nodes.item(i) else { continue };
        let Some(el) = node.dyn_ref::<Element>() else {
            continue;
        };
        if let Some(href) = el.get_attribute("href") {
            urls.push(href);
        }
    }

    urls
}

fn preloaded_style_urls(document: &Document) -> HashSet<String> {
    let mut urls = HashSet::new();

    let Ok(nodes) = document.query_selector_all("link[rel=preload][as=style][href]") else {
        return urls;
    };

    for i in 0..nodes.length() {
        let Some(node) = nodes.item(i) else { continue };
        let Some(el) = node.dyn_ref::<Element>() else {
            continue;
        };
        if let Some(href) = el.get_attribute("href") {
            urls.insert(href);
        }
    }

    urls
}

fn asset_url(el: &Element) -> Option<String> {
    asset_key(
        &el.tag_name(),
        el.get_attribute("rel").as_deref(),
        el.get_attribute("href").as_deref(),
        el.get_attribute("src").as_deref(),
    )
}

// The URL under which a head element counts as an already-loaded asset.
// Only stylesheets and external scripts qualify; everything else (inline
// scripts, style blocks, links of other rel kinds) returns None and is
// appended unconditionally by the merge.
fn asset_key(
    tag_name: &str,
    rel: Option<&str>,
    href: Option<&str>,
    src: Option<&str>,
) -> Option<String> {
    match tag_name.to_ascii_uppercase().as_str() {
        "LINK" => {
            let rel = rel?;
            if rel
                .split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("stylesheet"))
            {
                href.map(str::to_owned)
            } else {
                None
            }
        }
        "SCRIPT" => src.map(str::to_owned),
        _ => None,
    }
}
