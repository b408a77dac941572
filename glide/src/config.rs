//! Engine configuration, with defaults that work unconfigured and an
//! optional JSON blob injected by the build pipeline.

use serde::Deserialize;

use glide_dom::ScrollMode;
use glide_prefetch::PrefetchConfig;

/// Id of the build-pipeline-injected configuration script element. The blob
/// is consumed on startup and the element removed.
pub const CONFIG_SCRIPT_ID: &str = "glide-config";

/// Everything the navigation engine can be told about its environment.
/// Every field has a documented default; an empty config is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlideConfig {
    /// Selector for interceptable links. Default `a[href]`.
    pub link_selector: String,
    /// Head elements carrying this attribute survive the stale-title/meta
    /// cleanup. Default `data-glide-persist`.
    pub persist_attr: String,
    /// Links carrying this attribute are never intercepted.
    /// Default `data-glide-reload`.
    pub reload_attr: String,
    /// Whether navigations write to browser history. Default `true`.
    pub update_history: bool,
    /// Scroll handling after a swap. Default `auto`.
    pub scroll: ScrollMode,
    /// Use smooth scrolling instead of instant jumps. Default `false`.
    pub smooth_scroll: bool,
    /// Animate swaps with native view transitions when available.
    /// Default `true`.
    pub transitions: bool,
    /// Log navigation decisions to the console. Default `false`.
    pub debug: bool,
    /// Prefetch sub-configuration.
    pub prefetch: PrefetchConfig,
}

impl Default for GlideConfig {
    fn default() -> Self {
        Self {
            link_selector: "a[href]".to_owned(),
            persist_attr: "data-glide-persist".to_owned(),
            reload_attr: "data-glide-reload".to_owned(),
            update_history: true,
            scroll: ScrollMode::default(),
            smooth_scroll: false,
            transitions: true,
            debug: false,
            prefetch: PrefetchConfig::default(),
        }
    }
}

impl GlideConfig {
    /// Read the configuration the build pipeline embedded as
    /// `<script type="application/json" id="glide-config">…</script>`,
    /// merged over the defaults. The script element is removed once read.
    /// Absent or malformed JSON yields the defaults.
    pub fn from_document() -> Self {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return Self::default();
        };
        let Some(script) = document.get_element_by_id(CONFIG_SCRIPT_ID) else {
            return Self::default();
        };

        let text = script.text_content().unwrap_or_default();
        script.remove();

        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(err) => {
                web_sys::console::warn_1(
                    &format!("glide: ignoring malformed config: {err}").into(),
                );
                Self::default()
            }
        }
    }
}
