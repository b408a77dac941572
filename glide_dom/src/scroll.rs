//! Scroll position handling after a body swap.

use serde::Deserialize;
use web_sys::{Document, ScrollBehavior, ScrollIntoViewOptions, ScrollToOptions, Url};

/// What to do with the scroll position once the new body is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollMode {
    /// Keep the current position untouched.
    Preserve,
    /// Always return to the origin.
    Top,
    /// Return to the origin only when the pathname changed; same-page
    /// navigations (query-only changes) keep their position.
    #[default]
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScrollAction {
    None,
    ToTop,
    ToFragment(String),
}

// A fragment always wins over the configured mode.
pub(crate) fn decide_scroll(
    mode: ScrollMode,
    pathname_changed: bool,
    fragment: Option<&str>,
) -> ScrollAction {
    if let Some(fragment) = fragment
        && !fragment.is_empty()
    {
        return ScrollAction::ToFragment(fragment.to_owned());
    }

    match mode {
        ScrollMode::Preserve => ScrollAction::None,
        ScrollMode::Top => ScrollAction::ToTop,
        ScrollMode::Auto => {
            if pathname_changed {
                ScrollAction::ToTop
            } else {
                ScrollAction::None
            }
        }
    }
}

/// Applies the configured scroll behavior after a swap.
#[derive(Debug, Clone, Copy)]
pub struct ScrollCoordinator {
    mode: ScrollMode,
    smooth: bool,
}

impl ScrollCoordinator {
    pub fn new(mode: ScrollMode, smooth: bool) -> Self {
        Self { mode, smooth }
    }

    /// Decide and apply the scroll position for a finished navigation.
    pub fn handle_scroll(&self, document: &Document, new_url: &Url, previous_url: &Url) {
        let hash = new_url.hash();
        let fragment = hash.strip_prefix('#').filter(|f| !f.is_empty());
        let pathname_changed = new_url.pathname() != previous_url.pathname();

        match decide_scroll(self.mode, pathname_changed, fragment) {
            ScrollAction::None => {}
            ScrollAction::ToTop => self.scroll_to_top(),
            ScrollAction::ToFragment(id) => {
                // A missing anchor target scrolls nowhere, matching what the
                // browser does for an unknown fragment.
                if let Some(el) = document.get_element_by_id(&id) {
                    let options = ScrollIntoViewOptions::new();
                    options.set_behavior(self.behavior());
                    el.scroll_into_view_with_scroll_into_view_options(&options);
                }
            }
        }
    }

    fn scroll_to_top(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };

        let options = ScrollToOptions::new();
        options.set_top(0.0);
        options.set_left(0.0);
        options.set_behavior(self.behavior());
        window.scroll_to_with_scroll_to_options(&options);
    }

    fn behavior(&self) -> ScrollBehavior {
        if self.smooth {
            ScrollBehavior::Smooth
        } else {
            ScrollBehavior::Auto
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_wins_over_every_mode() {
        for mode in [ScrollMode::Preserve, ScrollMode::Top, ScrollMode::Auto] {
            assert_eq!(
                decide_scroll(mode, true, Some("section")),
                ScrollAction::ToFragment("section".to_owned())
            );
        }
    }

    #[test]
    fn test_preserve_never_scrolls() {
        assert_eq!(decide_scroll(ScrollMode::Preserve, true, None), ScrollAction::None);
        assert_eq!(decide_scroll(ScrollMode::Preserve, false, None), ScrollAction::None);
    }

    #[test]
    fn test_top_always_scrolls() {
        assert_eq!(decide_scroll(ScrollMode::Top, false, None), ScrollAction::ToTop);
        assert_eq!(decide_scroll(ScrollMode::Top, true, None), ScrollAction::ToTop);
    }

    #[test]
    fn test_auto_scrolls_only_on_path_change() {
        assert_eq!(decide_scroll(ScrollMode::Auto, true, None), ScrollAction::ToTop);
        assert_eq!(decide_scroll(ScrollMode::Auto, false, None), ScrollAction::None);
    }

    #[test]
    fn test_empty_fragment_falls_through() {
        assert_eq!(decide_scroll(ScrollMode::Auto, false, Some("")), ScrollAction::None);
    }
}
