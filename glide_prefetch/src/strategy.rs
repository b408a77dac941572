//! Prefetch strategy model: the global configuration tiers and the per-link
//! attribute overrides that refine them.

use serde::Deserialize;

/// Attribute selecting a per-link strategy tier
/// (`eager` | `viewport` | `hover` | `intent` | `false`).
pub const STRATEGY_ATTR: &str = "data-glide-prefetch";
/// Attribute overriding the hover-intent delay for one link, in milliseconds.
pub const DELAY_ATTR: &str = "data-glide-prefetch-delay";

/// Globally configured prefetch strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefetchStrategy {
    /// Fetch once the link scrolls near the viewport.
    Viewport,
    /// Fetch after the pointer or focus rests on the link.
    #[default]
    Hover,
    /// Viewport-eligible plus hover-prioritized: visibility schedules a
    /// low-priority fetch, hover upgrades to a normal-priority one.
    Intent,
}

/// Effective tier for one link after applying its attribute override.
/// `Eager` exists only as a per-link override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkTier {
    Eager,
    Viewport,
    Hover,
    Intent,
    Disabled,
}

impl LinkTier {
    pub(crate) fn wants_viewport(self) -> bool {
        matches!(self, LinkTier::Viewport | LinkTier::Intent)
    }

    pub(crate) fn wants_hover(self) -> bool {
        matches!(self, LinkTier::Hover | LinkTier::Intent)
    }
}

/// An explicit per-link override always wins over the global strategy;
/// anything unrecognized falls back to it.
pub(crate) fn resolve_tier(global: PrefetchStrategy, attr: Option<&str>) -> LinkTier {
    match attr.map(str::trim) {
        Some("eager") => LinkTier::Eager,
        Some("viewport") => LinkTier::Viewport,
        Some("hover") => LinkTier::Hover,
        Some("intent") => LinkTier::Intent,
        Some("false") => LinkTier::Disabled,
        _ => match global {
            PrefetchStrategy::Viewport => LinkTier::Viewport,
            PrefetchStrategy::Hover => LinkTier::Hover,
            PrefetchStrategy::Intent => LinkTier::Intent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_beats_global() {
        assert_eq!(
            resolve_tier(PrefetchStrategy::Hover, Some("viewport")),
            LinkTier::Viewport
        );
        assert_eq!(
            resolve_tier(PrefetchStrategy::Viewport, Some("eager")),
            LinkTier::Eager
        );
        assert_eq!(
            resolve_tier(PrefetchStrategy::Intent, Some("false")),
            LinkTier::Disabled
        );
    }

    #[test]
    fn test_missing_or_unknown_attr_falls_back() {
        assert_eq!(resolve_tier(PrefetchStrategy::Hover, None), LinkTier::Hover);
        assert_eq!(
            resolve_tier(PrefetchStrategy::Viewport, Some("soon")),
            LinkTier::Viewport
        );
        assert_eq!(
            resolve_tier(PrefetchStrategy::Intent, None),
            LinkTier::Intent
        );
    }

    #[test]
    fn test_intent_listens_on_both_signals() {
        let tier = resolve_tier(PrefetchStrategy::Intent, None);
        assert!(tier.wants_viewport());
        assert!(tier.wants_hover());

        let hover = resolve_tier(PrefetchStrategy::Hover, None);
        assert!(!hover.wants_viewport());
        assert!(hover.wants_hover());

        let viewport = resolve_tier(PrefetchStrategy::Viewport, None);
        assert!(viewport.wants_viewport());
        assert!(!viewport.wants_hover());
    }

    #[test]
    fn test_eager_and_disabled_listen_on_nothing() {
        for tier in [LinkTier::Eager, LinkTier::Disabled] {
            assert!(!tier.wants_viewport());
            assert!(!tier.wants_hover());
        }
    }
}
