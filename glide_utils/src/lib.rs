#![allow(missing_docs)]

// String-level helpers shared by the navigation and prefetch crates. Nothing
// in here touches the DOM, so everything is unit-testable on any target.

/// True when an href would not leave the current document: empty string or a
/// bare fragment like `#section`.
pub fn is_hash_only(href: &str) -> bool {
    let href = href.trim();
    href.is_empty() || href.starts_with('#')
}

/// True for href schemes the engine never intercepts (`javascript:`,
/// `mailto:`, `tel:`). Scheme comparison is case-insensitive per RFC 3986.
pub fn is_unsupported_scheme(href: &str) -> bool {
    let href = href.trim();
    let Some((scheme, _)) = href.split_once(':') else {
        return false;
    };

    if scheme.contains('/') {
        // A '/' before the first ':' means the colon belongs to the path or
        // query ("/search?q=a:b"), not to a scheme.
        return false;
    }

    matches!(
        scheme.to_ascii_lowercase().as_str(),
        "javascript" | "mailto" | "tel"
    )
}

/// Split a URL into its non-fragment part and an optional fragment.
pub fn split_fragment(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((base, "")) => (base, None),
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    }
}

/// Parse a millisecond delay attribute value ("120", "120ms") into a number.
/// Returns `None` for anything that does not parse cleanly.
pub fn parse_delay_ms(value: &str) -> Option<u32> {
    let value = value.trim();
    let value = value.strip_suffix("ms").unwrap_or(value);
    value.trim().parse::<u32>().ok()
}

/// Sanitize a user-supplied transition name into a CSS custom identifier.
/// Anything outside `[a-zA-Z0-9_-]` is replaced so injected rules can never
/// break out of their selector.
pub fn css_ident(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_only_hrefs() {
        assert!(is_hash_only(""));
        assert!(is_hash_only("#"));
        assert!(is_hash_only("#section"));
        assert!(is_hash_only("  #top  "));
        assert!(!is_hash_only("/about"));
        assert!(!is_hash_only("/about#team"));
    }

    #[test]
    fn test_unsupported_schemes() {
        assert!(is_unsupported_scheme("javascript:void(0)"));
        assert!(is_unsupported_scheme("JavaScript:alert(1)"));
        assert!(is_unsupported_scheme("mailto:hi@example.com"));
        assert!(is_unsupported_scheme("tel:+123456"));
        assert!(!is_unsupported_scheme("/blog/post"));
        assert!(!is_unsupported_scheme("https://example.com"));
        assert!(!is_unsupported_scheme("/search?q=a:b"));
    }

    #[test]
    fn test_split_fragment() {
        assert_eq!(split_fragment("/a#b"), ("/a", Some("b")));
        assert_eq!(split_fragment("/a"), ("/a", None));
        assert_eq!(split_fragment("/a#"), ("/a", None));
        assert_eq!(
            split_fragment("https://x.test/p#frag"),
            ("https://x.test/p", Some("frag"))
        );
    }

    #[test]
    fn test_parse_delay() {
        assert_eq!(parse_delay_ms("120"), Some(120));
        assert_eq!(parse_delay_ms("120ms"), Some(120));
        assert_eq!(parse_delay_ms(" 80 "), Some(80));
        assert_eq!(parse_delay_ms("fast"), None);
        assert_eq!(parse_delay_ms("-5"), None);
    }

    #[test]
    fn test_css_ident() {
        assert_eq!(css_ident("hero-image"), "hero-image");
        assert_eq!(css_ident("hero image"), "hero-image");
        assert_eq!(css_ident("a{b}"), "a-b-");
    }
}
