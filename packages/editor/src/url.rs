//! URL helpers for links

use quire_model::{ElementKind, Fragment, NodeKind};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

pub const BLANK_URL: &str = "about:blank";

fn scheme_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*:)\S").ok())
        .as_ref()
}

fn url_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(concat!(
                r"((([A-Za-z]{3,9}:(?://)?)(?:[-;:&=+$,\w]+@)?[A-Za-z0-9.-]+",
                r"|(?:www.|[-;:&=+$,\w]+@)[A-Za-z0-9.-]+)",
                r"((?:/[+~%/.\w_-]*)?\??(?:[-+=&;%@.\w_]*)#?(?:\w*))?)",
            ))
            .ok()
        })
        .as_ref()
}

/// Lower-cased protocol of `url` including the colon, if it has one
pub fn protocol(url: &str) -> Option<String> {
    scheme_pattern()?
        .captures(url.trim())
        .and_then(|captures| captures.get(1))
        .map(|scheme| scheme.as_str().to_ascii_lowercase())
}

/// `about:blank` for a protocol outside `allowed`; anything without a
/// protocol is left alone
pub fn sanitize_url(url: &str, allowed: &[String]) -> String {
    match protocol(url) {
        Some(protocol) if !allowed.iter().any(|p| p.eq_ignore_ascii_case(&protocol)) => {
            BLANK_URL.to_string()
        }
        _ => url.to_string(),
    }
}

/// Sanitize every link URL inside `fragment`
pub fn sanitize_fragment_links(fragment: &mut Fragment, allowed: &[String]) {
    if let NodeKind::Element(element) = &mut fragment.kind {
        if let ElementKind::Link(link) = &mut element.kind {
            let url = sanitize_url(&link.url, allowed);
            if url != link.url {
                debug!(url = %link.url, "sanitized pasted link");
                link.url = url;
            }
        }
    }
    for child in &mut fragment.children {
        sanitize_fragment_links(child, allowed);
    }
}

/// Prepend `https://` when `url` has no protocol
pub fn ensure_url_protocol(url: &str) -> String {
    if protocol(url).is_some() {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Loose check that `url` looks like a link target
pub fn validate_url(url: &str) -> bool {
    url == "https://" || url_pattern().is_some_and(|pattern| pattern.is_match(url))
}
