//! URL helpers for tab URLs
//!
//! These functions avoid allocations and work directly on string slices.

// =============================================================================
// Scheme Prefixes
// =============================================================================

/// Prefix of internal browser pages.
pub const ABOUT_PREFIX: &str = "about:";

/// Prefix of pages served by an extension (including this one).
pub const EXTENSION_PREFIX: &str = "moz-extension://";

/// Is this an internal browser page?
#[inline]
pub fn is_about_page(url: &str) -> bool {
    url.starts_with(ABOUT_PREFIX)
}

/// Is this an extension page?
#[inline]
pub fn is_extension_page(url: &str) -> bool {
    url.starts_with(EXTENSION_PREFIX)
}

/// Scheme of a URL, without the trailing ':'.
/// Returns None when the URL does not start with a valid scheme.
#[inline]
pub fn extract_scheme(url: &str) -> Option<&str> {
    let bytes = url.as_bytes();

    let colon_pos = bytes.iter().position(|&b| b == b':')?;
    if colon_pos == 0 {
        return None;
    }

    // Scheme must be [A-Za-z][A-Za-z0-9+.-]*
    let scheme = &bytes[..colon_pos];
    if !scheme[0].is_ascii_alphabetic()
        || !scheme
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
    {
        return None;
    }

    Some(&url[..colon_pos])
}

/// Get the position after "://".
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let colon_pos = extract_scheme(url)?.len();
    let bytes = url.as_bytes();

    if bytes.len() > colon_pos + 2
        && bytes[colon_pos + 1] == b'/'
        && bytes[colon_pos + 2] == b'/'
    {
        return Some(colon_pos + 3);
    }

    None
}

// =============================================================================
// Host Extraction
// =============================================================================

/// Get the start and end positions of the hostname in a URL.
#[inline]
pub fn get_host_position(url: &str) -> Option<(usize, usize)> {
    let scheme_end = get_scheme_end(url)?;
    let bytes = url.as_bytes();

    // Authority ends at the first of '/', '?', '#'
    let mut authority_end = bytes.len();
    for (i, &b) in bytes[scheme_end..].iter().enumerate() {
        if b == b'/' || b == b'?' || b == b'#' {
            authority_end = scheme_end + i;
            break;
        }
    }

    // Skip userinfo
    let mut host_start = scheme_end;
    if let Some(at_pos) = bytes[scheme_end..authority_end].iter().rposition(|&b| b == b'@') {
        host_start = scheme_end + at_pos + 1;
    }

    // Bracketed IPv6 literal keeps its colons
    if bytes.get(host_start) == Some(&b'[') {
        let close = bytes[host_start..authority_end].iter().position(|&b| b == b']')?;
        return Some((host_start, host_start + close + 1));
    }

    let mut host_end = authority_end;
    for (i, &b) in bytes[host_start..authority_end].iter().enumerate() {
        if b == b':' {
            host_end = host_start + i;
            break;
        }
    }

    Some((host_start, host_end))
}

/// Host extraction without allocations.
/// Returns a slice into the original URL, or None when the URL has no host.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let (host_start, host_end) = get_host_position(url)?;
    let host = &url[host_start..host_end];
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}
