//! MCP Protocol Helpers
//!
//! This module contains helper functions for HTTP header inspection
//! used by the transport.

use axum::http::HeaderMap;

/// Reports whether an `Accept` header value admits `mime`.
///
/// Media ranges are matched case-insensitively; `*/*` and type-level
/// wildcards such as `text/*` satisfy any matching subtype. A range with
/// `q=0` explicitly refuses the type.
///
/// ```
/// use mcp_tool_server::mcp::helpers::accept_contains;
///
/// assert!(accept_contains(Some("*/*"), "application/json"));
/// assert!(accept_contains(Some("text/*;q=0.5"), "text/event-stream"));
/// assert!(!accept_contains(Some("application/json"), "text/event-stream"));
/// assert!(!accept_contains(None, "application/json"));
/// ```
pub fn accept_contains(accept: Option<&str>, mime: &str) -> bool {
    let Some(accept) = accept else {
        return false;
    };
    let Some((wanted_type, wanted_subtype)) = mime.split_once('/') else {
        return false;
    };

    accept.split(',').any(|range| {
        let mut parts = range.split(';');
        let media = parts.next().unwrap_or("").trim();
        if parts.any(is_zero_quality) {
            return false;
        }

        match media.split_once('/') {
            Some(("*", "*")) => true,
            Some((ty, "*")) => ty.eq_ignore_ascii_case(wanted_type),
            Some((ty, subtype)) => {
                ty.eq_ignore_ascii_case(wanted_type) && subtype.eq_ignore_ascii_case(wanted_subtype)
            }
            None => false,
        }
    })
}

fn is_zero_quality(param: &str) -> bool {
    match param.trim().split_once('=') {
        Some((name, value)) if name.trim().eq_ignore_ascii_case("q") => {
            value.trim().parse::<f32>().map(|q| q == 0.0).unwrap_or(false)
        }
        _ => false,
    }
}

/// Joins every value of a repeated header into one comma-separated string
pub fn header_values(headers: &HeaderMap, name: &str) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

/// Reads a single header as a string
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
