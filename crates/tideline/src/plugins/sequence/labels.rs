//! Return-label extraction
//!
//! A sync message label may carry the text of its reply. Forms are tried in
//! priority order: `label <- reply`, `method(args): Type`, then the last
//! colon that is not the start of a URL scheme separator.

use std::sync::OnceLock;

use regex::Regex;

fn method_signature() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][\w.]*\([^)]*\))\s*:\s*(.+)$").expect("method signature regex")
    })
}

/// Split a raw sync label into `(label, return_label)`
///
/// # Example
/// ```
/// use tideline::plugins::sequence::split_return_label;
///
/// assert_eq!(split_return_label("L <- R"), ("L".to_string(), Some("R".to_string())));
/// assert_eq!(split_return_label("fn(): T"), ("fn()".to_string(), Some("T".to_string())));
/// assert_eq!(split_return_label("http://x.com"), ("http://x.com".to_string(), None));
/// ```
pub fn split_return_label(raw: &str) -> (String, Option<String>) {
    let raw = raw.trim();

    if let Some((label, reply)) = raw.split_once("<-") {
        return (label.trim().to_string(), non_empty(reply));
    }

    if let Some(captures) = method_signature().captures(raw) {
        return (captures[1].to_string(), non_empty(&captures[2]));
    }

    for (index, _) in raw.match_indices(':').collect::<Vec<_>>().into_iter().rev() {
        let (label, rest) = (raw[..index].trim(), &raw[index + 1..]);
        if rest.starts_with("//") {
            continue;
        }
        let reply = rest.trim();
        if !label.is_empty() && !reply.is_empty() {
            return (label.to_string(), Some(reply.to_string()));
        }
    }

    (raw.to_string(), None)
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
