//! Bidirectional rewriting of image `src` attributes.
//!
//! Two crossing points exist between addressing schemes: load time
//! (storage-relative -> display URI, via a resolver bound to the
//! note's image directory) and save time (any resolver-specific URI
//! -> canonical `./images/<file>`). `to_storage` must be idempotent:
//! the view already sends storage-form content and the host applies
//! the transform again before writing, so a second application has to
//! be a no-op. Non-matching `src` values (external URLs, data URIs)
//! pass through both directions unchanged.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Maps a stored image filename to a URI the view can actually load.
/// The host binds this to its image directory; tests substitute
/// closures.
pub trait DisplayResolver {
    fn resolve(&self, file_name: &str) -> String;
}

impl<F> DisplayResolver for F
where
    F: Fn(&str) -> String,
{
    fn resolve(&self, file_name: &str) -> String {
        self(file_name)
    }
}

/// Canonical at-rest form: `src="./images/<file>"`, optional `./`.
fn storage_src_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"src="(?:\./)?images/([^"/]+)""#).expect("static regex"))
}

/// Any src whose value contains an `images` segment preceded by a
/// literal or percent-encoded separator. Greedy prefix means the last
/// such segment wins when several are present.
fn display_src_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"src="[^"]*(?:/|%2F|%2f)images(?:/|%2F|%2f)([^"]+)""#).expect("static regex")
    })
}

fn value_relative_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:^|/|%2F|%2f)images(?:/|%2F|%2f)(.+)$"#).expect("static regex")
    })
}

/// Strip leading directories from a captured tail, honoring both
/// literal and encoded separators.
fn final_segment(tail: &str) -> &str {
    let mut rest = tail;
    if let Some(idx) = rest.rfind('/') {
        rest = &rest[idx + 1..];
    }
    let enc = rest.rfind("%2F").max(rest.rfind("%2f"));
    if let Some(idx) = enc {
        rest = &rest[idx + 3..];
    }
    rest
}

/// Rewrite storage-relative image srcs to display URIs. Applied once,
/// at load time, to the whole HTML fragment.
pub fn to_display<R: DisplayResolver + ?Sized>(html: &str, resolver: &R) -> String {
    storage_src_re()
        .replace_all(html, |caps: &regex::Captures<'_>| {
            format!(r#"src="{}""#, resolver.resolve(&caps[1]))
        })
        .into_owned()
}

/// Rewrite display (or otherwise resolver-prefixed) image srcs back
/// to the canonical `./images/<file>` form. Idempotent.
pub fn to_storage(html: &str) -> String {
    display_src_re()
        .replace_all(html, |caps: &regex::Captures<'_>| {
            format!(r#"src="./images/{}""#, final_segment(&caps[1]))
        })
        .into_owned()
}

/// Extract the storage-relative path (`images/<file>` form) from a
/// single src value. Used only as a derivation fallback when an image
/// node carries no explicit storage-path attribute.
pub fn storage_relative_from(src_value: &str) -> Option<String> {
    value_relative_re()
        .captures(src_value)
        .map(|caps| format!("images/{}", final_segment(&caps[1])))
}

/// Rebuild the ordinal image manifest from storage-form content, in
/// document order: `image_0..image_n -> images/<file>`.
pub fn recompute_manifest(storage_content: &str) -> BTreeMap<String, String> {
    storage_src_re()
        .captures_iter(storage_content)
        .enumerate()
        .map(|(i, caps)| (format!("image_{i}"), format!("images/{}", &caps[1])))
        .collect()
}
