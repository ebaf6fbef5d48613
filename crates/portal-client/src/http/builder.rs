//! Request target builder
//!
//! Composes the final request URL from the configured base address and a
//! caller-supplied path.

/// Join `base_url` and `path` into a request target.
///
/// Absolute `http://` / `https://` paths override the base entirely.
/// Otherwise at most one leading slash is dropped from `path` and the base
/// is given exactly one trailing slash before concatenation.
pub fn build_url(base_url: &str, path: &str) -> String {
    if is_absolute(path) {
        return path.to_string();
    }

    let path = path.strip_prefix('/').unwrap_or(path);
    let base = base_url.trim_end_matches('/');

    let mut url = String::with_capacity(base.len() + path.len() + 1);
    url.push_str(base);
    url.push('/');
    url.push_str(path);
    url
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}
