//! View URI arithmetic.

/// Resolves `relative` against the directory of `base`.
///
/// Backslashes are normalised to `/`. The directory is everything up to and
/// including the last `/` of `base`; a leading `/` on `relative` is dropped
/// before joining. If `base` has no `/` at all, `relative` is returned as-is.
///
/// ```
/// use xview_document::uri::resolve;
/// assert_eq!(resolve("/hello/1.png", "images/2.png"), "/hello/images/2.png");
/// ```
pub fn resolve(base: &str, relative: &str) -> String {
    let base = base.replace('\\', "/");
    match base.rfind('/') {
        Some(offset) => {
            let relative = relative.replace('\\', "/");
            let relative = relative.strip_prefix('/').unwrap_or(&relative);
            format!("{}{}", &base[..=offset], relative)
        }
        None => relative.to_string(),
    }
}

/// `true` for URIs that must not be re-anchored: rooted paths and anything
/// with a scheme.
pub fn is_absolute(uri: &str) -> bool {
    uri.starts_with('/') || uri.starts_with('\\') || uri.contains("://")
}

/// Anchors `uri` on the document at `base` unless it is already absolute.
pub fn anchor(base: &str, uri: &str) -> String {
    if is_absolute(uri) {
        uri.replace('\\', "/")
    } else {
        resolve(base, uri)
    }
}

/// Collapses `.` and `..` segments.
///
/// `..` never climbs above the first segment; a leading `/` and a trailing
/// `/` are preserved. Scheme-qualified URIs are returned untouched.
pub fn normalize(uri: &str) -> String {
    if uri.contains("://") {
        return uri.to_string();
    }

    let rooted = uri.starts_with('/');
    let trailing = uri.ends_with('/') && uri.len() > 1;
    let mut segments: Vec<&str> = Vec::new();

    for segment in uri.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut out = String::with_capacity(uri.len());
    if rooted {
        out.push('/');
    }
    out.push_str(&segments.join("/"));
    if trailing && !segments.is_empty() {
        out.push('/');
    }
    out
}
