/// Path utilities for splitting and normalization
///
/// All functions are **pure**: given same input, always produce same output with no side effects.

use std::borrow::Cow;

/// Splits a raw request target once on the first `?`
///
/// # Examples
///
/// ```
/// use routeplex::path::split_path_and_query;
///
/// assert_eq!(split_path_and_query("/search?q=a?b"), ("/search", Some("q=a?b")));
/// assert_eq!(split_path_and_query("/search?"), ("/search", Some("")));
/// assert_eq!(split_path_and_query("/about"), ("/about", None));
/// ```
pub fn split_path_and_query(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw, None),
    }
}

/// Splits a path on `/`, dropping empty segments
///
/// `"/a/b"`, `"/a/b/"` and `"a//b"` all yield `["a", "b"]`; the root yields
/// no segments.
///
/// # Examples
///
/// ```
/// use routeplex::path::path_segments;
///
/// assert_eq!(path_segments("/a/b/"), vec!["a", "b"]);
/// assert!(path_segments("/").is_empty());
/// ```
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Validates if a path is in canonical form
///
/// # Rules
///
/// - Must start with `/`
/// - Must not contain `//` or `\`
/// - Must not end with `/` (except root `/`)
/// - Must not be empty
///
/// # Examples
///
/// ```
/// use routeplex::path::is_valid_path;
///
/// assert!(is_valid_path("/"));
/// assert!(is_valid_path("/users/:id"));
///
/// assert!(!is_valid_path(""));
/// assert!(!is_valid_path("about")); // Missing leading /
/// assert!(!is_valid_path("/about/")); // Trailing /
/// assert!(!is_valid_path("/about//page")); // Double //
/// ```
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }

    if path.contains("//") || path.contains('\\') {
        return false;
    }

    path == "/" || !path.ends_with('/')
}

/// Normalize a path to canonical form
///
/// Returns `Cow::Borrowed` when input is already valid (zero allocations).
/// Composition leaves separators behind (`/` + `/users` renders `//users`);
/// this collapses them.
///
/// - Trailing slashes: `/path/` → `/path`
/// - Double slashes: `/path//to` → `/path/to`
/// - Backslashes: `\path\to` → `/path/to`
///
/// # Examples
///
/// ```
/// use routeplex::path::normalize_path;
/// use std::borrow::Cow;
///
/// let path = normalize_path("/users/:id");
/// assert!(matches!(path, Cow::Borrowed("/users/:id")));
///
/// assert_eq!(normalize_path("//users/"), "/users");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_valid_path(path) {
        return Cow::Borrowed(path);
    }

    let normalized = path
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", normalized))
    }
}
