//! Specificity ordering of route templates
//!
//! Templates are compared segment by segment. The first position where the
//! segments differ in complexity decides; a fully static segment always wins.
//! When no position decides, the template with more segments sorts first.

use std::cmp::Ordering;

use crate::route::pattern::find_query_start;
use crate::Route;

/// Number of capture markers (`:` and `{`) in a template segment
///
/// An unnamed `*` has no marker, so it ranks with static segments.
pub fn complexity(segment: &str) -> usize {
    segment.chars().filter(|c| matches!(c, ':' | '{')).count()
}

fn path_part(template: &str) -> &str {
    find_query_start(template).map_or(template, |index| &template[..index])
}

/// Compares two templates, most specific first
///
/// # Examples
///
/// ```
/// use routeplex::compare_specificity;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_specificity("/users/settings", "/users/:id"), Ordering::Less);
/// assert_eq!(compare_specificity("/users/:id/posts", "/users/:id"), Ordering::Less);
/// assert_eq!(compare_specificity("/a/:x", "/b/:y"), Ordering::Equal);
/// ```
pub fn compare_specificity(a: &str, b: &str) -> Ordering {
    let a_segments: Vec<&str> = path_part(a).split('/').collect();
    let b_segments: Vec<&str> = path_part(b).split('/').collect();

    for (a_segment, b_segment) in a_segments.iter().zip(&b_segments) {
        if a_segment == b_segment {
            continue;
        }
        match (complexity(a_segment), complexity(b_segment)) {
            (a_complexity, b_complexity) if a_complexity == b_complexity => continue,
            (0, _) => return Ordering::Less,
            (_, 0) => return Ordering::Greater,
            (a_complexity, b_complexity) => return a_complexity.cmp(&b_complexity),
        }
    }

    b_segments.len().cmp(&a_segments.len())
}

/// Sorts templates most specific first (stable)
///
/// # Examples
///
/// ```
/// use routeplex::sort_templates;
///
/// let mut templates = ["/users", "/users/:id", "/users/settings", "/users/:id/posts"];
/// sort_templates(&mut templates);
/// assert_eq!(templates, ["/users/settings", "/users/:id/posts", "/users/:id", "/users"]);
/// ```
pub fn sort_templates<S: AsRef<str>>(templates: &mut [S]) {
    templates.sort_by(|a, b| compare_specificity(a.as_ref(), b.as_ref()));
}

/// Sorts routes by their [`Route::path`], most specific first (stable)
pub fn sort_routes(mut routes: Vec<Route>) -> Vec<Route> {
    routes.sort_by(|a, b| compare_specificity(a.path(), b.path()));
    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_complexity() {
        assert_eq!(complexity("users"), 0);
        assert_eq!(complexity(":id"), 1);
        assert_eq!(complexity(":name.:ext"), 2);
        assert_eq!(complexity("{user-:id}"), 2);
        assert_eq!(complexity("*"), 0);
    }

    #[test]
    fn test_static_beats_dynamic() {
        assert_eq!(compare_specificity("/users/new", "/users/:id"), Ordering::Less);
        assert_eq!(compare_specificity("/users/:id", "/users/new"), Ordering::Greater);
    }

    #[test]
    fn test_lower_complexity_first() {
        assert_eq!(compare_specificity("/files/:name", "/files/:name.:ext"), Ordering::Less);
    }

    #[test]
    fn test_equal_complexity_continues() {
        assert_eq!(compare_specificity("/:a/x", "/:b/:c"), Ordering::Less);
    }

    #[test]
    fn test_query_part_ignored() {
        assert_eq!(compare_specificity("/search?q=:q", "/search"), Ordering::Equal);
    }

    #[test]
    fn test_sort_is_stable_and_idempotent() {
        let mut templates = vec!["/b/:y", "/users", "/a/:x", "/users/:id", "/users/settings"];
        sort_templates(&mut templates);
        assert_eq!(templates, vec!["/users/settings", "/b/:y", "/a/:x", "/users/:id", "/users"]);

        let once = templates.clone();
        sort_templates(&mut templates);
        assert_eq!(templates, once);
    }

    #[test]
    fn test_sort_routes() {
        let routes = vec![Route::parse("/users"), Route::parse("/users/:id"), Route::parse("/users/me")];
        let sorted: Vec<String> = sort_routes(routes).iter().map(|r| r.path().to_string()).collect();
        assert_eq!(sorted, vec!["/users/me", "/users/:id", "/users"]);
    }
}
