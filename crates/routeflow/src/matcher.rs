//! Route-pattern compilation and path matching.
//!
//! A pattern takes one of three forms:
//! - a literal path (`/users`), matched by structural equality;
//! - a parameterized path (`/users/:id`, `/files/*`), compiled to an
//!   anchored regex where each `:name` segment becomes a lazy, non-empty,
//!   non-`/` named capture and each `*` becomes a lazy capturing group;
//!   a trailing slash on the concrete path is tolerated;
//! - a raw regex (leading `^`), used verbatim with the end anchor appended,
//!   yielding positional (unnamed) captures.
//!
//! Match failure is the common case for a table scan and costs no
//! allocation; compilation failure is reported eagerly so a bad pattern
//! never reaches dispatch.

use crate::error::RouteError;
use regex::Regex;
use std::fmt;

/// A compiled route pattern.
///
/// Compiled once at registration and reused for every dispatch; matching
/// takes `&self` and keeps no state, so two matchers compiled from the
/// same pattern agree on every input.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: String,
    kind: MatcherKind,
}

#[derive(Debug, Clone)]
enum MatcherKind {
    Literal(String),
    /// `names[i]` is the name of capture group `i + 1`, `None` for a
    /// wildcard group.
    Captures { regex: Regex, names: Vec<Option<String>> },
    Raw(Regex),
}

impl PathMatcher {
    /// Compiles `pattern` into a matcher.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] when the pattern (raw or
    /// rewritten) is not a valid regular expression.
    pub fn compile(pattern: &str) -> Result<Self, RouteError> {
        let kind = if pattern.starts_with('^') {
            // The author anchors the head; we close the tail.
            let regex = Regex::new(&format!("{pattern}$")).map_err(|source| {
                RouteError::InvalidPattern { pattern: pattern.to_owned(), source }
            })?;
            MatcherKind::Raw(regex)
        } else if pattern.contains(':') || pattern.contains('*') {
            let (source, names) = rewrite(pattern);
            if names.is_empty() {
                // `:` appeared without a name; no capture groups were
                // produced, so plain equality is all that is left.
                MatcherKind::Literal(pattern.to_owned())
            } else {
                let regex = Regex::new(&source).map_err(|source| {
                    RouteError::InvalidPattern { pattern: pattern.to_owned(), source }
                })?;
                MatcherKind::Captures { regex, names }
            }
        } else {
            MatcherKind::Literal(pattern.to_owned())
        };

        Ok(Self { pattern: pattern.to_owned(), kind })
    }

    /// The pattern this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Matches `path`, returning the extracted parameters on success.
    ///
    /// `None` is the expected outcome for most table entries, not an
    /// error.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        match &self.kind {
            MatcherKind::Literal(literal) => (path == literal).then(PathParams::empty),
            MatcherKind::Captures { regex, names } => {
                let captures = regex.captures(path)?;
                let mut params = PathParams::empty();
                for (index, name) in names.iter().enumerate() {
                    if let Some(group) = captures.get(index + 1) {
                        params.push(name.clone(), group.as_str().to_owned());
                    }
                }
                Some(params)
            }
            MatcherKind::Raw(regex) => {
                let captures = regex.captures(path)?;
                let mut params = PathParams::empty();
                for group in captures.iter().skip(1).flatten() {
                    params.push(None, group.as_str().to_owned());
                }
                Some(params)
            }
        }
    }
}

/// Rewrites a parameterized pattern into an anchored regex source,
/// returning it together with the per-group parameter names.
fn rewrite(pattern: &str) -> (String, Vec<Option<String>>) {
    let mut source = String::with_capacity(pattern.len() + 16);
    source.push('^');
    let mut names = Vec::new();
    let mut literal = String::new();

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ':' => {
                // parameter names start with a letter or underscore
                let mut name = String::new();
                if chars.peek().is_some_and(|&next| next.is_ascii_alphabetic() || next == '_') {
                    while let Some(&next) = chars.peek() {
                        if next.is_ascii_alphanumeric() || next == '_' {
                            name.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
                if name.is_empty() {
                    // a bare colon is just path text
                    literal.push(':');
                } else {
                    flush_literal(&mut source, &mut literal);
                    source.push_str("(?P<");
                    source.push_str(&name);
                    source.push_str(">[^/]+?)");
                    names.push(Some(name));
                }
            }
            '*' => {
                flush_literal(&mut source, &mut literal);
                // Lazy, so each of several wildcards captures minimally;
                // under the end anchor a single trailing wildcard still
                // spans the whole remainder.
                source.push_str("(.*?)");
                names.push(None);
            }
            other => literal.push(other),
        }
    }
    flush_literal(&mut source, &mut literal);
    source.push_str("/?$");

    (source, names)
}

fn flush_literal(source: &mut String, literal: &mut String) {
    if !literal.is_empty() {
        source.push_str(&regex::escape(literal));
        literal.clear();
    }
}

/// Parameters extracted from one match attempt.
///
/// An ordered sequence of `(optional name, value)` pairs: `:name` segments
/// yield named entries, wildcard and raw-regex groups yield unnamed ones.
/// Produced once per route attempt and immutable for its lifetime; a new
/// attempt regenerates them from scratch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    items: Vec<(Option<String>, String)>,
}

impl PathParams {
    /// Creates an empty parameter set.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Gets a parameter by name.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        let name = name.as_ref();
        self.items
            .iter()
            .find(|(key, _)| key.as_deref() == Some(name))
            .map(|(_, value)| value.as_str())
    }

    /// Gets a parameter by its position in match order.
    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(|(_, value)| value.as_str())
    }

    /// Iterates parameters in match order.
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.items.iter().map(|(name, value)| (name.as_deref(), value.as_str()))
    }

    pub(crate) fn push(&mut self, name: Option<String>, value: String) {
        self.items.push((name, value));
    }
}

impl fmt::Display for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::{PathMatcher, PathParams};

    fn compile(pattern: &str) -> PathMatcher {
        PathMatcher::compile(pattern).unwrap()
    }

    #[test]
    fn literal_matches_exactly() {
        let matcher = compile("/users");
        assert_eq!(matcher.matches("/users"), Some(PathParams::empty()));
        assert!(matcher.matches("/users/").is_none());
        assert!(matcher.matches("/users/1").is_none());
        assert!(matcher.matches("/user").is_none());
    }

    #[test]
    fn named_param_extraction() {
        let matcher = compile("/users/:id");
        let params = matcher.matches("/users/42").unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn named_param_requires_non_empty_segment() {
        let matcher = compile("/users/:id");
        assert!(matcher.matches("/users/").is_none());
        assert!(matcher.matches("/users").is_none());
    }

    #[test]
    fn named_param_tolerates_trailing_slash() {
        let matcher = compile("/users/:id");
        let params = matcher.matches("/users/42/").unwrap();
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn named_param_stops_at_slash() {
        let matcher = compile("/users/:id");
        assert!(matcher.matches("/users/42/posts").is_none());
    }

    #[test]
    fn multiple_named_params() {
        let matcher = compile("/users/:id/posts/:post");
        let params = matcher.matches("/users/7/posts/99").unwrap();
        assert_eq!(params.get("id"), Some("7"));
        assert_eq!(params.get("post"), Some("99"));
    }

    #[test]
    fn single_wildcard_spans_remainder() {
        let matcher = compile("/files/*");
        let params = matcher.matches("/files/a/b.txt").unwrap();
        assert_eq!(params.get_index(0), Some("a/b.txt"));
    }

    #[test]
    fn multiple_wildcards_capture_minimally() {
        let matcher = compile("/x/*/*");
        let params = matcher.matches("/x/a/b/c").unwrap();
        assert_eq!(params.get_index(0), Some("a"));
        assert_eq!(params.get_index(1), Some("b/c"));
    }

    #[test]
    fn raw_regex_positional_captures() {
        let matcher = compile(r"^/posts/(\d+)-([a-z]+)");
        let params = matcher.matches("/posts/12-intro").unwrap();
        assert_eq!(params.get_index(0), Some("12"));
        assert_eq!(params.get_index(1), Some("intro"));
        assert!(params.get("id").is_none());
    }

    #[test]
    fn raw_regex_is_end_anchored() {
        let matcher = compile(r"^/posts/(\d+)");
        assert!(matcher.matches("/posts/12/extra").is_none());
    }

    #[test]
    fn invalid_raw_regex_fails_at_compile_time() {
        assert!(PathMatcher::compile("^/posts/(unclosed").is_err());
    }

    #[test]
    fn compilation_is_idempotent() {
        let first = compile("/users/:id/files/*");
        let second = compile("/users/:id/files/*");
        for path in ["/users/1/files/a/b", "/users/1/files/", "/users", "/"] {
            assert_eq!(first.matches(path), second.matches(path));
        }
        // matching holds no state between calls
        assert_eq!(first.matches("/users/1/files/x"), first.matches("/users/1/files/x"));
    }

    #[test]
    fn regex_metacharacters_in_literals_are_escaped() {
        let matcher = compile("/a.b/:id");
        assert!(matcher.matches("/aXb/1").is_none());
        assert_eq!(matcher.matches("/a.b/1").unwrap().get("id"), Some("1"));
    }

    #[test]
    fn bare_colon_is_literal_text() {
        let matcher = compile("/time/12:30");
        assert!(matcher.matches("/time/12:30").is_some());
        assert!(matcher.matches("/time/12-30").is_none());
    }
}
