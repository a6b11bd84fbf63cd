//! Blocklist of domains enforced during focus sessions.
//!
//! Entries are stored normalized: lower-cased, scheme and leading `www.`
//! stripped, and cut at the first path/query/fragment separator. The list
//! keeps insertion order and set semantics (no duplicates).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Normalize a raw user-entered site string to a bare domain.
///
/// Returns `None` when nothing remains after stripping (empty input,
/// bare scheme, etc.).
pub fn normalize_domain(input: &str) -> Option<String> {
    let s = input.trim().to_lowercase();
    let s = s.strip_prefix("https://").or_else(|| s.strip_prefix("http://")).unwrap_or(&s);
    let s = s.strip_prefix("www.").unwrap_or(s);
    let host = s.split(['/', '?', '#']).next().unwrap_or("");
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Ordered set of normalized domains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blocklist(Vec<String>);

impl Blocklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and insert a domain. Returns the normalized form and
    /// whether the list changed (false when already present).
    ///
    /// # Errors
    /// Returns `CoreError::InvalidDomain` when the input normalizes to
    /// an empty host.
    pub fn insert(&mut self, raw: &str) -> Result<(String, bool), CoreError> {
        let domain =
            normalize_domain(raw).ok_or_else(|| CoreError::InvalidDomain(raw.to_string()))?;
        if self.0.iter().any(|d| d == &domain) {
            return Ok((domain, false));
        }
        self.0.push(domain.clone());
        Ok((domain, true))
    }

    /// Remove a domain (input is normalized first). Returns whether an
    /// entry was removed.
    pub fn remove(&mut self, raw: &str) -> bool {
        let Some(domain) = normalize_domain(raw) else {
            return false;
        };
        let before = self.0.len();
        self.0.retain(|d| d != &domain);
        self.0.len() != before
    }

    pub fn domains(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_strips_scheme_www_and_path() {
        assert_eq!(
            normalize_domain("https://www.Example.com/path?x=1").as_deref(),
            Some("example.com")
        );
        assert_eq!(normalize_domain("http://news.site.org#top").as_deref(), Some("news.site.org"));
        assert_eq!(normalize_domain("  Reddit.com  ").as_deref(), Some("reddit.com"));
    }

    #[test]
    fn normalize_rejects_empty_hosts() {
        assert_eq!(normalize_domain(""), None);
        assert_eq!(normalize_domain("https://"), None);
        assert_eq!(normalize_domain("https://www."), None);
        assert_eq!(normalize_domain("/just/a/path"), None);
    }

    #[test]
    fn insert_collapses_duplicates() {
        let mut list = Blocklist::new();
        assert_eq!(list.insert("example.com").unwrap(), ("example.com".into(), true));
        assert_eq!(
            list.insert("https://www.example.com/feed").unwrap(),
            ("example.com".into(), false)
        );
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn insert_preserves_order() {
        let mut list = Blocklist::new();
        list.insert("b.com").unwrap();
        list.insert("a.com").unwrap();
        assert_eq!(list.domains(), ["b.com", "a.com"]);
    }

    #[test]
    fn remove_normalizes_its_argument() {
        let mut list = Blocklist::new();
        list.insert("example.com").unwrap();
        assert!(list.remove("https://WWW.example.com/x"));
        assert!(list.is_empty());
        assert!(!list.remove("example.com"));
    }

    proptest! {
        #[test]
        fn normalized_output_has_no_separators(input in "\\PC{0,40}") {
            if let Some(d) = normalize_domain(&input) {
                prop_assert!(!d.contains('/') && !d.contains('?') && !d.contains('#'));
                prop_assert_eq!(d.to_lowercase(), d);
            }
        }
    }
}
