//! URL predicates for endpoints whose responses must never be cached.

use serde::{Deserialize, Serialize};
use url::Url;

/// How exclusion patterns are compared against a request URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionMatch {
    /// Pattern appears anywhere in the full URL text.
    #[default]
    Substring,
    /// URL path equals the pattern or continues it with a `/` segment.
    PathPrefix,
}

/// Set of volatile endpoints excluded from caching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    patterns: Vec<String>,
    mode: ExclusionMatch,
}

impl ExclusionSet {
    pub fn new<I, S>(patterns: I, mode: ExclusionMatch) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { patterns: patterns.into_iter().map(Into::into).collect(), mode }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn mode(&self) -> ExclusionMatch {
        self.mode
    }

    /// Returns the first pattern matching `url`, if any.
    pub fn matching_pattern(&self, url: &Url) -> Option<&str> {
        self.patterns
            .iter()
            .find(|pattern| self.pattern_matches(pattern, url))
            .map(String::as_str)
    }

    pub fn matches(&self, url: &Url) -> bool {
        self.matching_pattern(url).is_some()
    }

    fn pattern_matches(&self, pattern: &str, url: &Url) -> bool {
        match self.mode {
            ExclusionMatch::Substring => url.as_str().contains(pattern),
            ExclusionMatch::PathPrefix => {
                let path = url.path();
                let pattern = pattern.trim_end_matches('/');
                match path.strip_prefix(pattern) {
                    Some(rest) => rest.is_empty() || rest.starts_with('/'),
                    None => false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn fuec_set(mode: ExclusionMatch) -> ExclusionSet {
        ExclusionSet::new(["/validar-vehiculo", "/generar"], mode)
    }

    #[test]
    fn test_substring_matches_query_urls() {
        let set = fuec_set(ExclusionMatch::Substring);
        assert!(set.matches(&url("http://localhost:8000/validar-vehiculo?plate=ABC123")));
        assert_eq!(set.matching_pattern(&url("http://localhost:8000/conductor/generar")), Some("/generar"));
        assert!(!set.matches(&url("http://localhost:8000/conductor/crear-contrato")));
    }

    #[test]
    fn test_substring_has_false_positives() {
        let set = fuec_set(ExclusionMatch::Substring);
        assert!(set.matches(&url("http://localhost:8000/static/generar-icon.svg")));
    }

    #[test]
    fn test_path_prefix_is_segment_aware() {
        let set = fuec_set(ExclusionMatch::PathPrefix);
        assert!(set.matches(&url("http://localhost:8000/generar")));
        assert!(set.matches(&url("http://localhost:8000/generar/123")));
        assert!(set.matches(&url("http://localhost:8000/validar-vehiculo?plate=ABC123")));
        assert!(!set.matches(&url("http://localhost:8000/generar-icon.svg")));
        assert!(!set.matches(&url("http://localhost:8000/conductor/generar")));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = ExclusionSet::default();
        assert!(!set.matches(&url("http://localhost:8000/generar")));
        assert!(set.patterns().is_empty());
    }
}
