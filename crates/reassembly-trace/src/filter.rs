// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message id filtering for reports.
//!
//! Patterns: `*` (any id), `12` (exact), `10-20` (inclusive range).

/// Message id filter.
#[derive(Debug, Clone)]
pub struct IdFilter {
    mode: FilterMode,
    patterns: Vec<String>,
}

/// Filter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterMode {
    /// Include only matching ids.
    Include,
    /// Exclude matching ids.
    Exclude,
}

impl IdFilter {
    /// Create an include filter (only report matching ids).
    pub fn include(patterns: Vec<String>) -> Self {
        Self {
            mode: FilterMode::Include,
            patterns,
        }
    }

    /// Create an exclude filter (report all except matching ids).
    pub fn exclude(patterns: Vec<String>) -> Self {
        Self {
            mode: FilterMode::Exclude,
            patterns,
        }
    }

    /// Split a comma-separated pattern list (`"1,4-9"`).
    pub fn split_list(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Check if an id matches the filter.
    pub fn matches(&self, id: u32) -> bool {
        let is_match = self.patterns.iter().any(|p| Self::pattern_match(p, id));

        match self.mode {
            FilterMode::Include => is_match,
            FilterMode::Exclude => !is_match,
        }
    }

    /// Malformed patterns never match.
    fn pattern_match(pattern: &str, id: u32) -> bool {
        if pattern == "*" {
            return true;
        }

        if let Some((low, high)) = pattern.split_once('-') {
            match (low.trim().parse::<u32>(), high.trim().parse::<u32>()) {
                (Ok(low), Ok(high)) => (low..=high).contains(&id),
                _ => false,
            }
        } else {
            pattern.parse::<u32>().is_ok_and(|exact| exact == id)
        }
    }

    /// Patterns in this filter.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check if this is an include filter.
    pub fn is_include(&self) -> bool {
        self.mode == FilterMode::Include
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_exact() {
        let filter = IdFilter::include(vec!["12".into(), "30".into()]);

        assert!(filter.matches(12));
        assert!(filter.matches(30));
        assert!(!filter.matches(13));
        assert!(filter.is_include());
    }

    #[test]
    fn test_exclude_range() {
        let filter = IdFilter::exclude(vec!["10-20".into()]);

        assert!(filter.matches(9));
        assert!(!filter.matches(10));
        assert!(!filter.matches(20));
        assert!(filter.matches(21));
    }

    #[test]
    fn test_wildcard_all() {
        let filter = IdFilter::include(vec!["*".into()]);

        assert!(filter.matches(0));
        assert!(filter.matches(u32::MAX));
    }

    #[test]
    fn test_malformed_patterns_never_match() {
        let filter = IdFilter::include(vec!["abc".into(), "5-x".into(), "".into()]);

        assert!(!filter.matches(5));
        assert!(!filter.matches(0));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(IdFilter::split_list(" 1, 4-9 ,,*"), vec!["1", "4-9", "*"]);
        assert!(IdFilter::split_list("").is_empty());
    }
}
