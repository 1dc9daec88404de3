//! Directory-scoped path matching.

use serde::{Deserialize, Serialize};

/// How a path prefix selects index entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Match whole path components: `foo` selects `foo` and `foo/...`,
    /// never `foobar.txt`.
    #[default]
    Component,
    /// Literal string prefix: `foo` also selects `foobar.txt`.
    Raw,
}

impl MatchMode {
    /// Does `prefix` select `path`?
    ///
    /// An empty prefix or `.` selects every path.
    pub fn matches(self, prefix: &str, path: &str) -> bool {
        if selects_all(prefix) {
            return true;
        }
        match self {
            Self::Raw => path.starts_with(prefix),
            Self::Component => {
                let prefix = prefix.trim_end_matches('/');
                match path.strip_prefix(prefix) {
                    Some(rest) => rest.is_empty() || rest.starts_with('/'),
                    None => false,
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Raw => "raw",
        }
    }
}

impl std::str::FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "component" => Ok(Self::Component),
            "raw" => Ok(Self::Raw),
            other => Err(format!(
                "unknown path match mode {other:?} (expected \"component\" or \"raw\")"
            )),
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn selects_all(prefix: &str) -> bool {
    prefix.is_empty() || prefix == "." || prefix == "./"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_respects_boundaries() {
        let m = MatchMode::Component;
        assert!(m.matches("foo", "foo"));
        assert!(m.matches("foo", "foo/bar.txt"));
        assert!(m.matches("foo/", "foo/bar.txt"));
        assert!(!m.matches("foo", "foobar.txt"));
        assert!(!m.matches("foo/bar", "foo"));
    }

    #[test]
    fn raw_is_literal_prefix() {
        let m = MatchMode::Raw;
        assert!(m.matches("foo", "foobar.txt"));
        assert!(m.matches("foo", "foo/x"));
        assert!(!m.matches("bar", "foo/bar"));
    }

    #[test]
    fn empty_and_dot_select_all() {
        for m in [MatchMode::Component, MatchMode::Raw] {
            assert!(m.matches("", "a/b"));
            assert!(m.matches(".", "a/b"));
        }
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("raw".parse::<MatchMode>().unwrap(), MatchMode::Raw);
        assert_eq!(MatchMode::default().to_string(), "component");
        assert!("fuzzy".parse::<MatchMode>().is_err());
    }
}
