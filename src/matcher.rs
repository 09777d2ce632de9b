use globset::{GlobBuilder, GlobMatcher};
use log::debug;

/// Compiled name matcher for one search term.
///
/// Matching is substring-contains with implicit wildcard wrapping: the term
/// is compiled as the glob `*term*`, so wildcards inside the term stay
/// active. Only base names are ever tested, never full paths.
///
/// Case sensitivity follows the host filesystem's default comparison:
/// insensitive on Windows, sensitive elsewhere.
pub struct NameMatcher {
    inner: MatcherImpl,
}

enum MatcherImpl {
    Glob(GlobMatcher),
    /// Fallback for terms that are not valid glob syntax (e.g. an unclosed
    /// bracket): plain substring comparison, case-folded on Windows.
    Literal(String),
}

impl NameMatcher {
    /// Compiles a matcher for `term`. Returns `None` for an empty term:
    /// an empty term matches nothing, and callers are expected to reject it
    /// before reaching the engine.
    pub fn new(term: &str) -> Option<Self> {
        if term.is_empty() {
            return None;
        }

        let pattern = format!("*{term}*");
        let inner = match GlobBuilder::new(&pattern)
            .case_insensitive(cfg!(windows))
            .build()
        {
            Ok(glob) => MatcherImpl::Glob(glob.compile_matcher()),
            Err(err) => {
                debug!("term {term:?} is not a valid glob ({err}); matching literally");
                MatcherImpl::Literal(fold_case(term))
            }
        };

        Some(Self { inner })
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.inner {
            MatcherImpl::Glob(glob) => glob.is_match(name),
            MatcherImpl::Literal(needle) => fold_case(name).contains(needle.as_str()),
        }
    }
}

fn fold_case(input: &str) -> String {
    if cfg!(windows) {
        input.to_lowercase()
    } else {
        input.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(term: &str) -> NameMatcher {
        NameMatcher::new(term).expect("non-empty term")
    }

    #[test]
    fn empty_term_compiles_to_nothing() {
        assert!(NameMatcher::new("").is_none());
    }

    #[test]
    fn plain_term_matches_as_substring() {
        let m = matcher("port");
        assert!(m.matches("report.txt"));
        assert!(m.matches("port"));
        assert!(!m.matches("reply.txt"));
    }

    #[test]
    fn wildcards_in_the_term_stay_active() {
        let m = matcher("r?port");
        assert!(m.matches("report.txt"));
        assert!(m.matches("rapport"));
        assert!(!m.matches("rport"));
    }

    #[test]
    fn star_in_the_term_spans_arbitrary_text() {
        let m = matcher("inv*.pdf");
        assert!(m.matches("invoice-2024.pdf"));
        assert!(!m.matches("invoice-2024.txt"));
    }

    #[cfg(not(windows))]
    #[test]
    fn matching_is_case_sensitive_on_unix() {
        let m = matcher("Report");
        assert!(m.matches("Report.txt"));
        assert!(!m.matches("report.txt"));
    }

    #[test]
    fn invalid_glob_falls_back_to_literal_substring() {
        let m = matcher("[oops");
        assert!(m.matches("notes-[oops].txt"));
        assert!(!m.matches("notes.txt"));
    }
}
