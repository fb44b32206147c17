//! Suggested compliance queries offered as one-click checks.

/// A canned compliance query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestedQuery {
    /// Short identifier used on the command line.
    pub slug: &'static str,
    pub query: &'static str,
}

pub static SUGGESTED_QUERIES: [SuggestedQuery; 6] = [
    SuggestedQuery {
        slug: "parties",
        query: "Are the contracting parties clearly identified?",
    },
    SuggestedQuery {
        slug: "effective-dates",
        query: "Do contracts specify effective dates?",
    },
    SuggestedQuery {
        slug: "termination",
        query: "What are the termination provisions in the contracts?",
    },
    SuggestedQuery {
        slug: "governing-law",
        query: "Are governing law clauses present?",
    },
    SuggestedQuery {
        slug: "liability",
        query: "Do contracts define liability caps?",
    },
    SuggestedQuery {
        slug: "ip-ownership",
        query: "Are IP ownership terms clearly defined?",
    },
];

/// Look up a suggested query by slug (case-insensitive).
pub fn find(slug: &str) -> Option<&'static SuggestedQuery> {
    SUGGESTED_QUERIES
        .iter()
        .find(|q| q.slug.eq_ignore_ascii_case(slug.trim()))
}
