//! Read-only query guard.
//!
//! Both checks run before any network call. Keyword matching is on whole
//! words, case-insensitive, so `created_at` never trips the guard.

use crate::error::GraphError;

/// Keywords that indicate a write operation.
const WRITE_KEYWORDS: &[&str] = &[
    "create", "set", "delete", "remove", "merge", "detach", "drop", "foreach",
];

fn words(query: &str) -> impl Iterator<Item = String> + '_ {
    query
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

/// Reject queries containing any mutating keyword, and require at least
/// one read clause (`MATCH` or `RETURN`).
pub fn check_read_only(query: &str) -> Result<(), GraphError> {
    let mut has_read_clause = false;
    for word in words(query) {
        if let Some(keyword) = WRITE_KEYWORDS.iter().find(|k| **k == word) {
            return Err(GraphError::UnsafeQuery(keyword.to_uppercase()));
        }
        if word == "match" || word == "return" {
            has_read_clause = true;
        }
    }
    if !has_read_clause {
        return Err(GraphError::MissingReadClause);
    }
    Ok(())
}

/// Require that the query text references both `$skip` and `$limit`.
pub fn check_pagination_params(query: &str) -> Result<(), GraphError> {
    let lower = query.to_lowercase();
    if !lower.contains("$skip") {
        return Err(GraphError::MissingPaginationParameter("$skip"));
    }
    if !lower.contains("$limit") {
        return Err(GraphError::MissingPaginationParameter("$limit"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_query_passes() {
        assert!(check_read_only("MATCH (n:Product) RETURN n.sku SKIP $skip LIMIT $limit").is_ok());
    }

    #[test]
    fn test_write_keywords_rejected() {
        for query in [
            "CREATE (n:Product)",
            "MATCH (n) SET n.x = 1 RETURN n",
            "MATCH (n) DELETE n",
            "MATCH (n) REMOVE n.x RETURN n",
            "MERGE (n:Product) RETURN n",
            "MATCH (n) DETACH DELETE n",
            "DROP INDEX ON :Product(sku)",
            "FOREACH (x IN [1] | CREATE (:N))",
        ] {
            assert!(
                matches!(check_read_only(query), Err(GraphError::UnsafeQuery(_))),
                "expected rejection for: {query}"
            );
        }
    }

    #[test]
    fn test_whole_word_matching() {
        // Substrings of write keywords must not trip the guard.
        assert!(check_read_only(
            "MATCH (n) WHERE n.created_at > $since RETURN n.dataset SKIP $skip LIMIT $limit"
        )
        .is_ok());
    }

    #[test]
    fn test_case_insensitive() {
        assert!(matches!(
            check_read_only("match (n) delete n"),
            Err(GraphError::UnsafeQuery(_))
        ));
    }

    #[test]
    fn test_missing_read_clause() {
        assert!(matches!(
            check_read_only("SHOW INDEXES"),
            Err(GraphError::MissingReadClause)
        ));
    }

    #[test]
    fn test_pagination_params_present() {
        assert!(check_pagination_params("RETURN 1 SKIP $skip LIMIT $limit").is_ok());
        assert!(check_pagination_params("RETURN 1 SKIP $SKIP LIMIT $LIMIT").is_ok());
    }

    #[test]
    fn test_missing_skip() {
        assert!(matches!(
            check_pagination_params("RETURN 1 LIMIT $limit"),
            Err(GraphError::MissingPaginationParameter("$skip"))
        ));
    }

    #[test]
    fn test_missing_limit() {
        assert!(matches!(
            check_pagination_params("RETURN 1 SKIP $skip"),
            Err(GraphError::MissingPaginationParameter("$limit"))
        ));
    }
}
