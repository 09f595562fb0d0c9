//! FTS5 query building.
//!
//! Terms are passed through verbatim (apart from surrounding whitespace), so a term
//! that contains FTS5 syntax such as `OR` or `"` changes the meaning of the query.

use std::fmt;

/// Searchable column of the full-text table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryField {
    Content,
    Name,
    Extension,
}

impl QueryField {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryField::Content => "content",
            QueryField::Name => "name",
            QueryField::Extension => "extension",
        }
    }
}

/// A single `field:term` restriction, optionally prefix-matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryClause {
    pub field: QueryField,
    pub term: String,
    pub prefix: bool,
}

impl fmt::Display for QueryClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field.as_str(), self.term)?;
        if self.prefix {
            f.write_str("*")?;
        }
        Ok(())
    }
}

/// A non-empty conjunction of clauses.
///
/// There is no way to build an empty expression: `build_query` returns `None`
/// when both terms are blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExpression {
    clauses: Vec<QueryClause>,
}

impl QueryExpression {
    /// Start an expression from its first clause.
    pub fn new(first: QueryClause) -> Self {
        Self {
            clauses: vec![first],
        }
    }

    /// AND another clause onto the expression.
    pub fn and(mut self, clause: QueryClause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn clauses(&self) -> &[QueryClause] {
        &self.clauses
    }

    /// The MATCH string handed to SQLite.
    pub fn to_match_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

/// Build a query from the file-name and content search boxes.
///
/// - content term: `content:<term>`
/// - name term: `name:<term>*` (prefix match)
/// - both: `content:<term> AND name:<term>*`
/// - neither: `None`, meaning there is nothing to search for
///
/// Leading and trailing whitespace is trimmed from each term. Nothing else is
/// escaped or rewritten, so FTS5 syntax inside a term (quotes, `OR`, `NEAR`,
/// column filters) reaches the MATCH expression as typed.
pub fn build_query(name_term: &str, content_term: &str) -> Option<QueryExpression> {
    let name_term = name_term.trim();
    let content_term = content_term.trim();

    let mut clauses = Vec::new();
    if !content_term.is_empty() {
        clauses.push(QueryClause {
            field: QueryField::Content,
            term: content_term.to_string(),
            prefix: false,
        });
    }
    if !name_term.is_empty() {
        clauses.push(QueryClause {
            field: QueryField::Name,
            term: name_term.to_string(),
            prefix: true,
        });
    }

    let mut clauses = clauses.into_iter();
    let first = clauses.next()?;
    Some(clauses.fold(QueryExpression::new(first), QueryExpression::and))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built(name: &str, content: &str) -> Option<String> {
        build_query(name, content).map(|q| q.to_match_string())
    }

    #[test]
    fn test_build_query_empty() {
        assert_eq!(built("", ""), None);
        assert_eq!(built("   ", "\t"), None);
    }

    #[test]
    fn test_build_query_name_only() {
        assert_eq!(built("report", "").as_deref(), Some("name:report*"));
    }

    #[test]
    fn test_build_query_content_only() {
        assert_eq!(built("", "error").as_deref(), Some("content:error"));
    }

    #[test]
    fn test_build_query_both() {
        assert_eq!(
            built("report", "error").as_deref(),
            Some("content:error AND name:report*")
        );
    }

    #[test]
    fn test_build_query_trims_terms() {
        assert_eq!(built("  report ", "").as_deref(), Some("name:report*"));
    }

    #[test]
    fn test_build_query_passes_operators_through() {
        assert_eq!(
            built("", "alpha OR beta").as_deref(),
            Some("content:alpha OR beta")
        );
    }

    #[test]
    fn test_clauses_exposed_in_order() {
        let query = build_query("report", "error").unwrap();
        let fields: Vec<_> = query.clauses().iter().map(|c| c.field).collect();
        assert_eq!(fields, vec![QueryField::Content, QueryField::Name]);
    }

    #[test]
    fn test_manual_expression() {
        let query = QueryExpression::new(QueryClause {
            field: QueryField::Extension,
            term: "md".into(),
            prefix: false,
        });
        assert_eq!(query.to_string(), "extension:md");
    }
}
