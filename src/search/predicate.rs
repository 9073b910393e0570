use serde::{Deserialize, Serialize};

use super::query_parser::{Keyword, QueryExpression};

/// A WHERE-clause split into AND-ed fragments plus its positional parameters.
///
/// Fragments hold only `?` placeholders; keyword text lives exclusively in
/// `parameters`, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledPredicate {
    pub fragments: Vec<String>,
    pub parameters: Vec<String>,
}

impl CompiledPredicate {
    /// The fragments joined into a single condition
    pub fn where_clause(&self) -> String {
        self.fragments.join(" AND ")
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Compiles a [`QueryExpression`] into case-insensitive `LIKE` predicates.
///
/// The column expressions are written into the SQL text verbatim and must come
/// from trusted configuration (see [`crate::config::Config::validate`]); user
/// keywords only ever reach `parameters`.
#[derive(Debug, Clone)]
pub struct PredicateBuilder {
    title_column: String,
    body_column: String,
}

impl PredicateBuilder {
    pub fn new(title_column: impl Into<String>, body_column: impl Into<String>) -> Self {
        Self {
            title_column: title_column.into(),
            body_column: body_column.into(),
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(&config.title_column, &config.body_column)
    }

    /// One fragment per group; keywords inside a group are OR-ed, and each
    /// keyword contributes a title parameter followed by a body parameter.
    pub fn build(&self, expression: &QueryExpression) -> CompiledPredicate {
        let mut compiled = CompiledPredicate::default();

        for group in expression.groups() {
            let conditions: Vec<String> = group
                .terms()
                .iter()
                .map(|keyword| self.keyword_condition(keyword, &mut compiled.parameters))
                .collect();
            compiled
                .fragments
                .push(format!("({})", conditions.join(" OR ")));
        }

        compiled
    }

    fn keyword_condition(&self, keyword: &Keyword, parameters: &mut Vec<String>) -> String {
        let pattern = format!("%{}%", keyword.as_str());
        parameters.push(pattern.clone());
        parameters.push(pattern);
        format!(
            "(UPPER({}) LIKE UPPER(?) OR UPPER({}) LIKE UPPER(?))",
            self.title_column, self.body_column
        )
    }
}

impl Default for PredicateBuilder {
    fn default() -> Self {
        Self::from_config(&crate::config::Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::query_parser::QueryParser;

    fn builder() -> PredicateBuilder {
        PredicateBuilder::new("title", "body")
    }

    #[test]
    fn test_single_keyword() {
        let compiled = builder().build(&QueryParser::parse("alpha"));
        assert_eq!(
            compiled.fragments,
            vec!["((UPPER(title) LIKE UPPER(?) OR UPPER(body) LIKE UPPER(?)))"]
        );
        assert_eq!(compiled.parameters, vec!["%alpha%", "%alpha%"]);
    }

    #[test]
    fn test_or_group_and_second_group() {
        let compiled = builder().build(&QueryParser::parse("alpha OR beta, gamma"));
        let pair = "(UPPER(title) LIKE UPPER(?) OR UPPER(body) LIKE UPPER(?))";

        assert_eq!(compiled.fragments.len(), 2);
        assert_eq!(compiled.fragments[0], format!("({pair} OR {pair})"));
        assert_eq!(compiled.fragments[1], format!("({pair})"));
        assert_eq!(
            compiled.where_clause(),
            format!("({pair} OR {pair}) AND ({pair})")
        );
        assert_eq!(
            compiled.parameters,
            vec!["%alpha%", "%alpha%", "%beta%", "%beta%", "%gamma%", "%gamma%"]
        );
    }

    #[test]
    fn test_keyword_never_interpolated() {
        let compiled = builder().build(&QueryParser::parse("'; DROP TABLE news; --"));
        for fragment in &compiled.fragments {
            assert!(!fragment.contains("DROP"));
        }
        assert!(compiled.parameters.iter().any(|p| p.contains("DROP")));
    }

    #[test]
    fn test_placeholder_count_matches_parameters() {
        let compiled = builder().build(&QueryParser::parse("a OR b OR c, d e"));
        let placeholders: usize = compiled
            .fragments
            .iter()
            .map(|f| f.matches('?').count())
            .sum();
        assert_eq!(placeholders, compiled.parameters.len());
    }

    #[test]
    fn test_empty_expression() {
        let compiled = builder().build(&QueryParser::parse(""));
        assert!(compiled.is_empty());
        assert!(compiled.parameters.is_empty());
        assert_eq!(compiled.where_clause(), "");
    }
}
