use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;
use tracing::debug;

use super::model::{RawRecord, SortDirection, SortField};
use super::predicate::CompiledPredicate;
use crate::config::Config;

/// Ordering the engine would like; stores may ignore it since results are
/// re-sorted in memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHint {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Storage collaborator executing compiled predicates.
///
/// Implementations own retries, timeouts and pooling; the engine calls each
/// method at most once per request.
#[async_trait]
pub trait RecordStore: Send + Sync + Debug {
    /// Whether the store is configured and may be queried
    fn is_available(&self) -> bool;

    /// Number of rows matching the predicate
    async fn count(&self, predicate: &CompiledPredicate) -> Result<u64>;

    /// Rows matching the predicate
    async fn fetch(
        &self,
        predicate: &CompiledPredicate,
        order: OrderHint,
    ) -> Result<Vec<RawRecord>>;
}

/// In-memory store that interprets the `UPPER(col) LIKE UPPER(?)` dialect
/// produced by [`super::predicate::PredicateBuilder`].
///
/// Fragments are AND-ed; the `LIKE` conditions inside one fragment are OR-ed.
#[derive(Debug)]
pub struct MemoryStore {
    records: Vec<RawRecord>,
    title_column: String,
    body_column: String,
    available: bool,
    condition: Regex,
}

impl MemoryStore {
    pub fn new(records: Vec<RawRecord>, config: &Config) -> Result<Self> {
        let condition = Regex::new(r"UPPER\(([^()]+)\) LIKE UPPER\(\?\)")
            .context("Failed to compile predicate pattern")?;

        Ok(Self {
            records,
            title_column: config.title_column.clone(),
            body_column: config.body_column.clone(),
            available: config.datasource_enabled,
            condition,
        })
    }

    /// Load records from a JSON array file
    pub fn load<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read records from {path:?}"))?;
        let records: Vec<RawRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse records in {path:?}"))?;

        debug!("Loaded {} records from {:?}", records.len(), path);
        Self::new(records, config)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn matching(&self, predicate: &CompiledPredicate) -> Result<Vec<&RawRecord>> {
        let clauses = self.compile(predicate)?;
        Ok(self
            .records
            .iter()
            .filter(|record| {
                clauses.iter().all(|conditions| {
                    conditions
                        .iter()
                        .any(|(column, pattern)| self.column_matches(record, *column, pattern))
                })
            })
            .collect())
    }

    /// Pair every placeholder with its column and parameter, per fragment
    fn compile<'p>(
        &self,
        predicate: &'p CompiledPredicate,
    ) -> Result<Vec<Vec<(Column, &'p str)>>> {
        let mut parameters = predicate.parameters.iter();
        let mut clauses = Vec::with_capacity(predicate.fragments.len());

        for fragment in &predicate.fragments {
            let mut conditions = Vec::new();
            for captures in self.condition.captures_iter(fragment) {
                let name = captures.get(1).map_or("", |m| m.as_str());
                let column = self.resolve_column(name)?;
                let pattern = parameters
                    .next()
                    .with_context(|| format!("Missing parameter for column {name}"))?;
                conditions.push((column, pattern.as_str()));
            }
            if conditions.is_empty() {
                anyhow::bail!("Unsupported predicate fragment: {fragment}");
            }
            clauses.push(conditions);
        }

        if parameters.next().is_some() {
            anyhow::bail!("More parameters than placeholders");
        }

        Ok(clauses)
    }

    fn resolve_column(&self, name: &str) -> Result<Column> {
        if name == self.title_column {
            Ok(Column::Title)
        } else if name == self.body_column {
            Ok(Column::Body)
        } else {
            anyhow::bail!("Unknown column: {name}")
        }
    }

    fn column_matches(&self, record: &RawRecord, column: Column, pattern: &str) -> bool {
        let value = match column {
            Column::Title => record.title.as_deref(),
            Column::Body => record.body.as_deref(),
        };
        // NULL never matches LIKE
        value.is_some_and(|value| like_matches(value, pattern))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn count(&self, predicate: &CompiledPredicate) -> Result<u64> {
        Ok(self.matching(predicate)?.len() as u64)
    }

    async fn fetch(
        &self,
        predicate: &CompiledPredicate,
        order: OrderHint,
    ) -> Result<Vec<RawRecord>> {
        debug!("MemoryStore::fetch ignoring order hint {:?}", order);
        Ok(self.matching(predicate)?.into_iter().cloned().collect())
    }
}

#[derive(Debug, Clone, Copy)]
enum Column {
    Title,
    Body,
}

/// Case-insensitive SQL `LIKE`: `%` matches any run, `_` any single character
fn like_matches(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.to_uppercase().chars().collect();
    let pattern: Vec<char> = pattern.to_uppercase().chars().collect();

    let (mut v, mut p) = (0, 0);
    // Last `%` seen and the value position it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        match pattern.get(p) {
            Some('%') => {
                backtrack = Some((p, v));
                p += 1;
            }
            Some(&c) if c == '_' || c == value[v] => {
                p += 1;
                v += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    v = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::predicate::PredicateBuilder;
    use crate::search::query_parser::QueryParser;

    fn record(id: &str, title: &str, body: &str) -> RawRecord {
        RawRecord {
            id: id.to_string(),
            title: Some(title.to_string()),
            body: Some(body.to_string()),
            created: None,
        }
    }

    fn store(records: Vec<RawRecord>) -> MemoryStore {
        let config = Config {
            datasource_enabled: true,
            ..Config::default()
        };
        MemoryStore::new(records, &config).unwrap()
    }

    fn compile(keywords: &str) -> CompiledPredicate {
        PredicateBuilder::default().build(&QueryParser::parse(keywords))
    }

    #[test]
    fn test_like_matches() {
        assert!(like_matches("Breaking News", "%news%"));
        assert!(like_matches("news", "%NEWS%"));
        assert!(like_matches("abc", "a_c"));
        assert!(like_matches("", "%"));
        assert!(!like_matches("abc", "%d%"));
        assert!(!like_matches("abc", "ab"));
        assert!(like_matches("aXbXc", "%b%c"));
        assert!(like_matches("mississippi", "%iss%ppi"));
    }

    #[tokio::test]
    async fn test_and_of_or_groups() {
        let store = store(vec![
            record("1", "Alpha rising", "<Content>gamma ray</Content>"),
            record("2", "Beta", "<Content>no match</Content>"),
            record("3", "Other", "<Content>gamma only</Content>"),
        ]);

        let predicate = compile("alpha OR beta, gamma");
        assert_eq!(store.count(&predicate).await.unwrap(), 1);

        let rows = store.fetch(&predicate, OrderHint::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "1");
    }

    #[tokio::test]
    async fn test_null_columns_never_match() {
        let store = store(vec![RawRecord {
            id: "1".to_string(),
            title: None,
            body: None,
            created: None,
        }]);
        assert_eq!(store.count(&compile("anything")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_column_is_error() {
        let store = store(vec![record("1", "a", "b")]);
        let predicate = PredicateBuilder::new("x.TITLE", "x.BODY").build(&QueryParser::parse("a"));
        assert!(store.count(&predicate).await.is_err());
    }

    #[tokio::test]
    async fn test_parameter_mismatch_is_error() {
        let store = store(vec![record("1", "a", "b")]);
        let mut predicate = compile("a");
        predicate.parameters.push("%extra%".to_string());
        assert!(store.count(&predicate).await.is_err());

        predicate.parameters.truncate(1);
        assert!(store.count(&predicate).await.is_err());
    }

    #[test]
    fn test_availability_follows_config() {
        let disabled = MemoryStore::new(Vec::new(), &Config::default()).unwrap();
        assert!(!disabled.is_available());
        assert!(store(Vec::new()).is_available());
    }
}
