use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::content_extractor::{ContentExtractor, NO_CONTENT};
use super::error::{Outcome, SearchError, ValidationError};
use super::highlighter::Highlighter;
use super::model::{PageResult, RawRecord, SearchRequest, SearchResult, SortDirection, SortField};
use super::predicate::{CompiledPredicate, PredicateBuilder};
use super::query_parser::{Keyword, QueryParser};
use super::scorer::RelevanceScorer;
use super::store::{OrderHint, RecordStore};
use crate::config::Config;

/// Runs a keyword search end to end: parse, compile, query the store, then
/// extract, score, highlight, sort and paginate in memory.
///
/// Holds no per-request state and can be shared across tasks.
#[derive(Debug, Clone)]
pub struct SearchService {
    store: Arc<dyn RecordStore>,
    builder: PredicateBuilder,
    extractor: ContentExtractor,
    scorer: RelevanceScorer,
    highlighter: Highlighter,
}

/// A result paired with the unmarked title it is sorted by
struct Ranked {
    title: Option<String>,
    result: SearchResult,
}

impl SearchService {
    pub fn new(store: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self {
            store,
            builder: PredicateBuilder::from_config(config),
            extractor: ContentExtractor::from_config(config),
            scorer: RelevanceScorer::new(),
            highlighter: Highlighter::from_config(config),
        }
    }

    /// Search and return one page of results.
    ///
    /// Request problems and an unavailable store produce an empty page inside
    /// the matching [`Outcome`] variant; only storage failures are errors.
    pub async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<Outcome<PageResult<SearchResult>>, SearchError> {
        info!(
            "Searching keywords: '{}', page: {}, size: {}",
            request.keywords, request.page, request.size
        );
        let empty = || PageResult::empty(request.page, request.size);

        if let Err(reason) = request.validate() {
            warn!("Rejected search request: {}", reason);
            return Ok(Outcome::Rejected {
                reason,
                fallback: empty(),
            });
        }

        let (keywords, predicate) = match self.compile(&request.keywords) {
            Ok(compiled) => compiled,
            Err(reason) => {
                warn!("Rejected search request: {}", reason);
                return Ok(Outcome::Rejected {
                    reason,
                    fallback: empty(),
                });
            }
        };

        if !self.store.is_available() {
            warn!("Datasource not available, search skipped");
            return Ok(Outcome::Unavailable { fallback: empty() });
        }

        let total = self
            .store
            .count(&predicate)
            .await
            .map_err(|e| SearchError::storage("count", e))?;

        if total == 0 {
            info!("No matching records");
            return Ok(Outcome::Completed(empty()));
        }

        let order = OrderHint {
            field: request.sort_field,
            direction: request.sort_direction,
        };
        let records = self
            .store
            .fetch(&predicate, order)
            .await
            .map_err(|e| SearchError::storage("fetch", e))?;
        debug!("Fetched {} rows for {} counted", records.len(), total);

        let mut ranked: Vec<Ranked> = records
            .into_iter()
            .map(|record| self.assemble(record, &keywords))
            .collect();
        sort_ranked(&mut ranked, request.sort_field, request.sort_direction);

        let results = ranked.into_iter().map(|r| r.result).collect();
        let page = PageResult::paginate(results, total, request.page, request.size);

        info!("Search finished, {} results in total", total);
        Ok(Outcome::Completed(page))
    }

    /// Count matches without fetching rows, along the same path as `search`
    pub async fn count(&self, keywords: &str) -> Result<Outcome<u64>, SearchError> {
        info!("Counting keywords: '{}'", keywords);

        let predicate = match self.compile(keywords) {
            Ok((_, predicate)) => predicate,
            Err(reason) => {
                warn!("Rejected count request: {}", reason);
                return Ok(Outcome::Rejected {
                    reason,
                    fallback: 0,
                });
            }
        };

        if !self.store.is_available() {
            warn!("Datasource not available, count skipped");
            return Ok(Outcome::Unavailable { fallback: 0 });
        }

        let total = self
            .store
            .count(&predicate)
            .await
            .map_err(|e| SearchError::storage("count", e))?;

        info!("Count finished, {} results", total);
        Ok(Outcome::Completed(total))
    }

    fn compile(
        &self,
        keywords: &str,
    ) -> Result<(Vec<Keyword>, CompiledPredicate), ValidationError> {
        if keywords.trim().is_empty() {
            return Err(ValidationError::BlankKeywords);
        }

        let expression = QueryParser::parse(keywords);
        if expression.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        debug!("Parsed query: {}", expression);

        Ok((expression.flatten(), self.builder.build(&expression)))
    }

    fn assemble(&self, record: RawRecord, keywords: &[Keyword]) -> Ranked {
        // A NULL body is treated like an empty one
        let extracted = self
            .extractor
            .try_extract(record.body.as_deref().unwrap_or(""));
        let title = record.title.as_deref().unwrap_or("");

        // The placeholder is neither scored nor highlighted
        let (content, highlighted_content, score) = match extracted {
            Some(content) => {
                let score = self.scorer.score(title, &content, keywords);
                let highlighted = self.highlighter.highlight(&content, keywords);
                (content, highlighted, score)
            }
            None => {
                let score = self.scorer.score(title, "", keywords);
                (NO_CONTENT.to_string(), NO_CONTENT.to_string(), score)
            }
        };
        let highlighted_title = record
            .title
            .as_deref()
            .map(|t| self.highlighter.highlight(t, keywords));

        Ranked {
            title: record.title,
            result: SearchResult {
                id: record.id,
                title: highlighted_title,
                content,
                highlighted_content,
                created: record.created,
                score,
            },
        }
    }
}

/// Stable sort; missing titles and timestamps go last in either direction
fn sort_ranked(ranked: &mut [Ranked], field: SortField, direction: SortDirection) {
    let directed = |ordering: Ordering| match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    };

    match field {
        SortField::Title => {
            ranked.sort_by(|a, b| nulls_last(a.title.as_ref(), b.title.as_ref(), &directed))
        }
        SortField::Created => ranked.sort_by(|a, b| {
            nulls_last(a.result.created.as_ref(), b.result.created.as_ref(), &directed)
        }),
        SortField::Relevance => {
            ranked.sort_by(|a, b| directed(a.result.score.total_cmp(&b.result.score)))
        }
    }
}

fn nulls_last<T: Ord>(
    a: Option<&T>,
    b: Option<&T>,
    directed: impl Fn(Ordering) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => directed(a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
