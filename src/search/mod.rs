// Module declarations
pub mod content_extractor;
pub mod error;
pub mod highlighter;
pub mod model;
pub mod predicate;
pub mod query_parser;
pub mod scorer;
pub mod service;
pub mod store;

// Re-export public APIs
pub use content_extractor::{ContentExtractor, NO_CONTENT};
pub use error::{Outcome, SearchError, ValidationError};
pub use highlighter::Highlighter;
pub use model::{PageResult, RawRecord, SearchRequest, SearchResult, SortDirection, SortField};
pub use predicate::{CompiledPredicate, PredicateBuilder};
pub use query_parser::{Keyword, QueryExpression, QueryGroup, QueryParser};
pub use scorer::RelevanceScorer;
pub use service::SearchService;
pub use store::{MemoryStore, OrderHint, RecordStore};
