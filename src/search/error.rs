use serde::Serialize;
use thiserror::Error;

/// Request problems that are answered with an empty result, never a crash
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationError {
    #[error("keywords must not be blank")]
    BlankKeywords,

    #[error("page size must be greater than zero")]
    InvalidPageSize,

    #[error("keywords contain no searchable terms")]
    EmptyQuery,
}

/// Failures that abort a search
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("storage {operation} failed: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl SearchError {
    pub(crate) fn storage(operation: &'static str, source: anyhow::Error) -> Self {
        SearchError::Storage {
            operation,
            source: source.into(),
        }
    }
}

/// How a search or count ended when it did not fail outright.
///
/// Each non-completed variant still carries a well-formed empty value so
/// callers that only need something to render can use [`Outcome::value`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The query ran; the value may legitimately be empty
    Completed(T),
    /// The storage collaborator is not configured or reachable
    Unavailable { fallback: T },
    /// The request itself was unusable
    Rejected { reason: ValidationError, fallback: T },
}

impl<T> Outcome<T> {
    pub fn value(&self) -> &T {
        match self {
            Outcome::Completed(value) => value,
            Outcome::Unavailable { fallback } => fallback,
            Outcome::Rejected { fallback, .. } => fallback,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Completed(value) => value,
            Outcome::Unavailable { fallback } => fallback,
            Outcome::Rejected { fallback, .. } => fallback,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Outcome::Unavailable { .. })
    }

    pub fn rejection(&self) -> Option<ValidationError> {
        match self {
            Outcome::Rejected { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let done: Outcome<u64> = Outcome::Completed(4);
        assert!(done.is_completed());
        assert_eq!(*done.value(), 4);

        let down: Outcome<u64> = Outcome::Unavailable { fallback: 0 };
        assert!(down.is_unavailable());
        assert_eq!(down.rejection(), None);

        let bad: Outcome<u64> = Outcome::Rejected {
            reason: ValidationError::EmptyQuery,
            fallback: 0,
        };
        assert_eq!(bad.rejection(), Some(ValidationError::EmptyQuery));
        assert_eq!(bad.into_value(), 0);
    }

    #[test]
    fn test_storage_error_message() {
        let err = SearchError::storage("count", anyhow::anyhow!("connection refused"));
        assert_eq!(err.to_string(), "storage count failed: connection refused");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_outcome_serializes_status() {
        let json = serde_json::to_value(Outcome::Unavailable { fallback: 0u64 }).unwrap();
        assert_eq!(json["status"], "unavailable");
    }
}
