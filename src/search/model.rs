use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::ValidationError;

/// Field the result list is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Relevance,
    Title,
    Created,
}

impl FromStr for SortField {
    type Err = std::convert::Infallible;

    /// Unrecognized names fall back to relevance
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "NAME" | "TITLE" => SortField::Title,
            "CREATED" => SortField::Created,
            _ => SortField::Relevance,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl FromStr for SortDirection {
    type Err = std::convert::Infallible;

    /// Anything other than an ascending spelling means descending
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "ASC" | "ASCENDING" => SortDirection::Ascending,
            _ => SortDirection::Descending,
        })
    }
}

/// A search request. Pages are zero-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub keywords: String,
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default)]
    pub sort_field: SortField,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

fn default_size() -> usize {
    10
}

impl SearchRequest {
    pub fn new(keywords: impl Into<String>, page: usize, size: usize) -> Self {
        Self {
            keywords: keywords.into(),
            page,
            size,
            sort_field: SortField::default(),
            sort_direction: SortDirection::default(),
        }
    }

    pub fn sorted_by(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort_field = field;
        self.sort_direction = direction;
        self
    }

    /// Keywords must be non-blank and the page size positive
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.keywords.trim().is_empty() {
            return Err(ValidationError::BlankKeywords);
        }
        if self.size == 0 {
            return Err(ValidationError::InvalidPageSize);
        }
        Ok(())
    }
}

/// A row as handed over by the storage collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Embedded XML body, unparsed
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

/// One scored, highlighted hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    /// Title with keyword markers; `None` when the record has no title
    pub title: Option<String>,
    /// Plain text extracted from the body
    pub content: String,
    pub highlighted_content: String,
    pub created: Option<DateTime<Utc>>,
    pub score: f64,
}

/// One page of a larger, already sorted result list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub content: Vec<T>,
    /// Zero-based page index
    pub number: usize,
    pub size: usize,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> PageResult<T> {
    /// Build page metadata around an already sliced `content`
    pub fn new(content: Vec<T>, total_elements: u64, number: usize, size: usize) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(size as u64)
        };
        let next = (number as u64).saturating_add(1);

        Self {
            content,
            number,
            size,
            total_elements,
            total_pages,
            first: number == 0,
            last: next >= total_pages,
            has_next: next < total_pages,
            has_previous: number > 0,
        }
    }

    pub fn empty(number: usize, size: usize) -> Self {
        Self::new(Vec::new(), 0, number, size)
    }

    /// Slice `[page * size, min(page * size + size, len))` out of the full
    /// list. Out-of-range pages are empty but keep `total_elements`.
    pub fn paginate(items: Vec<T>, total_elements: u64, number: usize, size: usize) -> Self {
        let start = number.saturating_mul(size);
        let content = if start >= items.len() {
            Vec::new()
        } else {
            let end = start.saturating_add(size).min(items.len());
            items.into_iter().skip(start).take(end - start).collect()
        };

        Self::new(content, total_elements, number, size)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
