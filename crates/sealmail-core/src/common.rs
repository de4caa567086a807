//! Types shared by every use case: cache policy, pagination, list filters
//! and batch results.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Where a read is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CachePolicy {
    /// Serve from the local cache only; the backend is never contacted.
    CacheOnly,
    /// Fetch from the backend and write the result through to the cache.
    #[default]
    RemoteOnly,
}

/// One page of a list result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOutput<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Token for the next page, `None` on the last page.
    pub next_token: Option<String>,
}

impl<T> ListOutput<T> {
    /// Creates a page.
    #[must_use]
    pub const fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }

    /// A single, final page with no items.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(Vec::new(), None)
    }

    /// Maps the items, keeping the token.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ListOutput<U> {
        ListOutput {
            items: self.items.into_iter().map(f).collect(),
            next_token: self.next_token,
        }
    }
}

impl<T> Default for ListOutput<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Page request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Page size; the client's default page limit is used when `None`.
    pub limit: Option<u32>,
    /// Token returned by the previous page.
    pub next_token: Option<String>,
}

impl Pagination {
    /// First page of the given size.
    #[must_use]
    pub const fn with_limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            next_token: None,
        }
    }

    /// Returns a copy with the limit filled in from `default_limit`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the requested limit is zero.
    pub fn resolved(&self, default_limit: u32) -> Result<Self> {
        match self.limit {
            Some(0) => Err(Error::InvalidArgument(
                "limit must be greater than zero".to_string(),
            )),
            limit => Ok(Self {
                limit: Some(limit.unwrap_or(default_limit)),
                next_token: self.next_token.clone(),
            }),
        }
    }
}

/// Sort direction of list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

/// Inclusive date range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start of the range.
    pub start: DateTime<Utc>,
    /// End of the range.
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Creates a range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidArgument(
                "date range start must not be after its end".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Whether `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Overall outcome of a batch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchOperationStatus {
    /// Every item succeeded.
    Success,
    /// Some items succeeded and some failed.
    Partial,
    /// Every item failed.
    Failure,
}

/// Per-item outcome of a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOperationResult<S, F> {
    /// Derived from the success and failure counts.
    pub status: BatchOperationStatus,
    /// Items that succeeded.
    pub success_values: Vec<S>,
    /// Items that failed.
    pub failure_values: Vec<F>,
}

impl<S, F> BatchOperationResult<S, F> {
    /// Builds a result, deriving the status from the outcome counts.
    ///
    /// An empty batch counts as a success.
    #[must_use]
    pub fn new(success_values: Vec<S>, failure_values: Vec<F>) -> Self {
        let status = match (success_values.is_empty(), failure_values.is_empty()) {
            (_, true) => BatchOperationStatus::Success,
            (true, false) => BatchOperationStatus::Failure,
            (false, false) => BatchOperationStatus::Partial,
        };
        Self {
            status,
            success_values,
            failure_values,
        }
    }

    /// Splits a list of per-item results.
    pub fn from_results(results: impl IntoIterator<Item = std::result::Result<S, F>>) -> Self {
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(value) => successes.push(value),
                Err(failure) => failures.push(failure),
            }
        }
        Self::new(successes, failures)
    }
}

/// Why one id in a batch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessageOperationFailure {
    /// The id that failed.
    pub id: String,
    /// Error type name, see [`Error::error_type`].
    pub error_type: String,
}

impl EmailMessageOperationFailure {
    /// Creates a failure entry.
    #[must_use]
    pub fn new(id: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            error_type: error_type.into(),
        }
    }

    /// Records `error` against `id`.
    #[must_use]
    pub fn from_error(id: impl Into<String>, error: &Error) -> Self {
        Self::new(id, error.error_type())
    }
}

/// Deduplicates batch ids, keeping first occurrences in order, and checks
/// the batch against `limit`.
pub(crate) fn unique_batch_ids(ids: &[String], limit: u32, what: &str) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let unique: Vec<String> = ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect();

    if unique.is_empty() || unique.iter().any(String::is_empty) {
        return Err(Error::InvalidArgument(format!(
            "at least one non-empty {what} id is required"
        )));
    }
    if unique.len() > limit as usize {
        return Err(Error::LimitExceeded(format!(
            "{} {what} ids exceed the limit of {limit}",
            unique.len()
        )));
    }
    Ok(unique)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_batch_status_is_derived() {
        let result: BatchOperationResult<u8, u8> = BatchOperationResult::new(vec![1], vec![]);
        assert_eq!(result.status, BatchOperationStatus::Success);

        let result: BatchOperationResult<u8, u8> = BatchOperationResult::new(vec![1], vec![2]);
        assert_eq!(result.status, BatchOperationStatus::Partial);

        let result: BatchOperationResult<u8, u8> = BatchOperationResult::new(vec![], vec![2]);
        assert_eq!(result.status, BatchOperationStatus::Failure);

        let result: BatchOperationResult<u8, u8> = BatchOperationResult::new(vec![], vec![]);
        assert_eq!(result.status, BatchOperationStatus::Success);
    }

    #[test]
    fn test_batch_from_results() {
        let result = BatchOperationResult::from_results(vec![Ok("a"), Err("b"), Ok("c")]);
        assert_eq!(result.status, BatchOperationStatus::Partial);
        assert_eq!(result.success_values, vec!["a", "c"]);
        assert_eq!(result.failure_values, vec!["b"]);
    }

    #[test]
    fn test_unique_batch_ids() {
        let unique = unique_batch_ids(&ids(&["a", "b", "a", " b "]), 10, "message").unwrap();
        assert_eq!(unique, ids(&["a", "b"]));

        assert!(matches!(
            unique_batch_ids(&[], 10, "message"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            unique_batch_ids(&ids(&["a", ""]), 10, "message"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            unique_batch_ids(&ids(&["a", "b", "c"]), 2, "message"),
            Err(Error::LimitExceeded(_))
        ));
        // duplicates do not count against the limit
        assert!(unique_batch_ids(&ids(&["a", "a", "b"]), 2, "message").is_ok());
    }

    #[test]
    fn test_pagination_resolved() {
        let page = Pagination::default().resolved(25).unwrap();
        assert_eq!(page.limit, Some(25));
        assert_eq!(Pagination::with_limit(5).resolved(25).unwrap().limit, Some(5));
        assert!(Pagination::with_limit(0).resolved(25).is_err());
    }

    #[test]
    fn test_date_range() {
        let now = Utc::now();
        let range = DateRange::new(now - Duration::hours(1), now).unwrap();
        assert!(range.contains(now));
        assert!(!range.contains(now + Duration::seconds(1)));
        assert!(DateRange::new(now, now - Duration::hours(1)).is_err());
    }
}
