//! Core traits and types for the page cache.

use serde::Serialize;
use std::cmp::Ordering;

/// Trait for records the page cache can filter, sort, and page.
pub trait Listable: Clone + Send + Sync + Serialize + 'static {
  /// Entity type name, used in cache keys and logs (e.g., "client")
  fn entity_type() -> &'static str;

  /// Field values matched by the search query.
  fn search_fields(&self) -> Vec<&str>;

  /// Status value matched by the status filter, if the record has one.
  fn status(&self) -> Option<&str>;

  /// Field names accepted by `compare_by`.
  fn sort_fields() -> &'static [&'static str];

  /// Ascending comparison on `field`. Unknown fields compare equal.
  fn compare_by(&self, other: &Self, field: &str) -> Ordering;
}

/// Indicates where a served page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
  /// Fetched from the backend for this request
  Network,
  /// Valid cached page, no backend call made
  Cache,
}

/// Case-insensitive comparison of optional text, missing values first.
pub fn compare_text(a: Option<&str>, b: Option<&str>) -> Ordering {
  match (a, b) {
    (Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
    (None, Some(_)) => Ordering::Less,
    (Some(_), None) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_compare_text() {
    assert_eq!(compare_text(Some("abc"), Some("ABD")), Ordering::Less);
    assert_eq!(compare_text(Some("Same"), Some("same")), Ordering::Equal);
    assert_eq!(compare_text(None, Some("a")), Ordering::Less);
  }
}
