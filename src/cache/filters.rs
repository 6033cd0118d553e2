//! Search, status, and sort criteria applied over a full result set.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::traits::Listable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  #[default]
  Asc,
  Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
  pub field: String,
  pub order: SortOrder,
}

/// Current list criteria. `status == None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilters {
  pub search_query: String,
  pub status_filter: Option<String>,
  pub sort: Option<SortSpec>,
}

impl ListFilters {
  /// Normalize raw query-string values: blank search and `all` status are unset.
  pub fn new(search: Option<&str>, status: Option<&str>, sort: Option<SortSpec>) -> Self {
    Self {
      search_query: search.map(|s| s.trim().to_string()).unwrap_or_default(),
      status_filter: status
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty() && s != "all"),
      sort,
    }
  }

  pub fn matches<T: Listable>(&self, item: &T) -> bool {
    self.matches_search(item) && self.matches_status(item)
  }

  fn matches_search<T: Listable>(&self, item: &T) -> bool {
    if self.search_query.is_empty() {
      return true;
    }
    let needle = self.search_query.to_lowercase();
    item
      .search_fields()
      .iter()
      .any(|field| field.to_lowercase().contains(&needle))
  }

  fn matches_status<T: Listable>(&self, item: &T) -> bool {
    match &self.status_filter {
      None => true,
      Some(wanted) => item
        .status()
        .map(|s| s.eq_ignore_ascii_case(wanted))
        .unwrap_or(false),
    }
  }

  /// Filter then sort. The sort is stable, so ties keep backend order.
  pub fn apply<T: Listable>(&self, items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = items.into_iter().filter(|i| self.matches(i)).collect();
    if let Some(sort) = &self.sort {
      out.sort_by(|a, b| {
        let ord = a.compare_by(b, &sort.field);
        match sort.order {
          SortOrder::Asc => ord,
          SortOrder::Desc => ord.reverse(),
        }
      });
    }
    out
  }

  /// Stable, fixed-length key for the entity type and these criteria.
  pub fn cache_hash(&self, entity_type: &str) -> String {
    let sort = self
      .sort
      .as_ref()
      .map(|s| format!("{}:{:?}", s.field, s.order))
      .unwrap_or_default();
    let input = format!(
      "{}:{}:{}:{}",
      entity_type,
      self.search_query.to_lowercase(),
      self.status_filter.as_deref().unwrap_or("all"),
      sort
    );

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }
}
