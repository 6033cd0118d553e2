//! Per-page cache entries and their load state.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Observable state of a page entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageState {
  /// Never fetched
  Unloaded,
  /// Fetch in flight
  Loading,
  /// Loaded and within the TTL
  Loaded,
  /// Loaded but past the TTL; refetched on next request
  Stale,
  /// Last fetch failed
  Error,
}

/// A cached page. Items survive a failed refetch.
#[derive(Debug, Clone)]
pub struct PageEntry<T> {
  pub items: Vec<T>,
  pub is_loaded: bool,
  pub is_loading: bool,
  pub error: Option<String>,
  pub timestamp: Option<DateTime<Utc>>,
}

impl<T> Default for PageEntry<T> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      is_loaded: false,
      is_loading: false,
      error: None,
      timestamp: None,
    }
  }
}

impl<T> PageEntry<T> {
  /// Loaded and younger than `ttl`.
  pub fn is_valid(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
    self.is_loaded
      && self
        .timestamp
        .map(|t| now - t < ttl)
        .unwrap_or(false)
  }

  /// Whether this entry can be served without a backend call.
  pub fn is_servable(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
    self.is_valid(now, ttl) && self.error.is_none()
  }

  pub fn state(&self, now: DateTime<Utc>, ttl: Duration) -> PageState {
    if self.is_loading {
      PageState::Loading
    } else if self.error.is_some() {
      PageState::Error
    } else if self.is_valid(now, ttl) {
      PageState::Loaded
    } else if self.is_loaded {
      PageState::Stale
    } else {
      PageState::Unloaded
    }
  }

  pub fn mark_loading(&mut self) {
    self.is_loading = true;
  }

  /// The fetch was abandoned; the entry falls back to what it held before.
  pub fn clear_loading(&mut self) {
    self.is_loading = false;
  }

  pub fn mark_loaded(&mut self, items: Vec<T>, now: DateTime<Utc>) {
    self.items = items;
    self.is_loaded = true;
    self.is_loading = false;
    self.error = None;
    self.timestamp = Some(now);
  }

  pub fn mark_error(&mut self, message: String) {
    self.is_loading = false;
    self.error = Some(message);
  }
}
