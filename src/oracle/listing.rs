//! Page cache support for Oracle records.

use std::cmp::Ordering;

use crate::cache::{compare_text, Listable};

use super::types::{Client, ContractRow};

// ============================================================================
// Listable implementations
// ============================================================================

impl Listable for Client {
  fn entity_type() -> &'static str {
    "client"
  }

  fn search_fields(&self) -> Vec<&str> {
    vec![
      self.company_name.as_str(),
      self.short_name.as_str(),
      self.client_number.as_str(),
    ]
  }

  fn status(&self) -> Option<&str> {
    Some(self.status.as_str())
  }

  fn sort_fields() -> &'static [&'static str] {
    &[
      "companyName",
      "shortName",
      "clientNumber",
      "dateOpen",
      "contractsCount",
      "status",
    ]
  }

  fn compare_by(&self, other: &Self, field: &str) -> Ordering {
    match field {
      "companyName" => compare_text(Some(self.company_name.as_str()), Some(other.company_name.as_str())),
      "shortName" => compare_text(Some(self.short_name.as_str()), Some(other.short_name.as_str())),
      "clientNumber" => self.client_number.cmp(&other.client_number),
      // ISO dates order lexically
      "dateOpen" => self.date_open.cmp(&other.date_open),
      "contractsCount" => self.contracts_count.cmp(&other.contracts_count),
      "status" => self.status.as_str().cmp(other.status.as_str()),
      _ => Ordering::Equal,
    }
  }
}

impl Listable for ContractRow {
  fn entity_type() -> &'static str {
    "contract"
  }

  fn search_fields(&self) -> Vec<&str> {
    [
      &self.contract_number,
      &self.card_number,
      &self.contract_name,
      &self.client_name,
    ]
    .into_iter()
    .filter_map(|f| f.as_deref())
    .collect()
  }

  fn status(&self) -> Option<&str> {
    self.status.as_deref()
  }

  fn sort_fields() -> &'static [&'static str] {
    &[
      "contractNumber",
      "contractName",
      "clientName",
      "dateOpen",
      "status",
    ]
  }

  fn compare_by(&self, other: &Self, field: &str) -> Ordering {
    match field {
      "contractNumber" => self.contract_number.cmp(&other.contract_number),
      "contractName" => compare_text(self.contract_name.as_deref(), other.contract_name.as_deref()),
      "clientName" => compare_text(self.client_name.as_deref(), other.client_name.as_deref()),
      "dateOpen" => self.date_open.cmp(&other.date_open),
      "status" => compare_text(self.status.as_deref(), other.status.as_deref()),
      _ => Ordering::Equal,
    }
  }
}
