//! Serde types matching the Oracle listing API responses.

use serde::{Deserialize, Deserializer, Serialize};

use super::types::{Client, ContractRow};

// ============================================================================
// Clients endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiClientsResponse {
  pub data: ApiClientsData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClientsData {
  #[serde(default)]
  pub clients: Vec<Client>,
  #[serde(default)]
  pub total_items: u64,
  #[serde(default = "first_page")]
  pub current_page: u32,
  #[serde(default = "first_page")]
  pub total_pages: u32,
}

// ============================================================================
// Contracts full-hierarchy endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiContractsResponse {
  pub data: ApiContractsData,
}

#[derive(Debug, Deserialize)]
pub struct ApiContractsData {
  #[serde(default)]
  pub contracts: Vec<ContractRow>,
  #[serde(default)]
  pub pagination: ApiPagination,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPagination {
  #[serde(default)]
  pub total: u64,
  #[serde(default)]
  pub total_pages: u32,
}

fn first_page() -> u32 {
  1
}

// ============================================================================
// Helpers
// ============================================================================

/// Oracle NUMBER columns arrive as JSON numbers, VARCHAR ids as strings.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  scalar_to_string(value).ok_or_else(|| serde::de::Error::custom("expected string or number"))
}

pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  Ok(scalar_to_string(value).filter(|s| !s.is_empty()))
}

fn scalar_to_string(value: serde_json::Value) -> Option<String> {
  match value {
    serde_json::Value::String(s) => Some(s),
    serde_json::Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}
