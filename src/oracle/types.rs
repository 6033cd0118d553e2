use serde::{Deserialize, Deserializer, Serialize};

use super::api_types::{opt_string_or_number, string_or_number};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
  Active,
  Inactive,
  /// Missing or unrecognized on the wire
  #[default]
  Unknown,
}

impl ClientStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Inactive => "inactive",
      Self::Unknown => "unknown",
    }
  }
}

/// Case-insensitive; one odd row must not fail the whole listing.
fn lenient_status<'de, D>(deserializer: D) -> Result<ClientStatus, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  let status = match value.as_ref().and_then(|v| v.as_str()).map(str::trim) {
    Some(s) if s.eq_ignore_ascii_case("active") => ClientStatus::Active,
    Some(s) if s.eq_ignore_ascii_case("inactive") => ClientStatus::Inactive,
    _ => ClientStatus::Unknown,
  };
  Ok(status)
}

/// Client record as listed by the Oracle API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
  #[serde(rename = "ID", deserialize_with = "string_or_number")]
  pub id: String,
  #[serde(default)]
  pub company_name: String,
  #[serde(default)]
  pub short_name: String,
  #[serde(default)]
  pub client_number: String,
  #[serde(default)]
  pub citizenship: String,
  pub date_open: Option<String>,
  #[serde(default, deserialize_with = "lenient_status")]
  pub status: ClientStatus,
  #[serde(default)]
  pub contracts_count: u32,
}

/// Flat contract row from the full-hierarchy listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ContractRow {
  #[serde(deserialize_with = "string_or_number")]
  pub id: String,
  #[serde(default, deserialize_with = "opt_string_or_number")]
  pub contract_number: Option<String>,
  #[serde(default, deserialize_with = "opt_string_or_number")]
  pub card_number: Option<String>,
  #[serde(default)]
  pub contract_name: Option<String>,
  #[serde(default)]
  pub client_name: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub date_open: Option<String>,
  #[serde(default, deserialize_with = "opt_string_or_number")]
  pub liab_contract: Option<String>,
  #[serde(
    rename = "ACNT_CONTRACT__OID",
    default,
    deserialize_with = "opt_string_or_number"
  )]
  pub acnt_contract_oid: Option<String>,
}
