use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::api_types::{ApiClientsData, ApiClientsResponse, ApiContractsData, ApiContractsResponse};
use super::types::{Client, ContractRow};
use crate::config::OracleConfig;
use crate::error::{GatewayError, Result};

/// Oracle listing API client
#[derive(Clone)]
pub struct OracleClient {
  http: reqwest::Client,
  base_url: String,
  fetch_page_size: u32,
}

impl OracleClient {
  pub fn new(http: reqwest::Client, config: &OracleConfig) -> Self {
    Self {
      http,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      fetch_page_size: config.fetch_page_size.max(1),
    }
  }

  fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/{}", self.base_url, path))
      .map_err(|e| GatewayError::Decode(format!("invalid Oracle URL: {}", e)))?;
    {
      let mut pairs = url.query_pairs_mut();
      for (key, value) in query {
        pairs.append_pair(key, value);
      }
    }
    Ok(url)
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
    let url = self.url(path, query)?;
    debug!(%url, "Oracle API request");

    let response = self.http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(GatewayError::Status {
        status: status.as_u16(),
        body,
      });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
      .map_err(|e| GatewayError::Decode(format!("{} response: {}", path, e)))
  }

  /// Raw clients page, forwarded untouched by the pass-through route.
  pub async fn clients_raw(&self, page: u32, items_per_page: u32) -> Result<Value> {
    self
      .get_json(
        "clients",
        &[
          ("page", page.to_string()),
          ("itemsPerPage", items_per_page.to_string()),
        ],
      )
      .await
  }

  pub async fn get_clients_page(&self, page: u32, items_per_page: u32) -> Result<ApiClientsData> {
    let response: ApiClientsResponse = self
      .get_json(
        "clients",
        &[
          ("page", page.to_string()),
          ("itemsPerPage", items_per_page.to_string()),
        ],
      )
      .await?;
    Ok(response.data)
  }

  /// Pull every client, page by page.
  pub async fn fetch_all_clients(&self) -> Result<Vec<Client>> {
    let mut all_clients = Vec::new();
    let mut page = 1u32;

    loop {
      let data = self.get_clients_page(page, self.fetch_page_size).await?;
      let count = data.clients.len();
      all_clients.extend(data.clients);

      if count == 0 || page >= data.total_pages {
        break;
      }
      page += 1;
    }

    Ok(all_clients)
  }

  fn contracts_query(page: u32, items_per_page: u32, search: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![
      ("page", page.to_string()),
      ("itemsPerPage", items_per_page.to_string()),
    ];
    if let Some(search) = search.filter(|s| !s.is_empty()) {
      query.push(("search", search.to_string()));
    }
    query
  }

  pub async fn contracts_raw(
    &self,
    page: u32,
    items_per_page: u32,
    search: Option<&str>,
  ) -> Result<Value> {
    let query = Self::contracts_query(page, items_per_page, search);
    self.get_json("contracts/full-hierarchy", &query).await
  }

  pub async fn get_contracts_page(
    &self,
    page: u32,
    items_per_page: u32,
    search: Option<&str>,
  ) -> Result<ApiContractsData> {
    let query = Self::contracts_query(page, items_per_page, search);
    let response: ApiContractsResponse = self.get_json("contracts/full-hierarchy", &query).await?;
    Ok(response.data)
  }

  /// Pull every contract row, page by page.
  pub async fn fetch_all_contracts(&self) -> Result<Vec<ContractRow>> {
    let mut all_rows = Vec::new();
    let mut page = 1u32;

    loop {
      let data = self
        .get_contracts_page(page, self.fetch_page_size, None)
        .await?;
      let count = data.contracts.len();
      all_rows.extend(data.contracts);

      if count == 0 || page >= data.pagination.total_pages {
        break;
      }
      page += 1;
    }

    Ok(all_rows)
  }
}
