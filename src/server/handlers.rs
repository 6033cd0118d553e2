use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;

use super::AppState;
use crate::cache::{Listable, ListFilters, PageCache, SortOrder, SortSpec};
use crate::contracts::build_tree;
use crate::error::{GatewayError, Result};
use crate::soap::{
  CreateCard, CreateClient, CreateContract, CreateIssuingContract, SessionContext, SoapRequest,
  SoapResult,
};

pub const SESSION_HEADER: &str = "x-session-context";
pub const CORRELATION_HEADER: &str = "x-correlation-id";

const DEFAULT_ITEMS_PER_PAGE: u32 = 10;

type QueryResult<T> = std::result::Result<Query<T>, QueryRejection>;

// ============================================================================
// Request shapes
// ============================================================================

/// Flat create payload plus an optional caller-chosen correlation id.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest<T> {
  correlation_id: Option<String>,
  #[serde(flatten)]
  fields: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
  page: Option<u32>,
  items_per_page: Option<u32>,
  search: Option<String>,
}

impl PageQuery {
  fn page(&self) -> u32 {
    self.page.unwrap_or(1).max(1)
  }

  fn items_per_page(&self) -> u32 {
    self.items_per_page.unwrap_or(DEFAULT_ITEMS_PER_PAGE).max(1)
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
  page: Option<u32>,
  search: Option<String>,
  status: Option<String>,
  sort_by: Option<String>,
  sort_order: Option<SortOrder>,
}

impl ListQuery {
  fn filters<T: Listable>(&self) -> Result<ListFilters> {
    let sort = match self.sort_by.as_deref().filter(|s| !s.is_empty()) {
      Some(field) => {
        if !T::sort_fields().iter().any(|f| *f == field) {
          return Err(GatewayError::Validation(format!(
            "cannot sort {} by '{}'",
            T::entity_type(),
            field
          )));
        }
        Some(SortSpec {
          field: field.to_string(),
          order: self.sort_order.unwrap_or_default(),
        })
      }
      None => None,
    };
    Ok(ListFilters::new(
      self.search.as_deref(),
      self.status.as_deref(),
      sort,
    ))
  }
}

// ============================================================================
// Helpers
// ============================================================================

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

fn session_context(state: &AppState, headers: &HeaderMap) -> SessionContext {
  header_value(headers, SESSION_HEADER)
    .map(SessionContext::new)
    .unwrap_or_else(|| state.default_session.clone())
}

/// Send one provisioning request; a successful create drops cached list pages.
async fn provision(
  state: &AppState,
  headers: &HeaderMap,
  body_correlation: Option<String>,
  request: SoapRequest,
) -> Result<Json<SoapResult>> {
  let session = session_context(state, headers);
  let correlation_id = header_value(headers, CORRELATION_HEADER).or(body_correlation);

  let result = state.soap.call(&request, &session, correlation_id).await?;

  if result.success {
    state.clients.invalidate()?;
    state.contracts.invalidate()?;
  }

  Ok(Json(result))
}

/// Malformed query strings get the same JSON error body as other failures.
fn query_params<T>(query: QueryResult<T>) -> Result<T> {
  let Query(params) = query?;
  Ok(params)
}

/// Apply the request's criteria, then serve the page through the cache.
///
/// The store's current page is shared by every caller, so a request without
/// `page` always gets page 1 rather than whatever another caller last viewed.
async fn serve_page<T, F, Fut>(cache: &PageCache<T>, query: &ListQuery, fetcher: F) -> Result<Json<Value>>
where
  T: Listable,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<Vec<T>>>,
{
  cache.set_filters(query.filters::<T>()?)?;
  let page = query.page.unwrap_or(1);
  let view = cache.fetch_page(Some(page), fetcher).await?;
  Ok(Json(json!({ "data": view })))
}

// ============================================================================
// Provisioning
// ============================================================================

pub async fn create_client(
  State(state): State<AppState>,
  headers: HeaderMap,
  Json(body): Json<CreateRequest<CreateClient>>,
) -> Result<Json<SoapResult>> {
  let request = SoapRequest::create_client(body.fields)?;
  provision(&state, &headers, body.correlation_id, request).await
}

pub async fn create_contract(
  State(state): State<AppState>,
  headers: HeaderMap,
  Json(body): Json<CreateRequest<CreateContract>>,
) -> Result<Json<SoapResult>> {
  let request = SoapRequest::create_contract(body.fields)?;
  provision(&state, &headers, body.correlation_id, request).await
}

pub async fn create_card(
  State(state): State<AppState>,
  headers: HeaderMap,
  Json(body): Json<CreateRequest<CreateCard>>,
) -> Result<Json<SoapResult>> {
  let request = SoapRequest::create_card(body.fields)?;
  provision(&state, &headers, body.correlation_id, request).await
}

pub async fn create_issuing_contract(
  State(state): State<AppState>,
  headers: HeaderMap,
  Json(body): Json<CreateRequest<CreateIssuingContract>>,
) -> Result<Json<SoapResult>> {
  let request = SoapRequest::create_issuing_contract(body.fields)?;
  provision(&state, &headers, body.correlation_id, request).await
}

// ============================================================================
// Oracle pass-through
// ============================================================================

pub async fn oracle_clients(
  State(state): State<AppState>,
  query: QueryResult<PageQuery>,
) -> Result<Json<Value>> {
  let query = query_params(query)?;
  let body = state
    .oracle
    .clients_raw(query.page(), query.items_per_page())
    .await?;
  Ok(Json(body))
}

pub async fn oracle_contracts(
  State(state): State<AppState>,
  query: QueryResult<PageQuery>,
) -> Result<Json<Value>> {
  let query = query_params(query)?;
  let body = state
    .oracle
    .contracts_raw(query.page(), query.items_per_page(), query.search.as_deref())
    .await?;
  Ok(Json(body))
}

pub async fn contracts_tree(
  State(state): State<AppState>,
  query: QueryResult<PageQuery>,
) -> Result<Json<Value>> {
  let query = query_params(query)?;
  let data = state
    .oracle
    .get_contracts_page(query.page(), query.items_per_page(), query.search.as_deref())
    .await?;
  let tree = build_tree(data.contracts);
  Ok(Json(json!({
    "data": { "tree": tree, "pagination": data.pagination }
  })))
}

// ============================================================================
// Cached listings
// ============================================================================

pub async fn list_clients(
  State(state): State<AppState>,
  query: QueryResult<ListQuery>,
) -> Result<Json<Value>> {
  let query = query_params(query)?;
  serve_page(&state.clients, &query, || state.oracle.fetch_all_clients()).await
}

pub async fn list_contracts(
  State(state): State<AppState>,
  query: QueryResult<ListQuery>,
) -> Result<Json<Value>> {
  let query = query_params(query)?;
  serve_page(&state.contracts, &query, || state.oracle.fetch_all_contracts()).await
}

pub async fn clients_cache(State(state): State<AppState>) -> Result<Json<Value>> {
  Ok(Json(json!({ "data": state.clients.snapshot()? })))
}

pub async fn contracts_cache(State(state): State<AppState>) -> Result<Json<Value>> {
  Ok(Json(json!({ "data": state.contracts.snapshot()? })))
}

pub async fn invalidate_clients_cache(State(state): State<AppState>) -> Result<Json<Value>> {
  state.clients.invalidate()?;
  Ok(Json(json!({ "invalidated": "clients" })))
}

pub async fn invalidate_contracts_cache(State(state): State<AppState>) -> Result<Json<Value>> {
  state.contracts.invalidate()?;
  Ok(Json(json!({ "invalidated": "contracts" })))
}

pub async fn health() -> &'static str {
  "ok"
}
