//! HTTP surface of the gateway.

mod handlers;

use axum::routing::{get, post};
use axum::Router;
use color_eyre::{eyre::eyre, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::cache::PageCache;
use crate::config::Config;
use crate::oracle::{Client, ContractRow, OracleClient};
use crate::soap::{SessionContext, SoapClient};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
  pub soap: SoapClient,
  pub oracle: OracleClient,
  pub clients: Arc<PageCache<Client>>,
  pub contracts: Arc<PageCache<ContractRow>>,
  /// Used when a request carries no session header
  pub default_session: SessionContext,
}

impl AppState {
  pub fn new(config: &Config) -> Result<Self> {
    let http = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      soap: SoapClient::new(http.clone(), &config.soap),
      oracle: OracleClient::new(http, &config.oracle),
      clients: Arc::new(PageCache::new()),
      contracts: Arc::new(PageCache::new()),
      default_session: SessionContext::new(config.soap.session_context.clone()),
    })
  }
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/api/createClient", post(handlers::create_client))
    .route("/api/createContract", post(handlers::create_contract))
    .route("/api/createCard", post(handlers::create_card))
    .route(
      "/api/createIssuingContractWithLiability",
      post(handlers::create_issuing_contract),
    )
    .route("/api/oracle/clients", get(handlers::oracle_clients))
    .route(
      "/api/oracle/contracts/full-hierarchy",
      get(handlers::oracle_contracts),
    )
    .route("/api/contracts/tree", get(handlers::contracts_tree))
    .route("/api/clients", get(handlers::list_clients))
    .route("/api/contracts", get(handlers::list_contracts))
    .route(
      "/api/cache/clients",
      get(handlers::clients_cache).delete(handlers::invalidate_clients_cache),
    )
    .route(
      "/api/cache/contracts",
      get(handlers::contracts_cache).delete(handlers::invalidate_contracts_cache),
    )
    .route("/health", get(handlers::health))
    .with_state(state)
}

pub async fn serve(port: u16, state: AppState) -> Result<()> {
  let addr = SocketAddr::from(([0, 0, 0, 0], port));
  let listener = tokio::net::TcpListener::bind(addr)
    .await
    .map_err(|e| eyre!("Failed to bind {}: {}", addr, e))?;

  info!(%addr, "Gateway listening");

  axum::serve(listener, router(state))
    .await
    .map_err(|e| eyre!("Server error: {}", e))?;

  Ok(())
}
