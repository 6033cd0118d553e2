//! Client for the Oracle-backed listing API.

mod api_types;
mod client;
mod listing;
mod types;

pub use client::OracleClient;
pub use types::{Client, ContractRow};
