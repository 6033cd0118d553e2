//! Adapter for the legacy WSINT provisioning service.
//!
//! Requests are typed per operation, serialized into a fixed envelope, posted
//! once, and the reply is reduced to a `RetCode`/`RetMsg` pair.

mod client;
mod correlation;
mod envelope;
mod request;
mod response;

pub use client::SoapClient;
#[cfg(test)]
pub use correlation::FixedCorrelation;
pub use request::{CreateCard, CreateClient, CreateContract, CreateIssuingContract, SoapRequest};
pub use response::SoapResult;

/// Session context string forwarded in every envelope header.
///
/// Resolved per request by the HTTP layer and passed down explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext(String);

impl SessionContext {
  pub fn new(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}
