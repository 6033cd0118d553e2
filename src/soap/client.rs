use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use super::correlation::{CorrelationSource, RandomCorrelation};
use super::envelope::{build_envelope, EnvelopeHeader};
use super::request::SoapRequest;
use super::response::{parse_response, SoapResult};
use super::SessionContext;
use crate::config::SoapConfig;
use crate::error::{GatewayError, Result};

/// WSINT provisioning client.
///
/// One POST per call. No retry and no timeout beyond the transport default,
/// so repeating a call repeats its side effects downstream.
#[derive(Clone)]
pub struct SoapClient {
  http: reqwest::Client,
  url: String,
  user_info: String,
  correlation: Arc<dyn CorrelationSource>,
}

impl SoapClient {
  pub fn new(http: reqwest::Client, config: &SoapConfig) -> Self {
    Self {
      http,
      url: config.url.clone(),
      user_info: config.user_info.clone(),
      correlation: Arc::new(RandomCorrelation),
    }
  }

  /// Replace the id generator used when callers supply no correlation id.
  #[cfg(test)]
  pub fn with_correlation(mut self, source: Arc<dyn CorrelationSource>) -> Self {
    self.correlation = source;
    self
  }

  pub async fn call(
    &self,
    request: &SoapRequest,
    session: &SessionContext,
    correlation_id: Option<String>,
  ) -> Result<SoapResult> {
    let operation = request.operation();
    let correlation_id = correlation_id
      .filter(|id| !id.trim().is_empty())
      .unwrap_or_else(|| self.correlation.next_id());

    let body = build_envelope(
      request,
      &EnvelopeHeader {
        session_context: session.as_str(),
        user_info: &self.user_info,
        correlation_id: &correlation_id,
      },
    )?;
    debug!(operation = operation.name(), %correlation_id, envelope = %body, "Sending SOAP request");

    let response = self
      .http
      .post(&self.url)
      .header(CONTENT_TYPE, "text/xml; charset=utf-8")
      .header("SOAPAction", format!("\"{}\"", operation.name()))
      .body(body)
      .send()
      .await?;

    let status = response.status();
    let text = response.text().await?;

    // Faults come back as HTTP 500 with an envelope; only an empty error body is fatal
    if !status.is_success() && text.trim().is_empty() {
      return Err(GatewayError::Status {
        status: status.as_u16(),
        body: text,
      });
    }

    let result = parse_response(operation, &text);
    info!(
      operation = operation.name(),
      %correlation_id,
      ret_code = %result.ret_code,
      success = result.success,
      "SOAP call completed"
    );

    Ok(result)
  }
}
