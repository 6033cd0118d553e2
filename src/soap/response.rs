//! Extraction of `RetCode`/`RetMsg` from WSINT responses.

use quick_xml::{events::Event, Reader};
use serde::Serialize;
use tracing::warn;

use super::request::Operation;

pub const SUCCESS_CODE: &str = "0";
pub const UNKNOWN_CODE: &str = "9999";
pub const UNKNOWN_MESSAGE: &str = "Unknown error";

/// Uniform outcome of a provisioning call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoapResult {
  pub success: bool,
  pub ret_code: String,
  pub message: String,
  pub raw_response: String,
}

impl SoapResult {
  pub fn new(ret_code: String, message: String, raw_response: String) -> Self {
    Self {
      success: ret_code == SUCCESS_CODE,
      ret_code,
      message,
      raw_response,
    }
  }

  fn unknown(raw_response: &str) -> Self {
    Self::new(
      UNKNOWN_CODE.to_string(),
      UNKNOWN_MESSAGE.to_string(),
      raw_response.to_string(),
    )
  }
}

/// Parse the response body of `operation`.
///
/// Looks for `Envelope/Body/<Op>Response/<Op>Result/{RetCode,RetMsg}`, ignoring
/// namespace prefixes. A missing path or unreadable XML yields the `9999`
/// sentinel instead of an error.
pub fn parse_response(operation: Operation, raw: &str) -> SoapResult {
  match extract_ret(operation, raw) {
    Ok(Some((code, message))) => SoapResult::new(code, message.unwrap_or_default(), raw.to_string()),
    Ok(None) => {
      warn!(operation = operation.name(), "RetCode not found in response");
      SoapResult::unknown(raw)
    }
    Err(e) => {
      warn!(operation = operation.name(), error = %e, "Malformed response XML");
      SoapResult::unknown(raw)
    }
  }
}

type RetPair = (String, Option<String>);

fn extract_ret(operation: Operation, raw: &str) -> Result<Option<RetPair>, quick_xml::Error> {
  let response_el = format!("{}Response", operation.name());
  let result_el = format!("{}Result", operation.name());
  let expected: [&str; 4] = ["Envelope", "Body", &response_el, &result_el];

  let mut reader = Reader::from_str(raw);
  reader.trim_text(true);

  let mut path: Vec<String> = Vec::new();
  let mut code: Option<String> = None;
  let mut message: Option<String> = None;

  loop {
    match reader.read_event()? {
      Event::Start(e) => {
        path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
      }
      Event::End(_) => {
        path.pop();
      }
      Event::Text(t) => {
        let text = t.unescape()?.into_owned();
        match slot(&path, &expected) {
          Some(Slot::Code) => code = Some(text),
          Some(Slot::Message) => message = Some(text),
          None => {}
        }
      }
      Event::CData(t) => {
        let text = String::from_utf8_lossy(&t).into_owned();
        match slot(&path, &expected) {
          Some(Slot::Code) => code = Some(text),
          Some(Slot::Message) => message = Some(text),
          None => {}
        }
      }
      Event::Eof => break,
      _ => {}
    }
  }

  Ok(code.map(|c| (c.trim().to_string(), message)))
}

enum Slot {
  Code,
  Message,
}

fn slot(path: &[String], expected: &[&str; 4]) -> Option<Slot> {
  if path.len() != 5 || !path.iter().zip(expected.iter()).all(|(a, b)| a == b) {
    return None;
  }
  match path[4].as_str() {
    "RetCode" => Some(Slot::Code),
    "RetMsg" => Some(Slot::Message),
    _ => None,
  }
}
