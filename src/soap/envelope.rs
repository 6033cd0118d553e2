//! WSINT request envelope writer.

use quick_xml::{
  events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
  Writer,
};

use super::request::SoapRequest;
use crate::error::{GatewayError, Result};

pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const WSINT_NS: &str = "http://www.openwaygroup.com/wsint";

/// Values carried in the envelope header of every call.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeHeader<'a> {
  pub session_context: &'a str,
  pub user_info: &'a str,
  pub correlation_id: &'a str,
}

/// Serialize `request` into a complete SOAP 1.1 envelope.
///
/// Text content is escaped by the writer.
pub fn build_envelope(request: &SoapRequest, header: &EnvelopeHeader<'_>) -> Result<String> {
  let mut wr = Writer::new(Vec::new());

  wr.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

  let mut envelope = BytesStart::new("soapenv:Envelope");
  envelope.push_attribute(("xmlns:soapenv", SOAP_ENV_NS));
  envelope.push_attribute(("xmlns:wsin", WSINT_NS));
  wr.write_event(Event::Start(envelope))?;

  open(&mut wr, "soapenv:Header")?;
  text_element(&mut wr, "wsin:SessionContextStr", header.session_context)?;
  text_element(&mut wr, "wsin:UserInfo", header.user_info)?;
  text_element(&mut wr, "wsin:CorrelationId", header.correlation_id)?;
  close(&mut wr, "soapenv:Header")?;

  let operation = request.operation();
  let op_element = format!("wsin:{}", operation.name());
  let info_element = format!("wsin:{}", operation.info_element());

  open(&mut wr, "soapenv:Body")?;
  open(&mut wr, &op_element)?;
  open(&mut wr, &info_element)?;
  for (name, value) in request.elements() {
    text_element(&mut wr, &format!("wsin:{}", name), value)?;
  }
  close(&mut wr, &info_element)?;
  close(&mut wr, &op_element)?;
  close(&mut wr, "soapenv:Body")?;

  close(&mut wr, "soapenv:Envelope")?;

  String::from_utf8(wr.into_inner()).map_err(|e| GatewayError::Xml(e.to_string()))
}

fn open(wr: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
  wr.write_event(Event::Start(BytesStart::new(name)))?;
  Ok(())
}

fn close(wr: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
  wr.write_event(Event::End(BytesEnd::new(name)))?;
  Ok(())
}

fn text_element(wr: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
  open(wr, name)?;
  wr.write_event(Event::Text(BytesText::new(value)))?;
  close(wr, name)
}
