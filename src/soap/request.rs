//! Typed request variants for the four provisioning operations.
//!
//! Each variant deserializes from the flat JSON the front end posts. Optional
//! fields with a documented fallback are filled at construction; required
//! fields are checked there too, so an envelope is never built from an
//! incomplete request.

use serde::Deserialize;

use crate::error::{GatewayError, Result};

pub const DEFAULT_INSTITUTION_CODE: &str = "0001";
pub const DEFAULT_BRANCH_CODE: &str = "0101";
pub const DEFAULT_CLIENT_TYPE_CODE: &str = "PR";
pub const DEFAULT_SALUTATION_CODE: &str = "MR";
pub const DEFAULT_GENDER: &str = "M";
pub const DEFAULT_CITIZENSHIP: &str = "VNM";
pub const DEFAULT_CURRENCY: &str = "VND";
pub const DEFAULT_CREDIT_LIMIT: &str = "0";

/// Legacy operation names, also used as `SOAPAction` and element names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
  CreateClient,
  CreateContract,
  CreateCard,
  CreateIssuingContractWithLiability,
}

impl Operation {
  pub fn name(self) -> &'static str {
    match self {
      Self::CreateClient => "CreateClient",
      Self::CreateContract => "CreateContract",
      Self::CreateCard => "CreateCard",
      Self::CreateIssuingContractWithLiability => "CreateIssuingContractWithLiability",
    }
  }

  /// Element wrapping the operation's fields inside the body.
  pub fn info_element(self) -> &'static str {
    match self {
      Self::CreateClient => "ClientInfo",
      Self::CreateContract => "ContractInfo",
      Self::CreateCard => "CardInfo",
      Self::CreateIssuingContractWithLiability => "IssuingContractInfo",
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClient {
  pub institution_code: Option<String>,
  pub branch_code: Option<String>,
  pub client_type_code: Option<String>,
  pub salutation_code: Option<String>,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub middle_name: Option<String>,
  pub short_name: Option<String>,
  pub company_name: Option<String>,
  pub birth_date: Option<String>,
  pub gender: Option<String>,
  pub citizenship: Option<String>,
  pub client_number: Option<String>,
  pub reg_number: Option<String>,
  pub phone: Option<String>,
  pub email: Option<String>,
  pub address: Option<String>,
  pub city: Option<String>,
  pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContract {
  pub institution_code: Option<String>,
  pub branch_code: Option<String>,
  pub client_identifier: Option<String>,
  pub product_code: Option<String>,
  pub contract_name: Option<String>,
  pub currency: Option<String>,
  pub liab_contract_identifier: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCard {
  pub contract_identifier: Option<String>,
  pub product_code: Option<String>,
  pub card_name: Option<String>,
  pub embossed_first_name: Option<String>,
  pub embossed_last_name: Option<String>,
  pub card_expiry: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssuingContract {
  pub institution_code: Option<String>,
  pub branch_code: Option<String>,
  pub client_identifier: Option<String>,
  pub liability_product_code: Option<String>,
  pub issuing_product_code: Option<String>,
  pub liability_contract_name: Option<String>,
  pub issuing_contract_name: Option<String>,
  pub currency: Option<String>,
  pub credit_limit: Option<String>,
}

/// A validated, default-filled request for one operation.
#[derive(Debug, Clone)]
pub enum SoapRequest {
  CreateClient(CreateClient),
  CreateContract(CreateContract),
  CreateCard(CreateCard),
  CreateIssuingContractWithLiability(CreateIssuingContract),
}

impl SoapRequest {
  pub fn create_client(mut input: CreateClient) -> Result<Self> {
    fill(&mut input.institution_code, DEFAULT_INSTITUTION_CODE);
    fill(&mut input.branch_code, DEFAULT_BRANCH_CODE);
    fill(&mut input.client_type_code, DEFAULT_CLIENT_TYPE_CODE);
    fill(&mut input.salutation_code, DEFAULT_SALUTATION_CODE);
    fill(&mut input.gender, DEFAULT_GENDER);
    fill(&mut input.citizenship, DEFAULT_CITIZENSHIP);
    fill(&mut input.country, DEFAULT_CITIZENSHIP);
    Ok(Self::CreateClient(input))
  }

  pub fn create_contract(mut input: CreateContract) -> Result<Self> {
    require(&input.client_identifier, "clientIdentifier")?;
    require(&input.product_code, "productCode")?;
    fill(&mut input.institution_code, DEFAULT_INSTITUTION_CODE);
    fill(&mut input.branch_code, DEFAULT_BRANCH_CODE);
    fill(&mut input.currency, DEFAULT_CURRENCY);
    Ok(Self::CreateContract(input))
  }

  pub fn create_card(input: CreateCard) -> Result<Self> {
    require(&input.contract_identifier, "contractIdentifier")?;
    require(&input.product_code, "productCode")?;
    Ok(Self::CreateCard(input))
  }

  pub fn create_issuing_contract(mut input: CreateIssuingContract) -> Result<Self> {
    require(&input.client_identifier, "clientIdentifier")?;
    require(&input.liability_product_code, "liabilityProductCode")?;
    require(&input.issuing_product_code, "issuingProductCode")?;
    fill(&mut input.institution_code, DEFAULT_INSTITUTION_CODE);
    fill(&mut input.branch_code, DEFAULT_BRANCH_CODE);
    fill(&mut input.currency, DEFAULT_CURRENCY);
    fill(&mut input.credit_limit, DEFAULT_CREDIT_LIMIT);
    Ok(Self::CreateIssuingContractWithLiability(input))
  }

  pub fn operation(&self) -> Operation {
    match self {
      Self::CreateClient(_) => Operation::CreateClient,
      Self::CreateContract(_) => Operation::CreateContract,
      Self::CreateCard(_) => Operation::CreateCard,
      Self::CreateIssuingContractWithLiability(_) => Operation::CreateIssuingContractWithLiability,
    }
  }

  /// Field elements in wire order. Unset fields are left out.
  pub fn elements(&self) -> Vec<(&'static str, &str)> {
    let fields: Vec<(&'static str, &Option<String>)> = match self {
      Self::CreateClient(c) => vec![
        ("InstitutionCode", &c.institution_code),
        ("Branch", &c.branch_code),
        ("ClientTypeCode", &c.client_type_code),
        ("SalutationCode", &c.salutation_code),
        ("FirstName", &c.first_name),
        ("LastName", &c.last_name),
        ("MiddleName", &c.middle_name),
        ("ShortName", &c.short_name),
        ("CompanyName", &c.company_name),
        ("BirthDate", &c.birth_date),
        ("Gender", &c.gender),
        ("CitizenshipCode", &c.citizenship),
        ("ClientNumber", &c.client_number),
        ("RegNumber", &c.reg_number),
        ("Phone", &c.phone),
        ("EMail", &c.email),
        ("Address", &c.address),
        ("City", &c.city),
        ("Country", &c.country),
      ],
      Self::CreateContract(c) => vec![
        ("InstitutionCode", &c.institution_code),
        ("Branch", &c.branch_code),
        ("ClientIdentifier", &c.client_identifier),
        ("ProductCode", &c.product_code),
        ("ContractName", &c.contract_name),
        ("Currency", &c.currency),
        ("LiabContractIdentifier", &c.liab_contract_identifier),
      ],
      Self::CreateCard(c) => vec![
        ("ContractIdentifier", &c.contract_identifier),
        ("ProductCode", &c.product_code),
        ("CardName", &c.card_name),
        ("EmbossedFirstName", &c.embossed_first_name),
        ("EmbossedLastName", &c.embossed_last_name),
        ("CardExpiry", &c.card_expiry),
      ],
      Self::CreateIssuingContractWithLiability(c) => vec![
        ("InstitutionCode", &c.institution_code),
        ("Branch", &c.branch_code),
        ("ClientIdentifier", &c.client_identifier),
        ("LiabilityProductCode", &c.liability_product_code),
        ("IssuingProductCode", &c.issuing_product_code),
        ("LiabilityContractName", &c.liability_contract_name),
        ("IssuingContractName", &c.issuing_contract_name),
        ("Currency", &c.currency),
        ("CreditLimit", &c.credit_limit),
      ],
    };

    fields
      .into_iter()
      .filter_map(|(name, value)| present(value).map(|v| (name, v)))
      .collect()
  }
}

fn present(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Blank counts as unset, matching how the forms submit empty inputs.
fn fill(field: &mut Option<String>, default: &str) {
  if present(field).is_none() {
    *field = Some(default.to_string());
  }
}

fn require(field: &Option<String>, name: &str) -> Result<()> {
  match present(field) {
    Some(_) => Ok(()),
    None => Err(GatewayError::Validation(format!("{} is required", name))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn element<'a>(request: &'a SoapRequest, name: &str) -> Option<&'a str> {
    request
      .elements()
      .into_iter()
      .find(|(n, _)| *n == name)
      .map(|(_, v)| v)
  }

  #[test]
  fn test_client_defaults_fill_missing_fields() {
    let request = SoapRequest::create_client(CreateClient::default()).unwrap();
    assert_eq!(element(&request, "InstitutionCode"), Some("0001"));
    assert_eq!(element(&request, "SalutationCode"), Some("MR"));
    assert_eq!(element(&request, "CitizenshipCode"), Some("VNM"));
    assert_eq!(element(&request, "FirstName"), None);
  }

  #[test]
  fn test_blank_value_falls_back_to_default() {
    let input: CreateClient =
      serde_json::from_str(r#"{"salutationCode": "", "citizenship": "USA"}"#).unwrap();
    let request = SoapRequest::create_client(input).unwrap();
    assert_eq!(element(&request, "SalutationCode"), Some("MR"));
    assert_eq!(element(&request, "CitizenshipCode"), Some("USA"));
  }

  #[test]
  fn test_provided_values_keep_wire_order() {
    let input: CreateClient = serde_json::from_str(
      r#"{"firstName": "An", "lastName": "Nguyen", "clientNumber": "C-77"}"#,
    )
    .unwrap();
    let request = SoapRequest::create_client(input).unwrap();
    let names: Vec<&str> = request.elements().iter().map(|(n, _)| *n).collect();
    let first = names.iter().position(|n| *n == "FirstName").unwrap();
    let number = names.iter().position(|n| *n == "ClientNumber").unwrap();
    assert!(first < number);
    assert_eq!(element(&request, "LastName"), Some("Nguyen"));
  }

  #[test]
  fn test_contract_requires_client_and_product() {
    let err = SoapRequest::create_contract(CreateContract::default()).unwrap_err();
    assert!(matches!(err, GatewayError::Validation(msg) if msg.contains("clientIdentifier")));

    let request = SoapRequest::create_contract(CreateContract {
      client_identifier: Some("CL-1".into()),
      product_code: Some("LIAB_VND".into()),
      ..Default::default()
    })
    .unwrap();
    assert_eq!(element(&request, "Currency"), Some("VND"));
    assert_eq!(request.operation().name(), "CreateContract");
  }

  #[test]
  fn test_issuing_contract_defaults() {
    let request = SoapRequest::create_issuing_contract(CreateIssuingContract {
      client_identifier: Some("CL-1".into()),
      liability_product_code: Some("L1".into()),
      issuing_product_code: Some("I1".into()),
      ..Default::default()
    })
    .unwrap();
    assert_eq!(element(&request, "CreditLimit"), Some("0"));
    assert_eq!(
      request.operation().info_element(),
      "IssuingContractInfo"
    );
  }

  #[test]
  fn test_card_requires_contract_identifier() {
    let err = SoapRequest::create_card(CreateCard {
      product_code: Some("VISA".into()),
      ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)));
  }
}
