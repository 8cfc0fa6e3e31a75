//! Send request: the raw JSON body and the validated value built from it.

use lettre::Address;
use serde::Deserialize;

use crate::error::Error;

pub const MISSING_FIELDS: &str = "Missing required fields";
pub const INVALID_ADDRESS: &str = "Invalid email address";

/// Body of `POST /send` exactly as received. Every field is optional here so
/// that absence can be reported as a 400 rather than a decoding failure.
#[derive(Debug, Default, Deserialize)]
pub struct SendPayload {
  pub smtp_config_id: Option<String>,
  pub to: Option<Vec<String>>,
  pub cc: Option<Vec<String>>,
  pub bcc: Option<Vec<String>>,
  pub subject: Option<String>,
  pub body: Option<String>,
  pub is_html: Option<bool>,
}

/// A send request that passed validation. Built once at the boundary and
/// never re-checked downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
  pub smtp_config_id: String,
  pub to: Vec<Address>,
  pub cc: Option<Vec<Address>>,
  pub bcc: Option<Vec<Address>>,
  pub subject: String,
  pub body: String,
  pub is_html: bool,
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

fn parse_addresses(raw: &[String]) -> Result<Vec<Address>, Error> {
  raw
    .iter()
    .map(|a| {
      a.trim()
        .parse::<Address>()
        .map_err(|_| Error::InvalidRequest(INVALID_ADDRESS.into()))
    })
    .collect()
}

/// Empty lists are the same as no list at all.
fn optional_list(raw: Option<Vec<String>>) -> Option<Vec<String>> {
  raw.filter(|v| !v.is_empty())
}

impl TryFrom<SendPayload> for DispatchRequest {
  type Error = Error;

  fn try_from(p: SendPayload) -> Result<Self, Self::Error> {
    let missing = || Error::InvalidRequest(MISSING_FIELDS.into());

    let smtp_config_id = non_blank(p.smtp_config_id).ok_or_else(missing)?;
    let to = p.to.filter(|v| !v.is_empty()).ok_or_else(missing)?;
    let subject = non_blank(p.subject).ok_or_else(missing)?;
    let body = non_blank(p.body).ok_or_else(missing)?;
    let cc = optional_list(p.cc);
    let bcc = optional_list(p.bcc);

    // to, then cc, then bcc: the first bad address rejects the request.
    let to = parse_addresses(&to)?;
    let cc = cc.as_deref().map(parse_addresses).transpose()?;
    let bcc = bcc.as_deref().map(parse_addresses).transpose()?;

    Ok(DispatchRequest {
      smtp_config_id: smtp_config_id.trim().to_string(),
      to,
      cc,
      bcc,
      subject,
      body,
      is_html: p.is_html.unwrap_or(false),
    })
  }
}

impl DispatchRequest {
  pub fn to_strings(&self) -> Vec<String> {
    self.to.iter().map(ToString::to_string).collect()
  }

  pub fn cc_strings(&self) -> Option<Vec<String>> {
    self
      .cc
      .as_ref()
      .map(|v| v.iter().map(ToString::to_string).collect())
  }

  pub fn bcc_strings(&self) -> Option<Vec<String>> {
    self
      .bcc
      .as_ref()
      .map(|v| v.iter().map(ToString::to_string).collect())
  }
}
