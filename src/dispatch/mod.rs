//! Email dispatch: validate, authenticate, load config, send, record.
//!
//! Each step depends on the previous one succeeding. Validation and lookup
//! failures stop the pipeline before any network activity. Delivery is
//! attempted exactly once and the attempt is written to history on a
//! best-effort basis: a failed history write is logged and otherwise
//! ignored, so a delivered message is always reported as sent.

use std::sync::Arc;

use lettre::message::Mailbox;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  identity::IdentityProvider,
  models::{
    history::new_send_record::{NewSendRecord, SendStatus},
    request::dispatch_request::{DispatchRequest, SendPayload},
    smtp_config::db_smtp_config::SmtpConfiguration,
    user::user_identity::UserIdentity,
  },
  smtp::{MailTransport, OutgoingMessage, TransportError},
  store::CredentialStore,
};

pub const SENT_MESSAGE: &str = "Email sent successfully";

/// Successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
  /// `None` when the history write failed after delivery.
  pub record_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct DispatchService {
  identity: Arc<dyn IdentityProvider>,
  store: Arc<dyn CredentialStore>,
  transport: Arc<dyn MailTransport>,
}

fn sender(config: &SmtpConfiguration) -> std::result::Result<Mailbox, TransportError> {
  let address = config
    .from_email
    .trim()
    .parse()
    .map_err(|e: lettre::address::AddressError| TransportError::InvalidSender(e.to_string()))?;
  let name = config
    .from_name
    .as_deref()
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .map(str::to_string);
  Ok(Mailbox::new(name, address))
}

impl DispatchService {
  pub fn new(
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn CredentialStore>,
    transport: Arc<dyn MailTransport>,
  ) -> Self {
    DispatchService {
      identity,
      store,
      transport,
    }
  }

  async fn authenticate(&self, token: Option<&str>) -> Result<UserIdentity> {
    let token = token
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .ok_or(Error::Unauthorized)?;
    self
      .identity
      .resolve_caller(token)
      .await?
      .ok_or(Error::Unauthorized)
  }

  async fn load_configuration(&self, raw_id: &str, owner: Uuid) -> Result<SmtpConfiguration> {
    // A malformed id cannot name anything the caller owns.
    let Ok(id) = Uuid::parse_str(raw_id) else {
      return Err(Error::ConfigurationNotFound);
    };
    self
      .store
      .get_configuration(id, owner)
      .await?
      .ok_or(Error::ConfigurationNotFound)
  }

  async fn deliver(
    &self,
    config: &SmtpConfiguration,
    req: &DispatchRequest,
  ) -> std::result::Result<(), TransportError> {
    let message = OutgoingMessage {
      from: sender(config)?,
      to: req.to.clone(),
      cc: req.cc.clone().unwrap_or_default(),
      bcc: req.bcc.clone().unwrap_or_default(),
      subject: req.subject.clone(),
      body: req.body.clone(),
      is_html: req.is_html,
    };
    self.transport.deliver(config, &message).await
  }

  /// Write the attempt to history. Failures are logged, never returned.
  async fn record(
    &self,
    owner: Uuid,
    config: &SmtpConfiguration,
    req: &DispatchRequest,
    outcome: &std::result::Result<(), TransportError>,
  ) -> Option<Uuid> {
    let (status, error_message) = match outcome {
      Ok(()) => (SendStatus::Sent, None),
      Err(e) => (SendStatus::Failed, Some(e.to_string())),
    };
    let record = NewSendRecord {
      user_id: owner,
      smtp_config_id: Some(config.id),
      to: req.to_strings(),
      cc: req.cc_strings(),
      bcc: req.bcc_strings(),
      subject: req.subject.clone(),
      body: req.body.clone(),
      is_html: req.is_html,
      status,
      error_message,
    };
    match self.store.insert_send_record(record).await {
      Ok(id) => Some(id),
      Err(e) => {
        warn!(user_id = %owner, ?status, "failed to record send history: {e}");
        None
      }
    }
  }

  /// Run the whole pipeline for one request on behalf of `token`'s owner.
  ///
  /// # Errors
  ///
  /// `Unauthorized`, `InvalidRequest` and `ConfigurationNotFound` are raised
  /// before any network activity. `DeliveryFailed` carries the transport's
  /// error text after the failed attempt has been recorded.
  pub async fn dispatch(
    &self,
    payload: SendPayload,
    token: Option<&str>,
  ) -> Result<DispatchReceipt> {
    let caller = self.authenticate(token).await?;
    let req = DispatchRequest::try_from(payload)?;
    let config = self.load_configuration(&req.smtp_config_id, caller.id).await?;

    info!(
      user_id = %caller.id,
      config_id = %config.id,
      from = %config.from_header(),
      "dispatching message"
    );
    let outcome = self.deliver(&config, &req).await;
    let record_id = self.record(caller.id, &config, &req, &outcome).await;

    match outcome {
      Ok(()) => Ok(DispatchReceipt { record_id }),
      Err(e) => {
        warn!(user_id = %caller.id, config_id = %config.id, "delivery failed: {e}");
        Err(Error::DeliveryFailed(e.to_string()))
      }
    }
  }
}
