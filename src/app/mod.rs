//! Application setup and runtime.

use crate::{
  db,
  dispatch::DispatchService,
  http,
  identity::SqliteIdentity,
  smtp::{LettreTransport, MailTransport},
  store::SqliteStore,
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing::{info, warn};

/// Runtime settings, read once from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
  pub database_url: String,
  pub addr: String,
  pub smtp_timeout: Duration,
  pub session_ttl: chrono::Duration,
}

impl Default for Settings {
  fn default() -> Self {
    Settings {
      database_url: "sqlite://mailroom.db".to_string(),
      addr: "127.0.0.1:8080".to_string(),
      smtp_timeout: Duration::from_secs(u64::from(DEFAULT_SMTP_TIMEOUT_SECS)),
      session_ttl: chrono::Duration::hours(i64::from(DEFAULT_SESSION_TTL_HOURS)),
    }
  }
}

const DEFAULT_SMTP_TIMEOUT_SECS: u32 = 30;
const DEFAULT_SESSION_TTL_HOURS: u32 = 168;
/// Longest accepted session lifetime (ten years).
const MAX_SESSION_TTL_HOURS: u32 = 24 * 365 * 10;
const MAX_SMTP_TIMEOUT_SECS: u32 = 3600;

/// Parse a positive count no larger than `max`; anything else keeps `default`.
fn parse_bounded(name: &str, raw: Option<String>, max: u32, default: u32) -> u32 {
  let Some(v) = raw else {
    return default;
  };
  match v.trim().parse::<u32>() {
    Ok(n) if (1..=max).contains(&n) => n,
    _ => {
      warn!("ignoring invalid {name}={v:?} (expected 1-{max}), using default");
      default
    }
  }
}

impl Settings {
  /// Build settings from a variable lookup; unset or invalid values keep defaults.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let defaults = Settings::default();
    let timeout_secs = parse_bounded(
      "MAILROOM_SMTP_TIMEOUT_SECS",
      lookup("MAILROOM_SMTP_TIMEOUT_SECS"),
      MAX_SMTP_TIMEOUT_SECS,
      DEFAULT_SMTP_TIMEOUT_SECS,
    );
    let ttl_hours = parse_bounded(
      "MAILROOM_SESSION_TTL_HOURS",
      lookup("MAILROOM_SESSION_TTL_HOURS"),
      MAX_SESSION_TTL_HOURS,
      DEFAULT_SESSION_TTL_HOURS,
    );
    Settings {
      database_url: lookup("MAILROOM_DATABASE").unwrap_or(defaults.database_url),
      addr: lookup("MAILROOM_ADDR").unwrap_or(defaults.addr),
      smtp_timeout: Duration::from_secs(u64::from(timeout_secs)),
      session_ttl: chrono::Duration::try_hours(i64::from(ttl_hours))
        .unwrap_or(defaults.session_ttl),
    }
  }

  pub fn from_env() -> Self {
    Self::from_lookup(|name| std::env::var(name).ok())
  }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
  pub db: SqlitePool,
  pub identity: Arc<SqliteIdentity>,
  pub store: Arc<SqliteStore>,
  pub dispatcher: DispatchService,
}

impl AppState {
  /// State delivering through real SMTP servers.
  pub fn new(db: SqlitePool, settings: &Settings) -> Self {
    let transport = Arc::new(LettreTransport::new(settings.smtp_timeout));
    Self::with_transport(db, settings, transport)
  }

  pub fn with_transport(
    db: SqlitePool,
    settings: &Settings,
    transport: Arc<dyn MailTransport>,
  ) -> Self {
    let identity = Arc::new(SqliteIdentity::new(db.clone(), settings.session_ttl));
    let store = Arc::new(SqliteStore::new(db.clone()));
    let dispatcher = DispatchService::new(identity.clone(), store.clone(), transport);
    AppState {
      db,
      identity,
      store,
      dispatcher,
    }
  }
}

/// Open the database, run migrations and serve HTTP until shutdown.
pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
  crate::util::init_tracing();
  let settings = Settings::from_env();

  let db_url = db::ensure_sqlite_path(&settings.database_url)?;
  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;
  db::run_migrations(&pool).await?;

  let state = AppState::new(pool, &settings);
  let purged = state.identity.purge_expired_sessions().await?;
  if purged > 0 {
    info!("purged {purged} expired sessions");
  }

  let app = http::build_router(state);

  let addr: SocketAddr = settings.addr.parse()?;
  info!("mailroom api:          http://{}/", addr);
  info!("send endpoint:         POST http://{}/send", addr);
  info!("smtp timeout:          {:?}", settings.smtp_timeout);

  let listener = tokio::net::TcpListener::bind(addr).await?;
  axum::serve(listener, app).await?;
  Ok(())
}
