//! mailroom library entrypoint.
//!
//! Modules:
//! - `app`: startup, configuration, shared state
//! - `http`: Axum router, CORS and handlers
//! - `dispatch`: the validate-send-record pipeline behind `POST /send`
//! - `identity`: accounts and bearer sessions
//! - `store`: SMTP configurations and send history
//! - `smtp`: outbound delivery through `lettre`
//! - `db`: migrations and SQLite helpers
//! - `models`: typed records used across layers
//! - `error`: crate error type and its HTTP mapping
//! - `util`: tracing and header helpers

pub mod app;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod identity;
pub mod models;
pub mod smtp;
pub mod store;
pub mod util;
