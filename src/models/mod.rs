//! Typed records shared across layers.

pub mod history;
pub mod request;
pub mod response;
pub mod smtp_config;
pub mod user;
