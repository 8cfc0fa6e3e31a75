//! Session issued by signup and login.

use crate::models::user::user_identity::UserIdentity;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserIdentity,
}
