pub mod user_identity;
