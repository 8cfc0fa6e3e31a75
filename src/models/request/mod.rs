pub mod auth_request;
pub mod dispatch_request;
