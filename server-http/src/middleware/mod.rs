pub mod admin_auth;
pub mod redact;

pub use admin_auth::{ADMIN_SECRET_HEADER, require_admin};
pub use redact::redact_server_errors;
