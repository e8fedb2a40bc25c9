pub mod admin_secret;

pub use admin_secret::{AdminAccess, AdminGate, constant_time_eq};
