pub mod auth;
pub mod email;
