pub mod auth;
pub mod sync;
