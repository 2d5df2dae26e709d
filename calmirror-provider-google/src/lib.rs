//! Google Calendar access for calmirror.
//!
//! [`GoogleCalendar`] implements [`calmirror_core::CalendarClient`] over the
//! Calendar v3 REST API. OAuth sessions are stored per account name under
//! ~/.config/calmirror/google/session/ and created with [`authenticate`].

pub mod app_config;
pub mod authenticate;
pub mod client;
pub mod session;
pub mod wire;

pub use authenticate::authenticate;
pub use client::GoogleCalendar;
