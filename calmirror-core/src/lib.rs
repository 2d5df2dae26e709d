//! Core types and decision logic for calmirror.
//!
//! The crate is split into a pure decision layer and an effect layer:
//! - `naming`, `transform`, `diff` and the planning half of `handover` never
//!   touch the network and are fully testable in isolation
//! - `apply` and `sync` drive a [`CalendarClient`] to turn decisions into writes
//!
//! Calendar providers implement [`CalendarClient`]; [`MemoryCalendar`] is an
//! in-process implementation used by the test suites.

pub mod apply;
pub mod client;
pub mod config;
pub mod diff;
pub mod error;
pub mod event;
pub mod handover;
pub mod memory;
pub mod naming;
pub mod sync;
pub mod transform;
pub mod window;

pub use client::{CalendarClient, EventFilter};
pub use error::{CalMirrorError, CalMirrorResult};
pub use event::*;
pub use memory::MemoryCalendar;
pub use window::TimeWindow;
