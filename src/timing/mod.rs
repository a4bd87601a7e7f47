//! The append-only event log and the single-active-context state machine.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
