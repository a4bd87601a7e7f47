//! Adaptive rest suggestions reacting to switching behavior (§4.F).

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
