//! The task tree: hierarchical, taggable, soft-deletable timing targets.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
