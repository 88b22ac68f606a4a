//! Artifact Engine Config
//!
//! This crate contains the serializable configuration types for artifact-engine.
//! A [`ProviderConfig`] describes one filesystem provider root; a [`CopyJob`]
//! pairs a source and a destination provider.
//!
//! Configuration can be loaded from JSON files (via CLI with `--job=job.json`).

mod error;
mod job;
mod provider;

pub use error::ConfigError;
pub use job::CopyJob;
pub use provider::ProviderConfig;
