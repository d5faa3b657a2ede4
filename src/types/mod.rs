//! Core types for the OpenRemote tool facade.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (ServiceId, ServiceIdentity, etc.)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for the platform connection and service descriptor

mod config;
mod errors;
mod ids;

pub use config::{Config, ObservabilityConfig, OpenRemoteConfig, ServiceConfig};
pub use errors::{Error, RemoteFailure, Result};
pub use ids::{ServiceId, ServiceIdentity};
