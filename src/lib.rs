//! # OpenRemote Tools - agent tool facade for the OpenRemote IoT platform
//!
//! Exposes OpenRemote REST capabilities as typed, validated agent tools and
//! keeps this process registered with the platform as an external service:
//! - Type tag registry mapping platform attribute types to value types
//! - Schema compiler turning asset-type descriptors into record validators
//! - Tool compiler specializing the generic create operation per asset type
//! - Capability registration pass run once at startup
//! - Service lifecycle manager with a supervised heartbeat task
//! - MCP (JSON-RPC over stdio) host for the calling agent
//!
//! ## Architecture
//!
//! ```text
//!   startup:  ServiceManager::register ──► Platform (POST service)
//!                    │                          ▲
//!                    └─ HeartbeatTask ──────────┤ (PUT service/{sid}/{iid})
//!             tools::init_tools ── catalogue ───┘ (GET model/assetInfos)
//!                    │
//!                    ▼
//!   serving:  McpServer ─► McpRouter ─► ToolRegistry ─► Platform
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod mcp;
pub mod platform;
pub mod service;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;
pub mod validation;

pub use types::{Config, Error, Result};
