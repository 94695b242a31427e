//! Edge router dynamic configuration engine.
//!
//! Turns per-instance labels from service discovery into a routing
//! configuration of HTTP/TCP routers, services and middlewares.
//!
//! # Architecture Overview
//!
//! ```text
//!   discovery snapshot            settings.toml
//!   (Vec<Instance>)                    │
//!          │                           ▼
//!          │                   ┌──────────────┐
//!          │                   │    config    │
//!          │                   └──────┬───────┘
//!          ▼                          │ ProviderConfig
//!   ┌─────────────────────────────────▼──────────────────────┐
//!   │                  provider::builder                     │
//!   │  labels ──▶ decode ──▶ constraints ──▶ rule ──▶ merge  │
//!   └─────────────────────────────┬──────────────────────────┘
//!                                 │ Configuration (dynamic)
//!                                 ▼
//!                          ┌─────────────┐
//!                          │    store    │──▶ serving layer
//!                          └─────────────┘
//! ```

// Core subsystems
pub mod decode;
pub mod dynamic;
pub mod labels;
pub mod provider;
pub mod rule;

// Eligibility
pub mod constraints;

// Cross-cutting concerns
pub mod config;
pub mod observability;
pub mod store;

pub use config::schema::{ProviderConfig, Settings};
pub use dynamic::Configuration;
pub use provider::{ConfigurationBuilder, Instance};
pub use store::ConfigurationStore;
