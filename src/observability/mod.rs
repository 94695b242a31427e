//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (instance, router, service, ...)
//!     → logging.rs subscriber (env filter + pretty or JSON formatter)
//!     → stderr
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - JSON format for machine parsing, pretty format for development

pub mod logging;
