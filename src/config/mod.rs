//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Settings (validated, immutable)
//!     → ProviderConfig handed to the ConfigurationBuilder
//!
//! On snapshot change:
//!     watcher.rs detects change
//!     → provider::load_snapshot reads the instances
//!     → builder rebuilds the Configuration
//!     → store.rs swaps the published generation
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_settings, ConfigError};
pub use schema::{LogFormat, ObservabilityConfig, ProviderConfig, Settings, WatchConfig};
pub use watcher::SnapshotWatcher;
