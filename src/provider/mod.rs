//! Label-driven configuration provider.
//!
//! # Data Flow
//! ```text
//! instance snapshot (Vec<Instance>)
//!     → builder.rs
//!         → labels::decode_labels (per instance)
//!         → constraints::check_instance (keep / drop)
//!         → endpoint.rs (addresses and ports of synthesized servers)
//!         → rule::RuleTemplate (default rules)
//!     → merge.rs (union services, fail closed on conflicts)
//!     → Configuration
//! ```
//!
//! # Design Decisions
//! - One build per snapshot; nothing is carried between cycles
//! - Settings are passed in, never read from globals

pub mod builder;
pub mod endpoint;
pub mod file;
pub mod instance;
pub mod merge;

pub use builder::ConfigurationBuilder;
pub use endpoint::EndpointError;
pub use file::load_file;
pub use instance::{load_snapshot, Instance, InstanceState, NetworkAddress};
pub use merge::{merge, Merger};
