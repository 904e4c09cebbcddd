//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (--config)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → positional CLI arguments override individual fields
//!     → validated again, then handed to the role being started
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a node starts
//! - All fields have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{BackupConfig, ClusterConfig, LogFormat, MonitorConfig, ObservabilityConfig, PrimaryConfig};
pub use validation::ValidationError;
