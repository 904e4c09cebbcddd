//! Active/passive replication pair with an external failover monitor.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod net;
pub mod node;
pub mod observability;
pub mod protocol;
pub mod replication;
pub mod state;

pub use config::ClusterConfig;
pub use health::Monitor;
pub use lifecycle::Shutdown;
pub use node::{BackupNode, PrimaryNode};
