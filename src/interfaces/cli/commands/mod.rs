//! CLI command implementations

pub mod config_management;
mod create_superuser;
mod migrate;

pub use create_superuser::*;
pub use migrate::*;
