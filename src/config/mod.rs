pub mod definitions;
mod r#impl;
pub mod runtime_config;
mod structs;
pub mod types;
pub mod validators;

pub use r#impl::{get_config, init_config, init_config_with};
pub use runtime_config::{RuntimeConfig, keys};
pub use structs::*;
pub use types::ValueType;
