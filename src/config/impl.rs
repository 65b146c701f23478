use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Current static configuration. Panics if neither [`init_config`] nor
/// [`init_config_with`] has run.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get()
        .expect("static config read before init_config()")
        .load_full()
}

/// Read `config.toml` plus `MJ__*` variables once. Repeat calls keep the
/// first result.
pub fn init_config() {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load()));
}

/// Use `config` as the static configuration, overriding whatever was loaded.
pub fn init_config_with(config: StaticConfig) {
    let slot = CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()));
    slot.store(Arc::new(config));
}
