//! Fuzz target for configuration parsing and registry construction.
//!
//! Arbitrary TOML must either fail to parse, fail validation, or produce a
//! registry; it must never panic.
//!
//! # Running
//!
//! ```bash
//! cargo +nightly fuzz run config_toml
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use limitgate_core::config::Config;
use limitgate_policy::registry::LimitRegistry;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = toml::from_str::<Config>(text) else {
        return;
    };
    if config.validate().is_err() {
        return;
    }
    if let Ok(registry) = LimitRegistry::from_config(&config.limits) {
        assert!(!registry.is_empty());
    }
});
