//! Generation entry point that hides registry wiring.

use std::path::Path;

use asnforge_config::EngineConfig;
use asnforge_core::{Item, Result};
use asnforge_engine::{generate, GenerateOptions, GenerateResult, Registry};
use tracing::info;

/// Builds a registry from `config` and groups `pool` with it.
///
/// With the `console` feature, console output is initialized first.
pub fn run(pool: &[Item], config: &EngineConfig) -> Result<GenerateResult> {
    #[cfg(feature = "console")]
    asnforge_console::init();

    let registry = Registry::from_config(config)?;
    let options = GenerateOptions::from_config(config);
    let result = generate(pool, &registry, &options)?;

    info!(
        event = "run_complete",
        exit_code = result.exit_status().code(),
        associations = result.associations.len(),
    );
    Ok(result)
}

/// Loads the configuration at `path` (TOML or YAML) and calls [`run`].
pub fn run_from_file(pool: &[Item], path: impl AsRef<Path>) -> Result<GenerateResult> {
    let config = EngineConfig::load(path)?;
    run(pool, &config)
}
