use rootwalk_domain::{CliOverrides, Config};

/// Runs before logging is initialised, so failures travel only through the
/// returned error.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    Config::load(path, overrides)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
