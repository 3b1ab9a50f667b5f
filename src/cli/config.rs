//! Config command implementation

use crate::core::config::Config;
use crate::core::error::{Error, Result};

/// Print the effective configuration
pub fn run(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).map_err(|e| Error::Config {
        message: format!("Failed to render config: {}", e),
    })?;
    print!("{}", rendered);
    Ok(())
}
