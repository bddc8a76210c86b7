use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;

/// Print the example configuration, write the active one to `write`, or
/// print the active one.
pub fn execute(config: &Config, example: bool, write: Option<PathBuf>) -> Result<()> {
    if example {
        print!("{}", Config::example_toml()?);
        return Ok(());
    }

    match write {
        Some(path) => {
            config.save_to_file(&path)?;
            log::info!("Configuration written to {}", path.display());
        }
        None => print!("{}", toml::to_string_pretty(config)?),
    }
    Ok(())
}
