//! `docguard config`: show the resolved configuration.

use anyhow::{Context, Result};
use docguard_config::DocguardConfig;

pub fn run(config: &DocguardConfig) -> Result<()> {
    let rendered = config.to_toml().context("Failed to render configuration")?;
    print!("{rendered}");
    Ok(())
}
