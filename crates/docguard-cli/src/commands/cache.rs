//! `docguard cache`: manage the persisted rule cache.

use anyhow::{Context, Result};
use docguard::FileCache;
use docguard_config::{CacheBackend, DocguardConfig};

/// Empties the configured file cache.
pub fn clear(config: &DocguardConfig) -> Result<()> {
    match config.cache.backend {
        CacheBackend::Memory => {
            println!("Memory cache is per-process; nothing to clear.");
        }
        CacheBackend::File => {
            let path = &config.cache.path;
            FileCache::reset(path)
                .with_context(|| format!("Failed to clear rule cache at {}", path.display()))?;
            println!("Cleared rule cache at {}", path.display());
        }
    }
    Ok(())
}
