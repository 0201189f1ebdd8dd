//! CLI command implementations.

pub mod cache;
pub mod check;
pub mod config;
pub mod rules;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use docguard::{Authorizer, DeclarationTable, FileCache, MemoryCache, RuleCache};
use docguard_config::{CacheBackend, ConfigLoader, DocguardConfig};
use tracing::debug;

/// Exit code for a denied check.
pub const EXIT_DENIED: u8 = 1;

/// Exit code for anything that prevented a verdict.
pub const EXIT_FATAL: u8 = 2;

/// Loads configuration for `project`, or for the current directory.
pub fn load_config(project: Option<&Path>) -> Result<DocguardConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(project) = project {
        loader = loader.with_project_dir(project);
    }
    loader.load().context("Failed to load configuration")
}

/// Builds an authorizer from the declaration file and configured cache.
pub fn authorizer(config: &DocguardConfig, decl: Option<&Path>) -> Result<Authorizer> {
    let decl_path = decl.unwrap_or(config.declarations.path.as_path());
    let table = DeclarationTable::load(decl_path)
        .with_context(|| format!("Failed to load declarations from {}", decl_path.display()))?;

    let cache: Arc<dyn RuleCache> = match config.cache.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::File => {
            let fingerprint = fingerprint(decl_path)?;
            Arc::new(
                FileCache::open_with_fingerprint(&config.cache.path, fingerprint).with_context(
                    || format!("Failed to open rule cache at {}", config.cache.path.display()),
                )?,
            )
        }
    };
    debug!(
        declarations = %decl_path.display(),
        cache = ?config.cache.backend,
        "Building authorizer"
    );

    let authorizer = Authorizer::with_cache(Arc::new(table), cache)
        .with_default_mode(config.evaluation.default_mode);

    Ok(if config.evaluation.audit {
        authorizer
    } else {
        authorizer.without_audit()
    })
}

/// blake3 of the declaration file. A persisted cache built from other
/// declarations is discarded on open.
fn fingerprint(decl_path: &Path) -> Result<String> {
    let bytes = fs::read(decl_path)
        .with_context(|| format!("Failed to read declarations from {}", decl_path.display()))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
