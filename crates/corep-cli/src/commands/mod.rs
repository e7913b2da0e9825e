//! Subcommand implementations
//!
//! Each `run` returns `Ok(false)` when the command completed but the data
//! failed its checks.

pub(crate) mod session;
pub(crate) mod templates;
pub(crate) mod validate;
pub(crate) mod verify;

use std::path::{Path, PathBuf};

use anyhow::Context;
use corep_core::SessionConfig;
use corep_schema::TemplateRegistry;
use serde_json::Value as JsonValue;

/// Global registry with any extra template files registered
pub(crate) fn registry(template_files: &[PathBuf]) -> anyhow::Result<&'static TemplateRegistry> {
    let registry = TemplateRegistry::global();
    if !template_files.is_empty() {
        let config = SessionConfig {
            template_files: template_files.to_vec(),
            ..SessionConfig::default()
        };
        config
            .register_templates(registry)
            .context("failed to register template files")?;
    }
    Ok(registry)
}

pub(crate) fn read_json(path: &Path) -> anyhow::Result<JsonValue> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}
