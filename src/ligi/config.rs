use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::LigiError;
use crate::ligi::walk::build_ignore_set;

include!(concat!(env!("OUT_DIR"), "/ligi_env_allowlist.rs"));

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LigiIndexConfig {
    pub ignore_patterns: Vec<String>,
    pub follow_symlinks: bool,
    pub fill_links: bool,
}

impl Default for LigiIndexConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: vec!["*.tmp".to_string()],
            follow_symlinks: false,
            fill_links: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LigiGlobalConfig {
    /// Merge into the home index after every local `index` run.
    pub enabled: bool,
    /// Regenerate each repository's local index during a global rebuild.
    pub rebuild_local: bool,
}

impl Default for LigiGlobalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rebuild_local: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LigiConfig {
    pub index: LigiIndexConfig,
    pub global: LigiGlobalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLigiConfig {
    index: Option<LigiIndexConfig>,
    global: Option<LigiGlobalConfig>,
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn env_or_csv(var: &str, fallback: &[String]) -> Vec<String> {
    match env::var(var) {
        Ok(v) => v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect(),
        Err(_) => fallback.to_vec(),
    }
}

fn validate(cfg: &LigiConfig) -> Result<()> {
    build_ignore_set(&cfg.index.ignore_patterns)
        .map_err(|err| LigiError::InvalidConfig(format!("{err:#}")))?;
    Ok(())
}

fn merge_file_config(base: &mut LigiConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)
        .map_err(|err| LigiError::InvalidConfig(format!("{}: {err}", path.display())))?;
    let parsed: PartialLigiConfig = toml::from_str(&raw)
        .map_err(|err| LigiError::InvalidConfig(format!("{}: {err}", path.display())))?;
    if let Some(index) = parsed.index {
        base.index = index;
    }
    if let Some(global) = parsed.global {
        base.global = global;
    }
    Ok(())
}

/// Defaults, then the TOML file at `path`, then `LIGI_*` environment overrides.
pub fn load_config(path: &Path) -> Result<LigiConfig> {
    let mut cfg = LigiConfig::default();
    merge_file_config(&mut cfg, path)?;

    cfg.index.ignore_patterns = env_or_csv("LIGI_IGNORE_PATTERNS", &cfg.index.ignore_patterns);
    cfg.index.follow_symlinks = env_or_bool("LIGI_FOLLOW_SYMLINKS", cfg.index.follow_symlinks);
    cfg.index.fill_links = env_or_bool("LIGI_FILL_LINKS", cfg.index.fill_links);
    cfg.global.enabled = env_or_bool("LIGI_GLOBAL_ENABLED", cfg.global.enabled);
    cfg.global.rebuild_local = env_or_bool("LIGI_REBUILD_LOCAL", cfg.global.rebuild_local);

    validate(&cfg)?;
    Ok(cfg)
}

/// `LIGI_*` variables set in the environment that nothing reads, usually typos.
pub fn unknown_env_keys() -> Vec<String> {
    let mut out: Vec<String> = env::vars()
        .map(|(key, _)| key)
        .filter(|key| key.starts_with("LIGI_"))
        .filter(|key| !GENERATED_LIGI_ENV_ALLOWLIST.contains(&key.as_str()))
        .collect();
    out.sort();
    out
}
