pub mod fill_links;
pub mod index;
pub mod prune;
pub mod rebuild_global;

use anyhow::Result;
use serde::Serialize;

use crate::ligi::audit;
use crate::ligi::config::{LigiConfig, load_config, unknown_env_keys};
use crate::ligi::paths::{LigiPaths, resolve_paths};
use crate::ligi::walk::ScanOptions;
use crate::ligi::warn::{self, WarnEvent};

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    /// Warnings are reported but do not fail the command.
    pub fn add_warnings(&mut self, mut lines: Vec<String>) {
        self.warnings.append(&mut lines);
    }
}

/// Paths, config and scan options shared by every command.
pub struct CommandContext {
    pub paths: LigiPaths,
    pub config: LigiConfig,
    pub scan: ScanOptions,
}

pub fn load_context(report: &mut CommandReport) -> Result<CommandContext> {
    let paths = resolve_paths()?;
    let config = load_config(&paths.config_file)?;
    let scan = ScanOptions::new(
        &config.index.ignore_patterns,
        config.index.follow_symlinks,
    )?;

    for key in unknown_env_keys() {
        report.add_warnings(vec![warn::emit(WarnEvent {
            code: "UNKNOWN_ENV",
            stage: "config",
            action: "read-env",
            path: &key,
            reason: "not-a-ligi-setting",
            err: "",
        })]);
    }

    Ok(CommandContext {
        paths,
        config,
        scan,
    })
}

/// Append the outcome to the audit log; a failure here only warns.
pub fn record_audit(paths: &LigiPaths, report: &mut CommandReport) {
    let status = if report.ok { "ok" } else { "issues" };
    let message = report.details.join("; ");
    if let Err(err) = audit::append_event(paths, &report.command, status, &message) {
        let line = warn::emit(WarnEvent {
            code: "AUDIT_WRITE_FAILED",
            stage: "audit",
            action: "append-event",
            path: &paths.logs_dir.display().to_string(),
            reason: "audit-skipped",
            err: &format!("{err:#}"),
        });
        report.add_warnings(vec![line]);
    }
}
