use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, load_context, record_audit};
use crate::ligi::link_fill::{fill_art_tree, fill_document};
use crate::ligi::paths::resolve_art_root;

#[derive(Debug, Clone)]
pub struct FillLinksOptions {
    pub root: PathBuf,
    pub file: Option<PathBuf>,
}

pub fn run(opts: &FillLinksOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("fill-links");
    let ctx = load_context(&mut report)?;
    let art_root = resolve_art_root(&opts.root)?;
    report.detail(format!("art_root={}", art_root.display()));

    match &opts.file {
        Some(file) => {
            let added = fill_document(&art_root, file)?;
            report.detail(format!("links_added={added}"));
        }
        None => {
            let out = fill_art_tree(&art_root, &ctx.scan);
            report.detail(format!(
                "documents_scanned={} documents_changed={} links_added={}",
                out.documents_scanned, out.documents_changed, out.links_added
            ));
            report.add_warnings(out.warnings);
        }
    }

    record_audit(&ctx.paths, &mut report);
    Ok(report)
}
