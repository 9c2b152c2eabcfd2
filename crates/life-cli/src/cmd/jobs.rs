use anyhow::Context;
use life_core::jobdef::{self, OutputKind};
use std::path::Path;

/// List every job definition in the directory. The listing performs a full
/// load, so it doubles as a validation pass over the documents.
pub fn run(defs_dir: &Path, json: bool) -> anyhow::Result<()> {
    let defs = jobdef::load_all(defs_dir).context("failed to load job definitions")?;

    if json {
        let out: Vec<_> = defs
            .iter()
            .map(|d| {
                serde_json::json!({
                    "job_id": d.job_id,
                    "wraps": d.wraps,
                    "output": kind_str(d.output.kind),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if defs.is_empty() {
        println!("No job definitions found in {}.", defs_dir.display());
        return Ok(());
    }

    for d in &defs {
        println!(
            "  {:<28} {:<28} {}",
            d.job_id,
            d.wraps,
            kind_str(d.output.kind)
        );
    }
    Ok(())
}

fn kind_str(kind: OutputKind) -> &'static str {
    match kind {
        OutputKind::Rows => "rows",
        OutputKind::Status => "status",
    }
}
