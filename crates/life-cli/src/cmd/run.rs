use std::path::Path;

use life_core::engine::{ExecutionEngine, LorchestraEngine};
use life_core::envelope::{apply_defaults, build_envelope};
use life_core::jobdef::{self, OutputSpec};
use life_core::render::{render, OutputFormat};
use serde_json::{Map, Value};

use crate::args;

// ---------------------------------------------------------------------------
// RunExit — typed non-zero exit codes (no std::process::exit in library code)
// ---------------------------------------------------------------------------

/// Engine-reported run failure, distinct from CLI errors: the status has
/// already been rendered when this is returned, and it exits 2 where broken
/// invocations exit 1.
#[derive(Debug)]
pub enum RunExit {
    JobFailed { run_id: String },
}

impl RunExit {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunExit::JobFailed { .. } => 2,
        }
    }
}

impl std::fmt::Display for RunExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunExit::JobFailed { run_id } => {
                write!(f, "run {run_id} reported failure")
            }
        }
    }
}

impl std::error::Error for RunExit {}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub fn run(
    defs_dir: &Path,
    job_id: &str,
    raw_args: &[String],
    format: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let def = jobdef::find(defs_dir, job_id)?;

    let caller = args::parse_pairs(raw_args)?;
    let caller = apply_defaults(&def, caller);
    let format = resolve_format(format, &caller, &def.output)?;

    let envelope = build_envelope(&def, &caller);

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    let engine = LorchestraEngine::discover()?;
    let result = engine.execute(&envelope)?;

    let stdout = std::io::stdout();
    render(&result, &def.output, format, &mut stdout.lock())?;

    if !result.success {
        return Err(RunExit::JobFailed {
            run_id: result.run_id,
        }
        .into());
    }
    Ok(())
}

/// Format priority: `--format` flag, then a caller-supplied `format`
/// argument (including a definition default), then the definition's renderer.
/// The renderer is validated at load time, so the final fallback can't fail
/// for a stored definition.
fn resolve_format(
    flag: Option<&str>,
    caller: &Map<String, Value>,
    output: &OutputSpec,
) -> anyhow::Result<OutputFormat> {
    if let Some(s) = flag {
        return Ok(s.parse()?);
    }
    if let Some(s) = caller.get("format").and_then(Value::as_str) {
        return Ok(s.parse()?);
    }
    Ok(output.renderer.parse()?)
}
