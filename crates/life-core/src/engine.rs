//! Boundary to the external lorchestra execution engine.
//!
//! The engine is an opaque collaborator: it accepts an envelope as JSON on
//! stdin and reports a result as JSON on stdout. Retry policy, validation,
//! and event logging all live on its side of the boundary; this module does
//! not catch, suppress, or retry anything.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::envelope::ExecutionEnvelope;
use crate::error::{LifeError, Result};

pub const DEFAULT_ENGINE_BIN: &str = "lorchestra";
pub const ENGINE_BIN_ENV: &str = "LORCHESTRA_BIN";

/// Result reported by the engine. Read-only input to rendering; fields the
/// engine adds beyond these are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub run_id: String,
    #[serde(default)]
    pub step_outputs: Map<String, Value>,
}

/// The seam between envelope construction and actual execution. The CLI
/// wires in [`LorchestraEngine`]; tests wire in stubs.
pub trait ExecutionEngine {
    fn execute(&self, envelope: &ExecutionEnvelope) -> Result<ExecutionResult>;
}

/// Process-backed engine: runs `lorchestra execute`, feeding the envelope
/// JSON to stdin and parsing the result JSON from stdout.
#[derive(Debug, Clone)]
pub struct LorchestraEngine {
    binary: PathBuf,
}

impl LorchestraEngine {
    /// Locate the engine binary: `LORCHESTRA_BIN` override first, then PATH.
    pub fn discover() -> Result<Self> {
        if let Ok(bin) = std::env::var(ENGINE_BIN_ENV) {
            return Ok(Self {
                binary: PathBuf::from(bin),
            });
        }
        let binary = which::which(DEFAULT_ENGINE_BIN)
            .map_err(|_| LifeError::EngineNotFound(DEFAULT_ENGINE_BIN.to_string()))?;
        Ok(Self { binary })
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl ExecutionEngine for LorchestraEngine {
    fn execute(&self, envelope: &ExecutionEnvelope) -> Result<ExecutionResult> {
        let input = serde_json::to_string(envelope)?;

        let mut child = Command::new(&self.binary)
            .arg("execute")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            // engine log lines flow through to the terminal
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                LifeError::EngineFailed(format!(
                    "failed to spawn {}: {e}",
                    self.binary.display()
                ))
            })?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(input.as_bytes()).map_err(|e| {
                LifeError::EngineFailed(format!("failed to write envelope: {e}"))
            })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| LifeError::EngineFailed(e.to_string()))?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        // A nonzero exit with parseable result JSON is an engine-reported
        // failure (the run failed), not a crash — the result still renders.
        match serde_json::from_str::<ExecutionResult>(stdout.trim()) {
            Ok(result) => Ok(result),
            Err(_) if !output.status.success() => {
                let hint: String = stdout.chars().take(500).collect();
                Err(LifeError::EngineFailed(format!(
                    "{}: {hint}",
                    output.status
                )))
            }
            Err(e) => Err(LifeError::EngineFailed(format!(
                "unparseable engine output: {e}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
