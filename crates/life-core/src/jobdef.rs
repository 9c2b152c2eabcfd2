//! Declarative job definitions and the directory-backed store.
//!
//! One YAML document per job describes how a CLI-facing job maps onto an
//! engine job id (`wraps`) and how caller arguments shape the payload.
//! Definitions are loaded fresh on every invocation; there are only tens of
//! them, so the store is a directory scan with no index or cache.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{LifeError, Result};
use crate::render::OutputFormat;

/// Sentinel `maps_to` value: the argument contributes a filter clause
/// instead of a scalar payload field.
pub const FILTERS_KEY: &str = "filters";

// ---------------------------------------------------------------------------
// ArgSpec / ArgSpecs
// ---------------------------------------------------------------------------

/// How one named CLI argument maps into the execution payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArgSpec {
    /// Target payload key, or [`FILTERS_KEY`] for filter-contributing args.
    /// When absent, the argument name itself is the payload key.
    #[serde(default)]
    pub maps_to: Option<String>,

    /// Column a filter clause targets. Required when `maps_to == "filters"`.
    #[serde(default)]
    pub filter_column: Option<String>,

    /// Filter operator, defaulting to `=` when unspecified.
    #[serde(default)]
    pub filter_op: Option<String>,

    /// Output-only arguments affect rendering and never enter the payload.
    #[serde(default)]
    pub output_only: bool,

    /// Default value substituted when the caller omits the argument.
    #[serde(default)]
    pub default: Option<Value>,
}

impl ArgSpec {
    pub fn is_filter(&self) -> bool {
        self.maps_to.as_deref() == Some(FILTERS_KEY)
    }
}

/// Ordered argument name → spec mapping.
///
/// Declaration order is observable (filter clauses accumulate in it), and
/// serde's default map types don't preserve it, so the entries are kept as a
/// vector of pairs deserialized straight off the YAML mapping.
#[derive(Debug, Clone, Default)]
pub struct ArgSpecs(Vec<(String, ArgSpec)>);

impl ArgSpecs {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgSpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn get(&self, name: &str) -> Option<&ArgSpec> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ArgSpec)> for ArgSpecs {
    fn from_iter<T: IntoIterator<Item = (String, ArgSpec)>>(iter: T) -> Self {
        ArgSpecs(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for ArgSpecs {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ArgSpecsVisitor;

        impl<'de> Visitor<'de> for ArgSpecsVisitor {
            type Value = ArgSpecs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a mapping of argument name to argument spec")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<ArgSpecs, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some((name, spec)) = map.next_entry::<String, ArgSpec>()? {
                    entries.push((name, spec));
                }
                Ok(ArgSpecs(entries))
            }
        }

        deserializer.deserialize_map(ArgSpecsVisitor)
    }
}

// ---------------------------------------------------------------------------
// CliSpec / OutputSpec / JobDefinition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliSpec {
    #[serde(default)]
    pub args: ArgSpecs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Tabular data extracted from a step output.
    Rows,
    /// A single execution outcome (success indicator + run id).
    Status,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSpec {
    #[serde(rename = "type")]
    pub kind: OutputKind,

    /// Presentation format used when the caller picks none.
    pub renderer: String,

    /// Step whose output carries the row collection for `rows`-typed jobs.
    /// Defaults to the engine's convention of naming that step `read`.
    #[serde(default = "default_source_step")]
    pub source_step: String,
}

fn default_source_step() -> String {
    "read".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobDefinition {
    pub job_id: String,
    /// Engine job id this definition delegates to.
    pub wraps: String,
    pub cli: CliSpec,
    pub output: OutputSpec,
}

impl JobDefinition {
    /// Definition-authoring checks, applied at load time so malformed arg
    /// specs never reach the envelope builder.
    fn validate(&self) -> std::result::Result<(), String> {
        for (name, spec) in self.cli.args.iter() {
            if spec.is_filter() && spec.filter_column.is_none() {
                return Err(format!(
                    "arg '{name}' maps to filters but has no filter_column"
                ));
            }
        }
        self.output
            .renderer
            .parse::<OutputFormat>()
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store operations
// ---------------------------------------------------------------------------

/// Load every definition document in `dir`, in sorted filename order.
///
/// One malformed document fails the whole load with the offending path in
/// the error. Definitions describe what the CLI can do, so a broken one is a
/// configuration defect to surface, not a document to skip.
pub fn load_all(dir: &Path) -> Result<Vec<JobDefinition>> {
    if !dir.is_dir() {
        return Err(LifeError::DefinitionLoad {
            path: dir.to_path_buf(),
            reason: "definitions directory not found".to_string(),
        });
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    paths.sort();

    let mut defs = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for path in paths {
        let data = std::fs::read_to_string(&path).map_err(|e| LifeError::DefinitionLoad {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let def: JobDefinition =
            serde_yaml::from_str(&data).map_err(|e| LifeError::DefinitionLoad {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        def.validate().map_err(|reason| LifeError::DefinitionLoad {
            path: path.clone(),
            reason,
        })?;
        if !seen.insert(def.job_id.clone()) {
            return Err(LifeError::DefinitionLoad {
                path,
                reason: format!("duplicate job_id '{}'", def.job_id),
            });
        }
        defs.push(def);
    }
    Ok(defs)
}

/// Find the definition with the given `job_id`, loading the directory fresh.
pub fn find(dir: &Path, job_id: &str) -> Result<JobDefinition> {
    load_all(dir)?
        .into_iter()
        .find(|d| d.job_id == job_id)
        .ok_or_else(|| LifeError::JobNotFound(job_id.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PEEK_CLIENTS: &str = r#"
job_id: peek.clients
wraps: peek.clients
cli:
  args:
    limit:
      maps_to: limit
      default: 20
    format:
      maps_to: format
      output_only: true
output:
  type: rows
  renderer: table
"#;

    #[test]
    fn parses_full_definition() {
        let def: JobDefinition = serde_yaml::from_str(PEEK_CLIENTS).unwrap();
        assert_eq!(def.job_id, "peek.clients");
        assert_eq!(def.wraps, "peek.clients");
        assert_eq!(def.cli.args.len(), 2);
        assert_eq!(def.output.kind, OutputKind::Rows);
        assert_eq!(def.output.source_step, "read");

        let limit = def.cli.args.get("limit").unwrap();
        assert_eq!(limit.maps_to.as_deref(), Some("limit"));
        assert_eq!(limit.default, Some(serde_json::json!(20)));
        assert!(def.cli.args.get("format").unwrap().output_only);
    }

    #[test]
    fn args_preserve_declaration_order() {
        let yaml = r#"
job_id: t
wraps: t
cli:
  args:
    zulu: {}
    alpha: {}
    mike: {}
output:
  type: status
  renderer: table
"#;
        let def: JobDefinition = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<&str> = def.cli.args.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["zulu", "alpha", "mike"]);
    }

    #[test]
    fn filter_arg_without_column_fails_validation() {
        let yaml = r#"
job_id: t
wraps: t
cli:
  args:
    since:
      maps_to: filters
output:
  type: rows
  renderer: table
"#;
        let def: JobDefinition = serde_yaml::from_str(yaml).unwrap();
        let err = def.validate().unwrap_err();
        assert!(err.contains("since"));
        assert!(err.contains("filter_column"));
    }

    #[test]
    fn unknown_renderer_fails_validation() {
        let yaml = r#"
job_id: t
wraps: t
cli:
  args: {}
output:
  type: status
  renderer: sparkline
"#;
        let def: JobDefinition = serde_yaml::from_str(yaml).unwrap();
        assert!(def.validate().unwrap_err().contains("sparkline"));
    }

    fn write_def(dir: &TempDir, name: &str, yaml: &str) {
        std::fs::write(dir.path().join(name), yaml).unwrap();
    }

    #[test]
    fn load_all_reads_every_document() {
        let dir = TempDir::new().unwrap();
        write_def(&dir, "peek-clients.yaml", PEEK_CLIENTS);
        write_def(
            &dir,
            "mail-sync.yaml",
            "job_id: mail.sync\nwraps: mail.sync\ncli:\n  args: {}\noutput:\n  type: status\n  renderer: table\n",
        );
        // Non-YAML files are not definition documents
        std::fs::write(dir.path().join("notes.txt"), "scratch").unwrap();

        let defs = load_all(dir.path()).unwrap();
        assert_eq!(defs.len(), 2);
        // Sorted filename order: mail-sync before peek-clients
        assert_eq!(defs[0].job_id, "mail.sync");
        assert_eq!(defs[1].job_id, "peek.clients");
    }

    #[test]
    fn load_all_fails_loudly_naming_the_bad_file() {
        let dir = TempDir::new().unwrap();
        write_def(&dir, "peek-clients.yaml", PEEK_CLIENTS);
        write_def(&dir, "broken.yaml", "job_id: [unclosed");

        let err = load_all(dir.path()).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"), "got: {err}");
    }

    #[test]
    fn load_all_rejects_duplicate_job_ids() {
        let dir = TempDir::new().unwrap();
        write_def(&dir, "a.yaml", PEEK_CLIENTS);
        write_def(&dir, "b.yaml", PEEK_CLIENTS);

        let err = load_all(dir.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate job_id"), "got: {err}");
    }

    #[test]
    fn load_all_missing_directory_errors() {
        let dir = TempDir::new().unwrap();
        let err = load_all(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, LifeError::DefinitionLoad { .. }));
    }

    #[test]
    fn find_returns_the_matching_definition() {
        let dir = TempDir::new().unwrap();
        write_def(&dir, "peek-clients.yaml", PEEK_CLIENTS);

        let def = find(dir.path(), "peek.clients").unwrap();
        assert_eq!(def.wraps, "peek.clients");
    }

    #[test]
    fn find_unknown_job_id_errors() {
        let dir = TempDir::new().unwrap();
        write_def(&dir, "peek-clients.yaml", PEEK_CLIENTS);

        let err = find(dir.path(), "peek.nothing").unwrap_err();
        assert!(matches!(err, LifeError::JobNotFound(ref id) if id == "peek.nothing"));
    }
}
