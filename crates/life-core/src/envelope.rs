//! Execution envelope construction.
//!
//! Turns a [`JobDefinition`] plus caller-supplied named arguments into the
//! `{job_id, payload}` structure the execution engine accepts. Filter-tagged
//! arguments accumulate into a single `payload["filters"]` list so several
//! independent CLI flags can combine into one structured query.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::jobdef::{JobDefinition, FILTERS_KEY};

/// Ephemeral per-invocation input to the execution engine. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionEnvelope {
    pub job_id: String,
    pub payload: Map<String, Value>,
}

/// Substitute definition defaults for arguments the caller omitted.
///
/// Defaults apply here, at argument-collection time, so [`build_envelope`]
/// only ever sees already-defaulted values and performs no substitution of
/// its own. Caller-supplied values always win.
pub fn apply_defaults(def: &JobDefinition, mut args: Map<String, Value>) -> Map<String, Value> {
    for (name, spec) in def.cli.args.iter() {
        if let Some(default) = &spec.default {
            args.entry(name.to_string())
                .or_insert_with(|| default.clone());
        }
    }
    args
}

/// Build the execution envelope for `def` from already-defaulted `args`.
///
/// Arguments absent from `args` are skipped; `output_only` arguments never
/// enter the payload; filter-tagged arguments become ordered
/// `{column, op, value}` clauses under `payload["filters"]` (the key is only
/// present when at least one clause accumulated). Malformed filter specs are
/// rejected at definition load time and cannot reach this function.
pub fn build_envelope(def: &JobDefinition, args: &Map<String, Value>) -> ExecutionEnvelope {
    let mut payload = Map::new();
    let mut filters: Vec<Value> = Vec::new();

    for (name, spec) in def.cli.args.iter() {
        let Some(value) = args.get(name) else {
            continue;
        };
        if spec.output_only {
            continue;
        }
        if spec.is_filter() {
            if let Some(column) = &spec.filter_column {
                filters.push(json!({
                    "column": column,
                    "op": spec.filter_op.as_deref().unwrap_or("="),
                    "value": value,
                }));
            }
            continue;
        }
        let key = spec.maps_to.clone().unwrap_or_else(|| name.to_string());
        payload.insert(key, value.clone());
    }

    if !filters.is_empty() {
        payload.insert(FILTERS_KEY.to_string(), Value::Array(filters));
    }

    ExecutionEnvelope {
        job_id: def.wraps.clone(),
        payload,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn def(yaml: &str) -> JobDefinition {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn scalar_args_map_to_payload_keys() {
        let d = def(r#"
job_id: peek.clients
wraps: peek.clients
cli:
  args:
    limit:
      maps_to: limit
output:
  type: rows
  renderer: table
"#);
        let env = build_envelope(&d, &args(json!({"limit": 5})));
        assert_eq!(env.job_id, "peek.clients");
        assert_eq!(env.payload, args(json!({"limit": 5})));
    }

    #[test]
    fn arg_name_is_payload_key_when_maps_to_absent() {
        let d = def(r#"
job_id: t
wraps: engine.job
cli:
  args:
    subject: {}
output:
  type: status
  renderer: table
"#);
        let env = build_envelope(&d, &args(json!({"subject": "hello"})));
        assert_eq!(env.payload, args(json!({"subject": "hello"})));
    }

    #[test]
    fn omitted_args_are_skipped() {
        let d = def(r#"
job_id: t
wraps: t
cli:
  args:
    limit:
      maps_to: limit
    offset:
      maps_to: offset
output:
  type: rows
  renderer: table
"#);
        let env = build_envelope(&d, &args(json!({"limit": 5})));
        assert_eq!(env.payload, args(json!({"limit": 5})));
    }

    #[test]
    fn output_only_args_never_enter_the_payload() {
        let d = def(r#"
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
"#);
        let env = build_envelope(&d, &args(json!({"limit": 5, "format": "json"})));
        assert_eq!(env.payload, args(json!({"limit": 5})));
    }

    #[test]
    fn filter_args_accumulate_in_declaration_order() {
        let d = def(r#"
job_id: t
wraps: t
cli:
  args:
    id:
      maps_to: filters
      filter_column: client_id
    since:
      maps_to: filters
      filter_column: created_at
      filter_op: ">="
output:
  type: rows
  renderer: table
"#);
        let env = build_envelope(&d, &args(json!({"id": "abc", "since": "2024-01-01"})));
        let filters = env.payload.get("filters").unwrap().as_array().unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(
            filters[0],
            json!({"column": "client_id", "op": "=", "value": "abc"})
        );
        assert_eq!(
            filters[1],
            json!({"column": "created_at", "op": ">=", "value": "2024-01-01"})
        );
    }

    #[test]
    fn no_filters_key_when_no_filter_args_present() {
        let d = def(r#"
job_id: t
wraps: t
cli:
  args:
    id:
      maps_to: filters
      filter_column: client_id
    limit:
      maps_to: limit
output:
  type: rows
  renderer: table
"#);
        let env = build_envelope(&d, &args(json!({"limit": 10})));
        assert!(!env.payload.contains_key("filters"));
    }

    #[test]
    fn apply_defaults_fills_only_absent_args() {
        let d = def(r#"
job_id: t
wraps: t
cli:
  args:
    limit:
      maps_to: limit
      default: 20
    format:
      maps_to: format
      output_only: true
      default: table
output:
  type: rows
  renderer: table
"#);
        let with = apply_defaults(&d, args(json!({"limit": 5})));
        assert_eq!(with.get("limit"), Some(&json!(5)));
        assert_eq!(with.get("format"), Some(&json!("table")));

        let empty = apply_defaults(&d, Map::new());
        assert_eq!(empty.get("limit"), Some(&json!(20)));
    }

    #[test]
    fn defaulted_then_built_matches_end_to_end_scenario() {
        let d = def(r#"
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
"#);
        let caller = apply_defaults(&d, args(json!({"limit": 5, "format": "json"})));
        let env = build_envelope(&d, &caller);
        assert_eq!(env.job_id, "peek.clients");
        assert_eq!(env.payload, args(json!({"limit": 5})));
    }

    #[test]
    fn envelope_serializes_as_job_id_and_payload() {
        let d = def(r#"
job_id: t
wraps: engine.job
cli:
  args:
    limit:
      maps_to: limit
output:
  type: rows
  renderer: table
"#);
        let env = build_envelope(&d, &args(json!({"limit": 5})));
        let serialized = serde_json::to_value(&env).unwrap();
        assert_eq!(
            serialized,
            json!({"job_id": "engine.job", "payload": {"limit": 5}})
        );
    }
}
