//! Shared JSON Schema compilation for parameter files and rendered documents.
//!
//! Callers compile a schema once and collect every violation instead of
//! stopping at the first, so a bad parameter file is fixed in one pass.

use anyhow::{Result, anyhow, bail};
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

/// Draft-07 schema compiled from a JSON value.
pub(crate) struct CompiledSchema {
    compiled: JSONSchema,
}

impl CompiledSchema {
    /// Validation messages for `instance`, prefixed with the offending path.
    ///
    /// An empty list means the instance is valid.
    pub fn errors(&self, instance: &Value) -> Vec<String> {
        match self.compiled.validate(instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|err| {
                    let path = err.instance_path.to_string();
                    if path.is_empty() {
                        err.to_string()
                    } else {
                        format!("{path}: {err}")
                    }
                })
                .collect(),
        }
    }
}

pub(crate) fn compile_schema(schema: &Value) -> Result<CompiledSchema> {
    if !schema.is_object() {
        bail!("schema must be a JSON object");
    }
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|err| anyhow!("compiling schema: {err}"))?;
    Ok(CompiledSchema { compiled })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_all_violations_with_paths() {
        let schema = compile_schema(&json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string" },
                "count": { "type": "integer" }
            }
        }))
        .expect("schema compiles");

        assert!(schema.errors(&json!({"name": "ok"})).is_empty());

        let errors = schema.errors(&json!({"count": "three"}));
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("\"name\" is a required property")));
        assert!(errors.iter().any(|e| e.starts_with("/count:")));
    }

    #[test]
    fn rejects_non_object_schema() {
        assert!(compile_schema(&json!(["not", "a", "schema"])).is_err());
    }
}
