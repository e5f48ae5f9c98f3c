//! Helpers for schema documents that carry their source DOCX inline.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::error::Error;
use crate::model::Document;
use crate::overrides::OverrideSpec;

pub const SOURCE_FIELD: &str = "source_docx_base64";
pub const DEFAULTS_FIELD: &str = "global_defaults";

/// Decode the embedded source document.
pub fn source_bytes(schema: &Value) -> Result<Vec<u8>, Error> {
    let encoded = match schema.get(SOURCE_FIELD) {
        Some(Value::String(s)) => s,
        Some(_) => return Err(Error::Schema(format!("`{SOURCE_FIELD}` must be a string"))),
        None => return Err(Error::Schema(format!("missing `{SOURCE_FIELD}`"))),
    };
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::Schema(format!("`{SOURCE_FIELD}` is not valid base64: {e}")))
}

/// Page geometry recorded in the schema, as an override spec.
pub fn overrides(schema: &Value) -> Result<OverrideSpec, Error> {
    match schema.get(DEFAULTS_FIELD) {
        None | Some(Value::Null) => Ok(OverrideSpec::default()),
        Some(defaults) => OverrideSpec::from_json(defaults),
    }
}

/// Strip the schema's embedded source. `extra` wins over the schema's own
/// `global_defaults`.
pub fn strip_schema(schema: &Value, extra: Option<&OverrideSpec>) -> Result<Document, Error> {
    let mut spec = overrides(schema)?;
    if let Some(extra) = extra {
        spec = extra.clone().merge_over(spec);
    }
    let bytes = source_bytes(schema)?;
    crate::strip(bytes.as_slice(), Some(&spec))
}
