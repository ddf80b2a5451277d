//! Oracle response decoding
//!
//! The oracle replies with free text that is supposed to be a JSON object.
//! That makes it an untrusted boundary: all parsing happens here, in one
//! dedicated step returning a tagged result, and no caller ever assumes
//! shape.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{info, warn};

use lx_core::{ExtractedField, FieldSchema};

/// Outcome of decoding one oracle response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleDecode {
    /// Usable record contents: every schema field present, extras kept
    Record(BTreeMap<String, ExtractedField>),
    /// Parsed fine, but every field was `N/A` — content-free
    AllNa,
    /// Not a JSON object
    Invalid,
}

/// Strip Markdown code-fence artifacts around a JSON payload
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Decode one oracle response against the requested schema
///
/// Field entries with unexpected shapes (bare strings, numbers, objects
/// without a string `value`) coerce to the `N/A` default instead of
/// failing. The all-`N/A` check runs on the parsed entries before schema
/// fields are backfilled, so a response of only-unknown-fields that are all
/// `N/A` still counts as content-free.
pub fn decode_oracle_response(text: &str, schema: &FieldSchema) -> OracleDecode {
    let cleaned = strip_code_fences(text);

    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(e) => {
            warn!("oracle response is not valid JSON ({e}): {text}");
            return OracleDecode::Invalid;
        }
    };
    let Value::Object(object) = value else {
        warn!("oracle response is not a JSON object: {text}");
        return OracleDecode::Invalid;
    };

    let mut fields: BTreeMap<String, ExtractedField> = object
        .into_iter()
        .map(|(name, entry)| (name, coerce_field(entry)))
        .collect();

    // suppress content-free records; this is the gate that keeps empty
    // noise out of the result set
    if fields.values().all(ExtractedField::is_na) {
        info!("skipping email - no valid data found");
        return OracleDecode::AllNa;
    }

    // backfill so downstream consumers never need a presence check
    for name in schema.iter() {
        fields
            .entry(name.to_string())
            .or_insert_with(ExtractedField::not_available);
    }

    OracleDecode::Record(fields)
}

/// Coerce one field entry into `{value, context}` shape
fn coerce_field(entry: Value) -> ExtractedField {
    let Value::Object(mut object) = entry else {
        return ExtractedField::not_available();
    };

    let value = match object.remove("value") {
        Some(Value::String(value)) => value,
        _ => return ExtractedField::not_available(),
    };
    let context = match object.remove("context") {
        Some(Value::String(context)) => context,
        _ => String::new(),
    };

    ExtractedField { value, context }
}
