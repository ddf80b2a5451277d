//! Extraction record model
//!
//! A record maps every field of the active schema to an extracted value plus
//! the verbatim excerpt that supports it, alongside optional message
//! metadata. Fields the oracle could not find carry the `N/A` sentinel with
//! an empty context.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel marking a field the oracle could not find
pub const NOT_AVAILABLE: &str = "N/A";

/// A single extracted field with its supporting excerpt
///
/// An empty `context` marks the value as unverified even when it is not
/// literally `N/A`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub value: String,
    #[serde(default)]
    pub context: String,
}

impl ExtractedField {
    /// A found value with its supporting excerpt
    pub fn found(value: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            context: context.into(),
        }
    }

    /// The `N/A` sentinel with empty context
    pub fn not_available() -> Self {
        Self {
            value: NOT_AVAILABLE.to_string(),
            context: String::new(),
        }
    }

    /// True when the value is the `N/A` sentinel
    pub fn is_na(&self) -> bool {
        self.value == NOT_AVAILABLE
    }

    /// True when a supporting excerpt backs the value
    pub fn is_verified(&self) -> bool {
        !self.context.is_empty()
    }
}

/// One extracted record: schema fields plus message metadata
///
/// Serializes flat: field entries at the top level next to the
/// `email_subject` / `email_date` / `email_from` metadata keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    #[serde(flatten)]
    pub fields: BTreeMap<String, ExtractedField>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_from: Option<String>,
}

impl ExtractionRecord {
    /// Record from field contents, without message metadata
    pub fn from_fields(fields: BTreeMap<String, ExtractedField>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Look up one field by name
    pub fn field(&self, name: &str) -> Option<&ExtractedField> {
        self.fields.get(name)
    }

    /// True when every named field is absent or `N/A`
    ///
    /// Evaluated against a caller-supplied field list, not the fields the
    /// record was captured with; export re-checks against the schema active
    /// at export time.
    pub fn all_na_for<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> bool {
        names
            .into_iter()
            .all(|name| self.fields.get(name).is_none_or(ExtractedField::is_na))
    }
}

/// Records in processing order
pub type ResultSet = Vec<ExtractionRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(entries: &[(&str, &str, &str)]) -> ExtractionRecord {
        let fields = entries
            .iter()
            .map(|(name, value, context)| {
                (name.to_string(), ExtractedField::found(*value, *context))
            })
            .collect();
        ExtractionRecord::from_fields(fields)
    }

    #[test]
    fn test_na_sentinel() {
        let na = ExtractedField::not_available();
        assert!(na.is_na());
        assert!(!na.is_verified());
        assert_eq!(na.context, "");
    }

    #[test]
    fn test_all_na_for_mixed_record() {
        let record = record_with(&[("origin", "Chicago", "from Chicago"), ("eta", "N/A", "")]);
        assert!(!record.all_na_for(["origin", "eta"]));
        assert!(record.all_na_for(["eta"]));
        // absent fields count as N/A
        assert!(record.all_na_for(["carrier"]));
    }

    #[test]
    fn test_serializes_flat() {
        let mut record = record_with(&[("origin", "Chicago", "from Chicago")]);
        record.email_subject = Some("Load update".to_string());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["origin"]["value"], "Chicago");
        assert_eq!(json["email_subject"], "Load update");
        assert!(json.get("email_date").is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let mut record = record_with(&[
            ("shipment_id", "SH-123", "shipment SH-123 departed"),
            ("origin", "N/A", ""),
        ]);
        record.email_from = Some("dispatch@example.com".to_string());
        let records = vec![record];

        let json = serde_json::to_string(&records).unwrap();
        let parsed: ResultSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_missing_context_defaults_empty() {
        let field: ExtractedField = serde_json::from_str(r#"{"value":"SH-1"}"#).unwrap();
        assert_eq!(field.context, "");
        assert!(!field.is_verified());
    }
}
