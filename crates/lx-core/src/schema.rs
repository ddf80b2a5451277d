//! Field schema for extraction runs
//!
//! The schema is the ordered list of field names shared by prompt
//! construction, record shaping and CSV export. It is a value type handed
//! explicitly to each pipeline invocation; replacing the active schema
//! never affects a run already in flight.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default shipment fields
pub const DEFAULT_FIELDS: &[&str] = &[
    "shipment_id",
    "origin",
    "destination",
    "departure_date",
    "arrival_date",
];

/// Ordered list of field names to extract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FieldSchema {
    fields: Vec<String>,
}

impl FieldSchema {
    /// Create a schema from field names
    ///
    /// Rejects an empty list and blank names.
    pub fn new(fields: Vec<String>) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::Schema("no fields provided".to_string()));
        }
        if let Some(blank) = fields.iter().find(|f| f.trim().is_empty()) {
            return Err(Error::Schema(format!("blank field name: {blank:?}")));
        }
        Ok(Self { fields })
    }

    /// The default shipment field set
    pub fn default_fields() -> Self {
        Self {
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Field names in schema order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Iterate field names in schema order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false for a constructed schema, kept for completeness
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::default_fields()
    }
}

impl TryFrom<Vec<String>> for FieldSchema {
    type Error = Error;

    fn try_from(fields: Vec<String>) -> Result<Self> {
        Self::new(fields)
    }
}

impl From<FieldSchema> for Vec<String> {
    fn from(schema: FieldSchema) -> Self {
        schema.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_list() {
        assert!(FieldSchema::new(vec![]).is_err());
    }

    #[test]
    fn test_new_rejects_blank_name() {
        let fields = vec!["origin".to_string(), "  ".to_string()];
        assert!(FieldSchema::new(fields).is_err());
    }

    #[test]
    fn test_preserves_order() {
        let schema =
            FieldSchema::new(vec!["b".to_string(), "a".to_string(), "c".to_string()]).unwrap();
        let names: Vec<&str> = schema.iter().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_default_fields() {
        let schema = FieldSchema::default_fields();
        assert_eq!(schema.len(), 5);
        assert_eq!(schema.fields()[0], "shipment_id");
    }

    #[test]
    fn test_serde_as_string_list() {
        let schema = FieldSchema::new(vec!["origin".to_string()]).unwrap();
        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(json, r#"["origin"]"#);

        let parsed: FieldSchema = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(parsed.len(), 2);

        // 空リストはデシリアライズでも拒否される
        assert!(serde_json::from_str::<FieldSchema>("[]").is_err());
    }
}
