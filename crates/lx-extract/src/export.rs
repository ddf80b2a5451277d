//! Result export
//!
//! JSON and CSV views of the latest records. Suppression is re-evaluated
//! here against the schema active *at export time*, which may differ from
//! the schema the records were captured under — the same stored record can
//! be visible under one schema and suppressed under another.

use lx_core::{ExtractionRecord, FieldSchema, Result};

/// Records visible under `schema`
///
/// A record whose fields named by the current schema are all absent or
/// `N/A` is excluded from the view, even if it held data under the schema
/// active at capture time.
pub fn visible_records<'a>(
    records: &'a [ExtractionRecord],
    schema: &FieldSchema,
) -> Vec<&'a ExtractionRecord> {
    records
        .iter()
        .filter(|record| !record.all_na_for(schema.iter()))
        .collect()
}

/// Pretty-printed JSON array of records
pub fn to_json(records: &[&ExtractionRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Flattened CSV with `<field>_value`,`<field>_context` per schema field
///
/// Header order matches schema order; a field missing from a record
/// flattens to empty cells.
pub fn to_csv(records: &[&ExtractionRecord], schema: &FieldSchema) -> String {
    let mut out = String::new();

    let header: Vec<String> = schema
        .iter()
        .flat_map(|field| [format!("{field}_value"), format!("{field}_context")])
        .collect();
    out.push_str(&header.join(","));
    out.push_str("\r\n");

    for record in records {
        let row: Vec<String> = schema
            .iter()
            .flat_map(|name| match record.field(name) {
                Some(field) => [csv_escape(&field.value), csv_escape(&field.context)],
                None => [String::new(), String::new()],
            })
            .collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }

    out
}

/// RFC 4180 quoting: quotes are doubled, and any cell containing a comma,
/// quote or line break is wrapped in quotes
fn csv_escape(value: &str) -> String {
    let needs_quotes =
        value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r');
    if !needs_quotes {
        return value.to_string();
    }
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lx_core::ExtractedField;
    use std::collections::BTreeMap;

    fn record(entries: &[(&str, &str, &str)]) -> ExtractionRecord {
        let fields: BTreeMap<String, ExtractedField> = entries
            .iter()
            .map(|(name, value, context)| {
                (name.to_string(), ExtractedField::found(*value, *context))
            })
            .collect();
        ExtractionRecord::from_fields(fields)
    }

    fn schema(names: &[&str]) -> FieldSchema {
        FieldSchema::new(names.iter().map(|n| n.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_csv_header_matches_schema_order() {
        let schema = schema(&["shipment_id", "origin"]);
        let csv = to_csv(&[], &schema);
        let header = csv.lines().next().unwrap();

        assert_eq!(
            header,
            "shipment_id_value,shipment_id_context,origin_value,origin_context"
        );
        // two columns per schema field
        assert_eq!(header.split(',').count(), 2 * schema.len());
    }

    #[test]
    fn test_csv_rows_follow_schema_not_record() {
        let record = record(&[("origin", "Chicago", "from Chicago, IL")]);
        let schema = schema(&["shipment_id", "origin"]);
        let records = vec![&record];

        let csv = to_csv(&records, &schema);
        let row = csv.lines().nth(1).unwrap();

        // missing shipment_id flattens to empty cells; the comma inside the
        // context is quoted
        assert_eq!(row, ",,Chicago,\"from Chicago, IL\"");
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_export_time_suppression_uses_current_schema() {
        // captured under a schema that found data for "origin"
        let captured = record(&[("origin", "Chicago", "from Chicago")]);

        // still visible under the capture-time schema
        let visible = visible_records(std::slice::from_ref(&captured), &schema(&["origin"]));
        assert_eq!(visible.len(), 1);

        // invisible under a later schema it has nothing for
        let visible = visible_records(std::slice::from_ref(&captured), &schema(&["carrier"]));
        assert!(visible.is_empty());
    }

    #[test]
    fn test_visible_records_drops_all_na() {
        let mut na_fields = BTreeMap::new();
        na_fields.insert("origin".to_string(), ExtractedField::not_available());
        let all_na = ExtractionRecord::from_fields(na_fields);
        let with_data = record(&[("origin", "Chicago", "from Chicago")]);

        let records = vec![all_na, with_data];
        let visible = visible_records(&records, &schema(&["origin"]));

        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].field("origin").unwrap().value, "Chicago");
    }

    #[test]
    fn test_json_export_parses_back() {
        let record = record(&[("origin", "Chicago", "from Chicago")]);
        let json = to_json(&[&record]).unwrap();

        let parsed: Vec<ExtractionRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![record]);
    }
}
