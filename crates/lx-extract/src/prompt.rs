//! Extraction prompt construction

use lx_core::FieldSchema;

/// Build the field-extraction instruction for one message body
///
/// Names every schema field, demands a `{value, context}` pair per field
/// with the literal `N/A` sentinel (and empty context) for anything absent,
/// and insists on a bare JSON object with no surrounding prose.
pub fn build_extraction_prompt(body: &str, schema: &FieldSchema) -> String {
    let fields = schema.fields().join(", ");
    format!(
        "From the following email, extract the following fields: {fields}. \
        For each piece of information, also provide the exact phrase or sentence \
        from the email that contains this information. \
        Format the output as a JSON object where each key (e.g., 'shipment_id', 'origin') \
        has a sub-object with 'value' (the extracted information) and 'context' \
        (the relevant phrase or sentence from the email).\n\n\
        If you cannot find the information for a specific field, respond with 'N/A' \
        for the value and the context should be empty. \
        You must respond with ONLY valid JSON, no other text. \
        Do not include any other text or comments in your response. \
        ONLY respond with valid JSON.\n\n\
        Email:\n{body}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_every_field() {
        let schema = FieldSchema::new(vec![
            "shipment_id".to_string(),
            "carrier".to_string(),
            "eta".to_string(),
        ])
        .unwrap();
        let prompt = build_extraction_prompt("body text", &schema);

        assert!(prompt.contains("shipment_id, carrier, eta"));
    }

    #[test]
    fn test_prompt_demands_sentinel_and_bare_json() {
        let prompt = build_extraction_prompt("body", &FieldSchema::default_fields());

        assert!(prompt.contains("'N/A'"));
        assert!(prompt.contains("the context should be empty"));
        assert!(prompt.contains("ONLY valid JSON"));
    }

    #[test]
    fn test_prompt_embeds_body() {
        let prompt = build_extraction_prompt(
            "Truck 42 departs Chicago at 09:00",
            &FieldSchema::default_fields(),
        );
        assert!(prompt.ends_with("Email:\nTruck 42 departs Chicago at 09:00"));
    }
}
