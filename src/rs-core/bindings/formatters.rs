use serde::Serialize;

use crate::{
    annotator::RequestLogRecord,
    cmcd::{keys::describe_token, CmcdFieldSet, CmcdValue},
    Logger,
};

/// One line of the CMCD values shown on the JavaScript-side.
#[derive(Serialize)]
struct FieldEntry<'a> {
    key: &'static str,
    label: &'static str,
    category: String,
    unit: &'static str,
    value: &'a CmcdValue,
    description: Option<&'static str>,
}

pub(crate) fn format_request_record_for_js(record: &RequestLogRecord) -> String {
    serde_json::to_string(record).unwrap_or_else(|e| {
        Logger::warn(&format!("CMCD: could not serialize request record: {e}"));
        String::from("{}")
    })
}

pub(crate) fn format_field_set_for_js(fields: &CmcdFieldSet) -> String {
    let entries: Vec<FieldEntry> = fields
        .iter()
        .map(|(key, value)| FieldEntry {
            key: key.as_str(),
            label: key.label(),
            category: key.category().to_string(),
            unit: key.unit().as_str(),
            value,
            description: value.as_str().and_then(|token| describe_token(*key, token)),
        })
        .collect();
    serde_json::to_string(&entries).unwrap_or_else(|e| {
        Logger::warn(&format!("CMCD: could not serialize CMCD values: {e}"));
        String::from("[]")
    })
}
