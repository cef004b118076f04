use crate::utils::url::{encode_uri_component, Url};

use super::field_set::{CmcdFieldSet, CmcdValue};

/// Name of the query parameter carrying the CMCD payload.
pub const CMCD_QUERY_PARAM: &str = "CMCD";

/// Serialize a `CmcdFieldSet` into the comma-separated `key=value` list CMCD
/// expects, before the whole list is itself percent-encoded.
///
/// String values are percent-encoded then double-quoted, booleans are written
/// as `true`/`false` and numbers as bare decimal numbers. Non-finite numbers
/// cannot be represented and are skipped.
pub fn serialize_fields(fields: &CmcdFieldSet) -> String {
    let mut parts = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        match value {
            CmcdValue::String(s) => {
                parts.push(format!("{}=\"{}\"", key, encode_uri_component(s)));
            }
            CmcdValue::Boolean(b) => parts.push(format!("{}={}", key, b)),
            CmcdValue::Number(n) if n.is_finite() => parts.push(format!("{}={}", key, n)),
            CmcdValue::Number(_) => {}
        }
    }
    parts.join(",")
}

/// Produce the complete `CMCD=<encoded>` query fragment for the given fields.
///
/// Returns `None` if there's nothing to send.
pub fn to_query_fragment(fields: &CmcdFieldSet) -> Option<String> {
    let serialized = serialize_fields(fields);
    if serialized.is_empty() {
        None
    } else {
        Some(format!(
            "{}={}",
            CMCD_QUERY_PARAM,
            encode_uri_component(&serialized)
        ))
    }
}

/// Returns `url` with the CMCD query parameter for `fields` appended, or an
/// unchanged copy of it if `fields` is empty.
pub fn append_to_url(url: &Url, fields: &CmcdFieldSet) -> Url {
    match to_query_fragment(fields) {
        Some(fragment) => url.with_query_fragment(&fragment),
        None => url.clone(),
    }
}
