use thiserror::Error;

use crate::utils::url::{decode_uri_component, Url};

use super::{
    encoder::CMCD_QUERY_PARAM,
    field_set::{CmcdFieldSet, CmcdValue},
    keys::{CmcdKey, UnknownCmcdKey},
};

/// Error encountered when reading back a CMCD payload.
#[derive(Error, Debug, PartialEq)]
pub enum CmcdParsingError {
    #[error("Invalid percent-encoding in CMCD payload: `{0}`")]
    InvalidPercentEncoding(String),
    #[error(transparent)]
    UnknownKey(#[from] UnknownCmcdKey),
    #[error("Malformed CMCD key-value pair: `{0}`")]
    MalformedPair(String),
    #[error("Invalid value for the `{key}` CMCD key: `{value}`")]
    InvalidValue { key: CmcdKey, value: String },
}

/// Extract and parse the CMCD query parameter of `url`.
///
/// Returns `Ok(None)` if the url has no CMCD parameter.
pub fn parse_url(url: &Url) -> Result<Option<CmcdFieldSet>, CmcdParsingError> {
    match url.query_param(CMCD_QUERY_PARAM) {
        None => Ok(None),
        Some(raw) => parse_query_value(raw).map(Some),
    }
}

/// Parse the still-encoded value of a CMCD query parameter, with or without
/// its leading `CMCD=`.
pub fn parse_query_value(raw: &str) -> Result<CmcdFieldSet, CmcdParsingError> {
    let raw = raw
        .strip_prefix(CMCD_QUERY_PARAM)
        .and_then(|r| r.strip_prefix('='))
        .unwrap_or(raw);
    let payload = decode_uri_component(raw)
        .ok_or_else(|| CmcdParsingError::InvalidPercentEncoding(raw.to_owned()))?;
    parse_payload(&payload)
}

/// Parse an already-decoded `key=value,key=value` CMCD list.
///
/// A key with no value is a `true` boolean, as CTA-5004 allows.
pub fn parse_payload(payload: &str) -> Result<CmcdFieldSet, CmcdParsingError> {
    let mut fields = CmcdFieldSet::new();
    if payload.is_empty() {
        return Ok(fields);
    }
    for pair in payload.split(',') {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (pair, None),
        };
        if key.is_empty() {
            return Err(CmcdParsingError::MalformedPair(pair.to_owned()));
        }
        let key: CmcdKey = key.parse()?;
        let value = match value {
            None => CmcdValue::Boolean(true),
            Some(value) => parse_value(key, value)?,
        };
        fields.insert(key, value);
    }
    Ok(fields)
}

fn parse_value(key: CmcdKey, value: &str) -> Result<CmcdValue, CmcdParsingError> {
    let invalid = || CmcdParsingError::InvalidValue {
        key,
        value: value.to_owned(),
    };
    if let Some(quoted) = value.strip_prefix('"') {
        let inner = quoted.strip_suffix('"').ok_or_else(invalid)?;
        return decode_uri_component(inner)
            .map(CmcdValue::String)
            .ok_or_else(invalid);
    }
    match value {
        "true" => Ok(CmcdValue::Boolean(true)),
        "false" => Ok(CmcdValue::Boolean(false)),
        _ => match value.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(CmcdValue::Number(n)),
            _ => Err(invalid()),
        },
    }
}
