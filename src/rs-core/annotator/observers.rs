use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cmcd::CmcdFieldSet;

/// Entry describing an annotated request, as given to the request log
/// observer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RequestLogRecord {
    /// Always `"request"`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// URL of the request, with the CMCD parameter.
    pub url: String,
    pub method: String,
    /// The `CMCD=...` query fragment that was appended.
    pub cmcd: String,
    pub timestamp: DateTime<Utc>,
}

impl RequestLogRecord {
    pub fn new(url: String, method: String, cmcd: String) -> Self {
        Self {
            kind: "request",
            url,
            method,
            cmcd,
            timestamp: Utc::now(),
        }
    }
}

pub type RequestLogCallback = Box<dyn FnMut(&RequestLogRecord)>;
pub type FieldSetCallback = Box<dyn FnMut(&CmcdFieldSet)>;

/// Callbacks notified after each annotated request.
#[derive(Default)]
pub(crate) struct Observers {
    request_log: Option<RequestLogCallback>,
    field_set: Option<FieldSetCallback>,
}

impl Observers {
    pub(crate) fn set_request_log(&mut self, cb: Option<RequestLogCallback>) {
        self.request_log = cb;
    }

    pub(crate) fn set_field_set(&mut self, cb: Option<FieldSetCallback>) {
        self.field_set = cb;
    }

    pub(crate) fn notify(&mut self, record: &RequestLogRecord, fields: &CmcdFieldSet) {
        if let Some(cb) = self.request_log.as_mut() {
            cb(record);
        }
        if let Some(cb) = self.field_set.as_mut() {
            cb(fields);
        }
    }
}
