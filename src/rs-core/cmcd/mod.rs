//! Common Media Client Data (CTA-5004): the keys, how their value is
//! derived from the playback state and how they are written to (and read
//! back from) a request URL.

pub mod decoder;
pub mod encoder;
mod field_set;
pub mod keys;
pub mod rules;
pub mod session;

pub use field_set::{CmcdFieldSet, CmcdValue};
pub use keys::CmcdKey;
