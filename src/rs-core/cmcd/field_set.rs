use std::collections::{btree_map, BTreeMap};

use serde::{Deserialize, Serialize};

use super::keys::CmcdKey;

/// Value associated to a CMCD key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CmcdValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl CmcdValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CmcdValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CmcdValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CmcdValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for CmcdValue {
    fn from(value: &str) -> Self {
        CmcdValue::String(value.to_owned())
    }
}

impl From<String> for CmcdValue {
    fn from(value: String) -> Self {
        CmcdValue::String(value)
    }
}

impl From<f64> for CmcdValue {
    fn from(value: f64) -> Self {
        CmcdValue::Number(value)
    }
}

impl From<u64> for CmcdValue {
    fn from(value: u64) -> Self {
        CmcdValue::Number(value as f64)
    }
}

impl From<bool> for CmcdValue {
    fn from(value: bool) -> Self {
        CmcdValue::Boolean(value)
    }
}

/// The set of CMCD fields attached to a single request.
///
/// Each key appears at most once and iteration always follows the serialization order of
/// `CmcdKey`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CmcdFieldSet {
    fields: BTreeMap<CmcdKey, CmcdValue>,
}

impl CmcdFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of `key`, replacing and returning its previous value if one was set.
    pub fn insert(&mut self, key: CmcdKey, value: impl Into<CmcdValue>) -> Option<CmcdValue> {
        self.fields.insert(key, value.into())
    }

    pub fn get(&self, key: CmcdKey) -> Option<&CmcdValue> {
        self.fields.get(&key)
    }

    pub fn contains(&self, key: CmcdKey) -> bool {
        self.fields.contains_key(&key)
    }

    pub fn remove(&mut self, key: CmcdKey) -> Option<CmcdValue> {
        self.fields.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, CmcdKey, CmcdValue> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = CmcdKey> + '_ {
        self.fields.keys().copied()
    }

    /// Only keep the keys for which `keep` returns `true`.
    pub fn retain_keys(&mut self, mut keep: impl FnMut(CmcdKey) -> bool) {
        self.fields.retain(|k, _| keep(*k));
    }
}

impl<'a> IntoIterator for &'a CmcdFieldSet {
    type Item = (&'a CmcdKey, &'a CmcdValue);
    type IntoIter = btree_map::Iter<'a, CmcdKey, CmcdValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
