use crate::cmcd::keys::{CmcdKey, UnknownCmcdKey};

/// Inner configuration on which the `CmcdAnnotator` relies.
/// Can be updated at any time through the `config_mut` `CmcdAnnotator`'s method.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotatorConfiguration {
    /// When set, only those keys are sent with requests. All derivable keys
    /// are sent when `None`.
    pub enabled_keys: Option<Vec<CmcdKey>>,

    /// Content identifier to use instead of the one derived from the
    /// manifest's URL.
    ///
    /// Only considered when a new content starts loading.
    pub content_id: Option<String>,

    /// Session identifier to use for all contents instead of a randomly
    /// generated one per loaded content.
    ///
    /// Only considered when a new content starts loading.
    pub session_id: Option<String>,
}

impl AnnotatorConfiguration {
    /// Returns `true` if `key` may be sent.
    pub fn is_enabled(&self, key: CmcdKey) -> bool {
        self.enabled_keys
            .as_ref()
            .map_or(true, |keys| keys.contains(&key))
    }
}

/// Parse a comma-separated list of CMCD keys, e.g. `"br,bl,su"`.
///
/// Whitespace around keys and empty entries are ignored.
pub fn parse_key_list(list: &str) -> Result<Vec<CmcdKey>, UnknownCmcdKey> {
    let mut keys = vec![];
    for key in list.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        let key: CmcdKey = key.parse()?;
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    Ok(keys)
}
