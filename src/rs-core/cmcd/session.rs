use uuid::Uuid;

/// CMCD version advertised through the `v` key.
pub const CMCD_VERSION: u32 = 1;

/// Identifies the playback session and the content being played.
///
/// A new `SessionContext` is created each time a source starts loading and stays the same until
/// the next one.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionContext {
    session_id: String,
    content_id: Option<String>,
    version: u32,
}

impl SessionContext {
    pub fn new(session_id: String, content_id: Option<String>) -> Self {
        Self {
            session_id,
            content_id,
            version: CMCD_VERSION,
        }
    }

    /// Create a `SessionContext` for a content loaded from `source_url`, with a randomly
    /// generated session id.
    pub fn for_source(source_url: Option<&str>) -> Self {
        Self::new(generate_session_id(), source_url.map(content_id_for))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::for_source(None)
    }
}

/// Generate a new random session identifier, under the form of a v4 UUID.
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Derive a short content identifier from a manifest URL.
///
/// Two equal URLs always lead to the same identifier. The hash is the classic 31-multiplier
/// string hash over UTF-16 code units, wrapped to 32 bits, written in base 36 after a `c`.
pub fn content_id_for(url: &str) -> String {
    let hash = url.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    format!("c{}", to_base36((hash as i64).unsigned_abs()))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_owned();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
