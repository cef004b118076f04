use std::fmt::Display;

/// Abstraction allowing to help with the handling of URLs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Url {
    inner: String,
}

impl Url {
    pub fn new(url: String) -> Self {
        Self { inner: url }
    }

    /// Resolve `relative_url` against `base_url`, which is expected to point to a "directory"
    /// (e.g. what `Url::directory` returns).
    ///
    /// Already-absolute urls are returned as is.
    pub fn from_relative(base_url: &str, relative_url: Url) -> Self {
        if base_url.is_empty() || relative_url.is_absolute() {
            relative_url
        } else if relative_url.inner.starts_with('/') {
            let complete_url = match url_domain_name(base_url) {
                Some(base_domain) => format!("{}{}", base_domain, relative_url),
                None => {
                    if base_url.ends_with('/') {
                        format!("{}{}", base_url, &relative_url.inner[1..])
                    } else {
                        format!("{}{}", base_url, relative_url)
                    }
                }
            };
            Url {
                inner: complete_url,
            }
        } else if base_url.ends_with('/') {
            Url {
                inner: format!("{}{}", base_url, relative_url),
            }
        } else {
            Url {
                inner: format!("{}/{}", base_url, relative_url),
            }
        }
    }

    pub fn take(self) -> String {
        self.inner
    }

    pub fn get_ref(&self) -> &str {
        self.inner.as_str()
    }

    pub fn domain_name(&self) -> Option<&str> {
        url_domain_name(&self.inner)
    }

    pub fn is_absolute(&self) -> bool {
        is_absolute_url(self.inner.as_bytes())
    }

    /// Returns the url without its query string and fragment.
    pub fn without_query(&self) -> &str {
        let end = self
            .inner
            .find(|c: char| c == '?' || c == '#')
            .unwrap_or(self.inner.len());
        &self.inner[..end]
    }

    /// Returns everything up to and including the last `/` of the path, which is the base on
    /// which relative URIs found in a resource at this url are resolved.
    ///
    /// Returns an empty string if the url has no `/`.
    pub fn directory(&self) -> &str {
        let path = self.without_query();
        match path.rfind('/') {
            Some(idx) => &path[..idx + 1],
            None => "",
        }
    }

    pub fn filename(&self) -> &str {
        let path = self.without_query();
        match path.rfind('/') {
            Some(idx) => &path[idx + 1..],
            None => path,
        }
    }

    pub fn extension(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(idx) => &filename[idx + 1..],
            None => "",
        }
    }

    /// Returns the raw (still percent-encoded) query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        let without_fragment = match self.inner.find('#') {
            Some(idx) => &self.inner[..idx],
            None => &self.inner,
        };
        without_fragment
            .find('?')
            .map(|idx| &without_fragment[idx + 1..])
    }

    /// Returns the raw value of the first query parameter called `name`.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query()?.split('&').find_map(|pair| match pair.split_once('=') {
            Some((key, value)) if key == name => Some(value),
            None if pair == name => Some(""),
            _ => None,
        })
    }

    pub fn has_query(&self) -> bool {
        self.inner.contains('?')
    }

    /// Returns a new `Url` with `fragment` (an already-encoded `key=value` pair) appended to its
    /// query string, through `?` if there's no query string yet or `&` if there is.
    pub fn with_query_fragment(&self, fragment: &str) -> Url {
        let separator = if self.has_query() { '&' } else { '?' };
        Url {
            inner: format!("{}{}{}", self.inner, separator, fragment),
        }
    }
}

impl Display for Url {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get_ref())
    }
}

impl From<&str> for Url {
    fn from(url: &str) -> Self {
        Url::new(url.to_owned())
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode `input` the same way the `encodeURIComponent` JavaScript function does:
/// only ASCII alphanumerics and `-_.!~*'()` are left untouched.
pub fn encode_uri_component(input: &str) -> String {
    let mut ret = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || b"-_.!~*'()".contains(&byte) {
            ret.push(byte as char);
        } else {
            ret.push('%');
            ret.push(HEX_DIGITS[(byte >> 4) as usize] as char);
            ret.push(HEX_DIGITS[(byte & 0x0F) as usize] as char);
        }
    }
    ret
}

/// Reverse of `encode_uri_component`.
///
/// Returns `None` if a `%` is not followed by two hexadecimal digits or if the decoded bytes are
/// not valid UTF-8.
pub fn decode_uri_component(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut offset = 0;
    while offset < bytes.len() {
        if bytes[offset] == b'%' {
            let high = hex_value(*bytes.get(offset + 1)?)?;
            let low = hex_value(*bytes.get(offset + 2)?)?;
            decoded.push(high << 4 | low);
            offset += 3;
        } else {
            decoded.push(bytes[offset]);
            offset += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn is_absolute_url(bytes: &[u8]) -> bool {
    let mut offset = 0;
    loop {
        if bytes.len() < offset + 1 {
            return false;
        }
        if bytes[offset].is_ascii_alphabetic() {
            offset += 1;
            continue;
        } else if bytes[offset] == b':' {
            if offset == 0 {
                return false;
            }
            offset += 1;
            break;
        } else {
            return false;
        }
    }

    if bytes.len() < offset + 2 {
        false
    } else {
        &bytes[offset..offset + 2] == b"//"
    }
}

fn url_domain_name(url: &str) -> Option<&str> {
    if !is_absolute_url(url.as_bytes()) {
        return None;
    }
    let authority_start = url.find("//")? + 2;
    match url[authority_start..].find('/') {
        Some(slash_idx) => Some(&url[..authority_start + slash_idx]),
        None => Some(url),
    }
}
