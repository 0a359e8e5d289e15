//! Read access to request arguments (query string or urlencoded form body).
//!
//! The transport adapter owns the parsed argument storage; the core consumes
//! it through the object-safe [`ValueSet`] trait. [`UrlEncodedValues`] is a
//! ready-made implementation over a raw `application/x-www-form-urlencoded`
//! string that adapters and tests can share.

use bytes::Bytes;
use thiserror::Error;

/// Errors from typed argument access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("missing argument: {key}")]
    Missing { key: String },

    #[error("invalid argument {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ValueError {
    pub fn missing<S: ToString>(key: S) -> Self {
        Self::Missing { key: key.to_string() }
    }

    pub fn invalid<K: ToString, R: ToString>(key: K, reason: R) -> Self {
        Self::Invalid { key: key.to_string(), reason: reason.to_string() }
    }
}

/// A read-only set of named string values.
pub trait ValueSet: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw urlencoded form of the whole set.
    fn query_string(&self) -> Bytes;

    /// Calls `visitor` for every key/value pair, duplicates included.
    fn visit_all(&self, visitor: &mut dyn FnMut(&str, &str));

    fn has(&self, key: &str) -> bool;

    /// First value registered under `key`, decoded.
    fn get(&self, key: &str) -> Option<String>;

    /// Parses the value under `key` as a non-negative float.
    fn ufloat(&self, key: &str) -> Result<f64, ValueError> {
        let value = self.get(key).ok_or_else(|| ValueError::missing(key))?;
        let parsed: f64 = value.parse().map_err(|_| ValueError::invalid(key, "not a number"))?;
        if parsed < 0.0 {
            return Err(ValueError::invalid(key, "negative value"));
        }
        Ok(parsed)
    }

    fn ufloat_or_zero(&self, key: &str) -> f64 {
        self.ufloat(key).unwrap_or(0.0)
    }

    /// Parses the value under `key` as a non-negative integer.
    fn uint(&self, key: &str) -> Result<usize, ValueError> {
        let value = self.get(key).ok_or_else(|| ValueError::missing(key))?;
        value.parse::<usize>().map_err(|_| ValueError::invalid(key, "not an unsigned integer"))
    }

    fn uint_or_zero(&self, key: &str) -> usize {
        self.uint(key).unwrap_or(0)
    }

    /// True when the value under `key` reads as a truthy flag.
    fn get_bool(&self, key: &str) -> bool {
        matches!(self.get(key).as_deref(), Some("1") | Some("true") | Some("yes") | Some("y"))
    }
}

/// A [`ValueSet`] parsed from a raw urlencoded string.
///
/// Duplicate keys are kept in order; `get` returns the first occurrence.
pub struct UrlEncodedValues {
    raw: String,
    data: Vec<(String, String)>,
}

impl UrlEncodedValues {
    pub fn parse<S: Into<String>>(raw: S) -> Self {
        let raw = raw.into();
        let mut data = Vec::new();

        if !raw.is_empty() {
            for kv in raw.split('&') {
                let (mut key, mut value) = (kv, "");
                if let Some((k, v)) = kv.split_once('=') {
                    (key, value) = (k, v);
                }
                data.push((decode_component(key), decode_component(value)));
            }
        }

        Self { raw, data }
    }

    pub fn empty() -> Self {
        Self { raw: String::new(), data: Vec::new() }
    }
}

impl ValueSet for UrlEncodedValues {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn query_string(&self) -> Bytes {
        Bytes::copy_from_slice(self.raw.as_bytes())
    }

    fn visit_all(&self, visitor: &mut dyn FnMut(&str, &str)) {
        for (key, value) in &self.data {
            visitor(key, value);
        }
    }

    fn has(&self, key: &str) -> bool {
        self.data.iter().any(|(k, _)| k == key)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.data.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }
}

/// Decodes `+` and `%XX` escapes. Invalid escapes are kept verbatim.
fn decode_component(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            b'%' => {
                if let (Some(hi), Some(lo)) = (hex_value(bytes.get(i + 1)), hex_value(bytes.get(i + 2))) {
                    decoded.push(hi << 4 | lo);
                    i += 3;
                } else {
                    decoded.push(b'%');
                    i += 1;
                }
            }
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(decoded).unwrap_or_else(|_| raw.to_string())
}

fn hex_value(byte: Option<&u8>) -> Option<u8> {
    match byte {
        Some(b @ b'0'..=b'9') => Some(b - b'0'),
        Some(b @ b'a'..=b'f') => Some(b - b'a' + 10),
        Some(b @ b'A'..=b'F') => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let values = UrlEncodedValues::parse("");
        assert_eq!(values.len(), 0);
        assert!(values.is_empty());
    }

    #[test]
    fn test_parse_pairs() {
        let values = UrlEncodedValues::parse("a=1&b=2");
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("a").as_deref(), Some("1"));
        assert_eq!(values.get("b").as_deref(), Some("2"));
        assert!(values.has("a"));
        assert!(!values.has("c"));
    }

    #[test]
    fn test_parse_duplicates_and_bare_keys() {
        let values = UrlEncodedValues::parse("a=&b=2&c&a=42");
        assert_eq!(values.len(), 4);
        // first occurrence wins for get
        assert_eq!(values.get("a").as_deref(), Some(""));
        assert_eq!(values.get("c").as_deref(), Some(""));

        let mut seen = Vec::new();
        values.visit_all(&mut |k, v| seen.push((k.to_string(), v.to_string())));
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[3], ("a".to_string(), "42".to_string()));
    }

    #[test]
    fn test_decoding() {
        let values = UrlEncodedValues::parse("name=jo%20han&q=a%2Fb&plus=1+2");
        assert_eq!(values.get("name").as_deref(), Some("jo han"));
        assert_eq!(values.get("q").as_deref(), Some("a/b"));
        assert_eq!(values.get("plus").as_deref(), Some("1 2"));
    }

    #[test]
    fn test_typed_getters() {
        let values = UrlEncodedValues::parse("count=12&ratio=0.5&neg=-3&flag=true&off=0");
        assert_eq!(values.uint("count"), Ok(12));
        assert_eq!(values.ufloat("ratio"), Ok(0.5));
        assert_eq!(values.uint_or_zero("missing"), 0);
        assert!(values.ufloat("neg").is_err());
        assert!(values.uint("ratio").is_err());
        assert!(values.get_bool("flag"));
        assert!(!values.get_bool("off"));
        assert!(!values.get_bool("missing"));
        assert_eq!(values.ufloat("missing"), Err(ValueError::missing("missing")));
    }

    #[test]
    fn test_query_string_round_trip() {
        let values = UrlEncodedValues::parse("a=1&b=2");
        assert_eq!(values.query_string(), Bytes::from_static(b"a=1&b=2"));
    }
}
