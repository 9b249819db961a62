//! Typed versions of the webdav-specific request headers.

use headers::{Header, HeaderName, HeaderValue};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DEPTH: HeaderName = HeaderName::from_static("depth");
    static ref DESTINATION: HeaderName = HeaderName::from_static("destination");
    static ref OVERWRITE: HeaderName = HeaderName::from_static("overwrite");
    static ref TIMEOUT: HeaderName = HeaderName::from_static("timeout");
    static ref LOCK_TOKEN: HeaderName = HeaderName::from_static("lock-token");
    // Tokenizer for the "If" header: <tagged-url> or (condition-list).
    static ref IF_DELIMITER: Regex = Regex::new(r"(<([^>]+)>)|(\(([^\)]+)\))").unwrap();
}

/// The `Depth` request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Zero,
    One,
    Infinity,
}

impl Header for Depth {
    fn name() -> &'static HeaderName {
        &DEPTH
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        match value.to_str().map(|s| s.to_ascii_lowercase()) {
            Ok(s) => match s.as_str() {
                "0" => Ok(Depth::Zero),
                "1" => Ok(Depth::One),
                "infinity" => Ok(Depth::Infinity),
                _ => Err(headers::Error::invalid()),
            },
            Err(_) => Err(headers::Error::invalid()),
        }
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        let value = match self {
            Depth::Zero => "0",
            Depth::One => "1",
            Depth::Infinity => "infinity",
        };
        values.extend(std::iter::once(HeaderValue::from_static(value)));
    }
}

/// The `Destination` request header (COPY/MOVE). Kept as the raw string;
/// resolution against the request url happens in the copy/move handler.
#[derive(Debug, Clone)]
pub struct Destination(pub String);

impl Header for Destination {
    fn name() -> &'static HeaderName {
        &DESTINATION
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        value
            .to_str()
            .map(|s| Destination(s.to_string()))
            .map_err(|_| headers::Error::invalid())
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        if let Ok(value) = HeaderValue::from_str(&self.0) {
            values.extend(std::iter::once(value));
        }
    }
}

/// The `Overwrite` request header: `T` or `F`. Anything else is a
/// decode error, which the handler maps to 400.
#[derive(Debug, Clone, Copy)]
pub struct Overwrite(pub bool);

impl Header for Overwrite {
    fn name() -> &'static HeaderName {
        &OVERWRITE
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        match value.as_bytes() {
            b"T" => Ok(Overwrite(true)),
            b"F" => Ok(Overwrite(false)),
            _ => Err(headers::Error::invalid()),
        }
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        let value = if self.0 { "T" } else { "F" };
        values.extend(std::iter::once(HeaderValue::from_static(value)));
    }
}

/// The `Timeout` header on a LOCK request.
///
/// Note the asymmetry inherited from the reference implementation:
/// the request is parsed with a `Seconds-` prefix, while the response
/// `D:timeout` element is emitted as `Second-<n>`.
#[derive(Debug, Clone, Copy)]
pub struct DavTimeout(pub u32);

impl DavTimeout {
    /// Format for the `D:timeout` element of an activelock.
    pub fn as_response_string(&self) -> String {
        format!("Second-{}", self.0)
    }
}

impl Header for DavTimeout {
    fn name() -> &'static HeaderName {
        &TIMEOUT
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        let s = value.to_str().map_err(|_| headers::Error::invalid())?;
        let secs = s
            .strip_prefix("Seconds-")
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(headers::Error::invalid)?;
        Ok(DavTimeout(secs))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        let value = HeaderValue::from_str(&format!("Seconds-{}", self.0)).unwrap();
        values.extend(std::iter::once(value));
    }
}

/// The `Lock-Token` request header. The angle brackets around the
/// token url are stripped on decode.
#[derive(Debug, Clone)]
pub struct LockToken(pub String);

impl Header for LockToken {
    fn name() -> &'static HeaderName {
        &LOCK_TOKEN
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        let s = value.to_str().map_err(|_| headers::Error::invalid())?;
        let s = s.trim();
        let s = s.strip_prefix('<').unwrap_or(s);
        let s = s.strip_suffix('>').unwrap_or(s);
        Ok(LockToken(s.to_string()))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        if let Ok(value) = HeaderValue::from_str(&format!("<{}>", self.0)) {
            values.extend(std::iter::once(value));
        }
    }
}

/// One token of a parsed `If` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfToken {
    /// `<url>`, a resource tag.
    Tagged(String),
    /// `(...)`, a condition list, kept unparsed.
    List(String),
}

/// Tokenize the general `If` header.
///
/// The engine parses this header but does not evaluate it; lock-token
/// conditional semantics are an acknowledged gap (see the crate docs).
pub fn parse_if_header(raw: &str) -> Vec<IfToken> {
    let raw = if raw.starts_with('<') {
        raw.to_string()
    } else {
        format!("<*>{raw}")
    };
    IF_DELIMITER
        .captures_iter(&raw)
        .filter_map(|cap| {
            if let Some(url) = cap.get(2) {
                Some(IfToken::Tagged(url.as_str().to_string()))
            } else {
                cap.get(4).map(|l| IfToken::List(l.as_str().to_string()))
            }
        })
        .collect()
}
