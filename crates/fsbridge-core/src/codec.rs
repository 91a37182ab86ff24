//! Content transcoding between application payloads and the base64 wire form.
//!
//! Every read/write primitive exchanges base64 text with the host. The
//! encoding selector decides what the application sees:
//! - `utf8`: the wire bytes decoded as UTF-8.
//! - `ascii`: one char per wire byte (U+0000..=U+00FF).
//! - `base64`: the wire text untouched.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while resolving selectors or transcoding payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Selector outside the closed encoding set.
    #[error("invalid encoding")]
    InvalidEncoding {
        /// Selector supplied by the caller.
        value: String,
    },
    /// Wire text was not valid base64.
    #[error("wire payload is not valid base64")]
    Base64 {
        /// Decoder failure.
        #[source]
        source: base64::DecodeError,
    },
    /// Decoded bytes were not valid UTF-8.
    #[error("payload is not valid utf-8")]
    Utf8 {
        /// Decoder failure.
        #[source]
        source: std::string::FromUtf8Error,
    },
    /// An `ascii` payload contained a char above U+00FF.
    #[error("payload is not a byte string")]
    NotByteString {
        /// Char index of the first offending char.
        position: usize,
    },
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Closed set of content encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Text payloads, UTF-8 on the wire.
    #[default]
    Utf8,
    /// Byte strings, one char per byte.
    Ascii,
    /// Base64 text passed through unchanged.
    Base64,
}

impl Encoding {
    /// All supported encodings.
    pub const ALL: [Self; 3] = [Self::Utf8, Self::Ascii, Self::Base64];

    /// Selector string for the encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf8",
            Self::Ascii => "ascii",
            Self::Base64 => "base64",
        }
    }

    /// Turn base64 wire text into the application payload.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Base64`] or [`CodecError::Utf8`] when the wire
    /// text cannot be decoded under this encoding.
    pub fn decode(self, wire: &str) -> CodecResult<String> {
        match self {
            Self::Base64 => Ok(wire.to_string()),
            Self::Utf8 => {
                let bytes = decode_wire(wire)?;
                String::from_utf8(bytes).map_err(|source| CodecError::Utf8 { source })
            }
            Self::Ascii => Ok(decode_wire(wire)?.into_iter().map(char::from).collect()),
        }
    }

    /// Turn an application payload into base64 wire text.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotByteString`] when an `ascii` payload holds a
    /// char that does not fit in one byte.
    pub fn encode(self, payload: &str) -> CodecResult<String> {
        match self {
            Self::Base64 => Ok(payload.to_string()),
            Self::Utf8 => Ok(STANDARD.encode(payload.as_bytes())),
            Self::Ascii => {
                let bytes = payload
                    .chars()
                    .enumerate()
                    .map(|(position, ch)| {
                        u8::try_from(ch).map_err(|_| CodecError::NotByteString { position })
                    })
                    .collect::<CodecResult<Vec<u8>>>()?;
                Ok(STANDARD.encode(bytes))
            }
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = CodecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|encoding| encoding.as_str() == value)
            .ok_or_else(|| CodecError::InvalidEncoding {
                value: value.to_string(),
            })
    }
}

fn decode_wire(wire: &str) -> CodecResult<Vec<u8>> {
    STANDARD
        .decode(wire)
        .map_err(|source| CodecError::Base64 { source })
}

/// Structured read/write options. Unknown keys are kept and forwarded to the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileOptions {
    /// Encoding selector; the bridge default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Remaining host-specific options.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Either a bare selector (`"base64"`) or a structured options record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EncodingOrOptions {
    /// Bare selector.
    Encoding(String),
    /// Options record.
    Options(FileOptions),
}

impl EncodingOrOptions {
    /// Resolve to the canonical form, falling back to `default` when no
    /// selector was given.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidEncoding`] for selectors outside the set.
    pub fn resolve(&self, default: Encoding) -> CodecResult<ResolvedOptions> {
        match self {
            Self::Encoding(selector) => Ok(ResolvedOptions {
                encoding: selector.parse()?,
                extra: Map::new(),
            }),
            Self::Options(options) => Ok(ResolvedOptions {
                encoding: options
                    .encoding
                    .as_deref()
                    .map_or(Ok(default), str::parse)?,
                extra: options.extra.clone(),
            }),
        }
    }
}

impl From<Encoding> for EncodingOrOptions {
    fn from(encoding: Encoding) -> Self {
        Self::Encoding(encoding.as_str().to_string())
    }
}

impl From<&str> for EncodingOrOptions {
    fn from(selector: &str) -> Self {
        Self::Encoding(selector.to_string())
    }
}

impl From<FileOptions> for EncodingOrOptions {
    fn from(options: FileOptions) -> Self {
        Self::Options(options)
    }
}

/// Canonical read/write options after selector resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedOptions {
    /// Selected encoding.
    pub encoding: Encoding,
    /// Host-specific options forwarded untouched.
    pub extra: Map<String, Value>,
}

impl ResolvedOptions {
    /// Resolve an optional caller selector against the bridge default.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidEncoding`] for selectors outside the set.
    pub fn from_caller(
        selector: Option<&EncodingOrOptions>,
        default: Encoding,
    ) -> CodecResult<Self> {
        selector.map_or_else(
            || {
                Ok(Self {
                    encoding: default,
                    extra: Map::new(),
                })
            },
            |selector| selector.resolve(default),
        )
    }

    /// Options map forwarded to the host, including the encoding selector.
    #[must_use]
    pub fn to_host_map(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        map.insert(
            "encoding".to_string(),
            Value::String(self.encoding.as_str().to_string()),
        );
        map
    }
}
