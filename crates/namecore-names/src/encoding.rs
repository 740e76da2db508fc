//! Conversions between raw name/value bytes and their string representations.

use std::fmt;
use std::str::FromStr;

/// A name or value could not be represented in the requested encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid data for {0}")]
pub struct InvalidNameString(pub NameEncoding);

/// String encodings understood for names and values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NameEncoding {
    /// Printable ASCII only.
    #[default]
    Ascii,
    /// Any valid UTF-8.
    Utf8,
    /// Hex encoding of arbitrary bytes.
    Hex,
}

impl NameEncoding {
    /// Returns the literal used for this encoding in options and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Utf8 => "utf8",
            Self::Hex => "hex",
        }
    }
}

impl fmt::Display for NameEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NameEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascii" => Ok(Self::Ascii),
            "utf8" => Ok(Self::Utf8),
            "hex" => Ok(Self::Hex),
            other => Err(format!("invalid name/value encoding: {other}")),
        }
    }
}

fn is_ascii_byte(byte: u8) -> bool {
    (0x20..0x80).contains(&byte)
}

/// Renders raw bytes as a string in the given encoding.
pub fn encode_name(data: &[u8], encoding: NameEncoding) -> Result<String, InvalidNameString> {
    match encoding {
        NameEncoding::Ascii => {
            if !data.iter().copied().all(is_ascii_byte) {
                return Err(InvalidNameString(encoding));
            }
            // All bytes are below 0x80, so this is valid UTF-8.
            Ok(data.iter().map(|&b| b as char).collect())
        }
        NameEncoding::Utf8 => std::str::from_utf8(data)
            .map(ToOwned::to_owned)
            .map_err(|_| InvalidNameString(encoding)),
        NameEncoding::Hex => Ok(hex::encode(data)),
    }
}

/// Parses a string in the given encoding back into raw bytes.
pub fn decode_name(text: &str, encoding: NameEncoding) -> Result<Vec<u8>, InvalidNameString> {
    match encoding {
        NameEncoding::Ascii => {
            if !text.bytes().all(is_ascii_byte) {
                return Err(InvalidNameString(encoding));
            }
            Ok(text.as_bytes().to_vec())
        }
        NameEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
        NameEncoding::Hex => hex::decode(text).map_err(|_| InvalidNameString(encoding)),
    }
}

/// Values follow exactly the same rules as names.
pub fn encode_value(data: &[u8], encoding: NameEncoding) -> Result<String, InvalidNameString> {
    encode_name(data, encoding)
}

/// Values follow exactly the same rules as names.
pub fn decode_value(text: &str, encoding: NameEncoding) -> Result<Vec<u8>, InvalidNameString> {
    decode_name(text, encoding)
}

/// Renders a name for log and wallet messages.
///
/// Printable names are quoted, anything else is shown as `0x`-prefixed hex.
pub fn encode_name_for_message(data: &[u8]) -> String {
    match encode_name(data, NameEncoding::Ascii) {
        Ok(ascii) => format!("'{ascii}'"),
        Err(_) => format!("0x{}", hex::encode(data)),
    }
}
