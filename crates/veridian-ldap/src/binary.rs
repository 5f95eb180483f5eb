//! Binary attribute value codec
//!
//! Byte-array to lowercase-hex conversion for binary identifiers such as
//! GUIDs and SIDs that must travel through string-typed attribute channels.

use crate::error::{LdapValueError, LdapValueResult};

/// Render bytes as lowercase hex, two characters per byte, most significant
/// nibble first. Empty input yields an empty string.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Absence-tolerant form of [`to_hex`]: absent input yields an absent
/// result, not an error.
pub fn to_hex_opt(bytes: Option<&[u8]>) -> Option<String> {
    bytes.map(to_hex)
}

/// Decode an even-length hex string to bytes. Case is insignificant on
/// input; odd length or non-hex characters fail with
/// [`LdapValueError::MalformedEncoding`].
pub fn from_hex(text: &str) -> LdapValueResult<Vec<u8>> {
    hex::decode(text).map_err(|err| LdapValueError::malformed_encoding(text, err.to_string()))
}
