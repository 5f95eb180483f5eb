//! Typed attribute readers
//!
//! Accessors over the `ldap3` search entry model. Directory servers preserve
//! whatever attribute-name case the schema or the request used, so lookups
//! here are case-insensitive. Absence of an attribute is distinguished from
//! a malformed value: absence returns the caller-supplied default (or
//! `None`), while a present but malformed value always fails.

use base64::Engine;
use ldap3::SearchEntry;

use crate::binary::to_hex;
use crate::error::{LdapValueError, LdapValueResult};
use crate::time::decode_generalized_time;

/// Pseudo-attribute selecting the entry DN instead of a real attribute.
pub const ATTRIBUTE_DN_NAME: &str = "dn";

/// The object class attribute.
pub const ATTRIBUTE_OBJECT_CLASS: &str = "objectClass";

/// Standard entry UUID attribute.
pub const ATTRIBUTE_ENTRY_UUID: &str = "entryUUID";

/// Netscape-lineage unique identifier attribute (389 DS, former Sun DSEE).
pub const ATTRIBUTE_NSUNIQUEID: &str = "nsUniqueId";

/// Operational attribute naming the DN that last modified the entry.
pub const ATTRIBUTE_MODIFIERS_NAME: &str = "modifiersName";

/// Check whether a configured identifier attribute is the DN pseudo-attribute.
pub fn is_dn_attribute(attribute_name: &str) -> bool {
    attribute_name == ATTRIBUTE_DN_NAME
}

/// Check whether an attribute is one of the entry-UUID flavors.
pub fn is_entry_uuid_attribute(attribute_name: &str) -> bool {
    attribute_name.eq_ignore_ascii_case(ATTRIBUTE_ENTRY_UUID)
        || attribute_name.eq_ignore_ascii_case(ATTRIBUTE_NSUNIQUEID)
}

/// Get the first string value of an attribute, or `None` when the attribute
/// is absent or has no values.
pub fn get_string_attribute<'a>(entry: &'a SearchEntry, attribute_name: &str) -> Option<&'a str> {
    find_values(entry, attribute_name)
        .and_then(|values| values.first())
        .map(String::as_str)
}

/// Get all string values of an attribute. Absent attributes yield an empty
/// slice.
pub fn get_string_attributes<'a>(entry: &'a SearchEntry, attribute_name: &str) -> &'a [String] {
    find_values(entry, attribute_name).map_or(&[], Vec::as_slice)
}

/// Get the first binary value of an attribute, or `None` when absent.
pub fn get_binary_attribute<'a>(entry: &'a SearchEntry, attribute_name: &str) -> Option<&'a [u8]> {
    entry
        .bin_attrs
        .get(attribute_name)
        .or_else(|| {
            entry
                .bin_attrs
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(attribute_name))
                .map(|(_, values)| values)
        })
        .and_then(|values| values.first())
        .map(Vec::as_slice)
}

/// Render a binary unique-identifier attribute (AD objectGUID style) as a
/// base64 token suitable for storage as an external identifier.
pub fn get_guid_attribute(entry: &SearchEntry, attribute_name: &str) -> Option<String> {
    get_binary_attribute(entry, attribute_name)
        .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Read an integer attribute. An absent attribute yields the default; a
/// present but unparseable value fails.
pub fn get_integer_attribute(
    entry: &SearchEntry,
    attribute_name: &str,
    default: Option<i64>,
) -> LdapValueResult<Option<i64>> {
    match get_string_attribute(entry, attribute_name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|err| {
            LdapValueError::invalid_integer_in(raw, attribute_name, entry.dn.as_str(), err.to_string())
        }),
    }
}

/// Read a boolean attribute. An absent attribute yields the default;
/// anything other than case-insensitive "true"/"false" fails.
pub fn get_boolean_attribute(
    entry: &SearchEntry,
    attribute_name: &str,
    default: Option<bool>,
) -> LdapValueResult<Option<bool>> {
    match get_string_attribute(entry, attribute_name) {
        None => Ok(default),
        Some(raw) if raw.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(raw) if raw.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(raw) => Err(LdapValueError::invalid_boolean_in(
            raw,
            attribute_name,
            entry.dn.as_str(),
        )),
    }
}

/// Entry-free form of the boolean reader, for values already extracted from
/// configuration or attributes.
pub fn parse_boolean(value: Option<&str>, default: Option<bool>) -> LdapValueResult<Option<bool>> {
    match value {
        None => Ok(default),
        Some(raw) if raw.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(raw) if raw.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(raw) => Err(LdapValueError::invalid_boolean(raw)),
    }
}

/// Read a generalized-time attribute as epoch milliseconds. An absent
/// attribute yields `None`; a malformed value fails with the attribute name
/// and entry DN attached.
pub fn get_timestamp_attribute(
    entry: &SearchEntry,
    attribute_name: &str,
) -> LdapValueResult<Option<i64>> {
    match get_string_attribute(entry, attribute_name) {
        None => Ok(None),
        Some(raw) => decode_generalized_time(raw).map(Some).map_err(|err| match err {
            LdapValueError::MalformedTimestamp { value, message, .. } => {
                LdapValueError::MalformedTimestamp {
                    value,
                    attribute: Some(attribute_name.to_string()),
                    dn: Some(entry.dn.clone()),
                    message,
                }
            }
            other => other,
        }),
    }
}

/// Resolve the unique-identifier value of an entry.
///
/// The DN pseudo-attribute selects the entry DN itself. Otherwise the first
/// string value is used; binary identifier values are rendered as lowercase
/// hex. A configured identifier attribute missing from the entry is an
/// error, not a default.
pub fn get_uid_value(entry: &SearchEntry, uid_attribute: &str) -> LdapValueResult<String> {
    if is_dn_attribute(uid_attribute) {
        return Ok(entry.dn.clone());
    }
    if let Some(value) = get_string_attribute(entry, uid_attribute) {
        return Ok(value.to_string());
    }
    if let Some(bytes) = get_binary_attribute(entry, uid_attribute) {
        return Ok(to_hex(bytes));
    }
    Err(LdapValueError::missing_attribute(uid_attribute, entry.dn.as_str()))
}

/// Check whether an entry carries the given object class. `None` matches
/// trivially. Object class values cannot be assumed to be cased the way the
/// schema defines them, so the scan is case-insensitive.
pub fn is_object_class(entry: &SearchEntry, object_class: Option<&str>) -> bool {
    let Some(object_class) = object_class else {
        return true;
    };
    get_string_attributes(entry, ATTRIBUTE_OBJECT_CLASS)
        .iter()
        .any(|value| value.eq_ignore_ascii_case(object_class))
}

/// Check whether the entry's modifiersName matches any of the given DNs
/// exactly. Used to filter out changes made by the connector's own account.
pub fn has_modifier_name(entry: &SearchEntry, modifiers_names: &[String]) -> bool {
    get_string_attributes(entry, ATTRIBUTE_MODIFIERS_NAME)
        .iter()
        .any(|value| modifiers_names.iter().any(|name| name == value))
}

/// Check whether any value of an attribute contains the given substring.
pub fn any_value_contains_substring(
    entry: &SearchEntry,
    attribute_name: &str,
    expected_substring: &str,
) -> bool {
    get_string_attributes(entry, attribute_name)
        .iter()
        .any(|value| value.contains(expected_substring))
}

fn find_values<'a>(entry: &'a SearchEntry, attribute_name: &str) -> Option<&'a Vec<String>> {
    entry.attrs.get(attribute_name).or_else(|| {
        entry
            .attrs
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute_name))
            .map(|(_, values)| values)
    })
}
