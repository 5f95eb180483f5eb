//! Distinguished name values
//!
//! Parsing, formatting, and the hierarchy relation between distinguished
//! names. RDN comparison is case-insensitive and set-based over the AVAs of
//! each RDN; no schema matching rules and no Unicode normalization are
//! applied. This is sufficient for deciding container membership, which is
//! all the connector needs it for.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{LdapValueError, LdapValueResult};

/// A single attribute-value assertion inside an RDN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ava {
    attribute: String,
    value: String,
}

impl Ava {
    /// Create a new attribute-value assertion.
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Get the attribute name.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Get the attribute value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Case-insensitive equality on both attribute name and value.
    fn matches(&self, other: &Ava) -> bool {
        eq_ignore_case(&self.attribute, &other.attribute) && eq_ignore_case(&self.value, &other.value)
    }
}

impl fmt::Display for Ava {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, escape_dn_value(&self.value))
    }
}

/// One component of a DN. Multi-valued RDNs carry more than one AVA,
/// `+`-joined in text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    avas: Vec<Ava>,
}

impl Rdn {
    /// Create an RDN from a list of AVAs. An RDN must carry at least one AVA.
    pub fn new(avas: Vec<Ava>) -> LdapValueResult<Self> {
        if avas.is_empty() {
            return Err(LdapValueError::invalid_dn(
                "",
                "RDN must contain at least one attribute-value assertion",
            ));
        }
        Ok(Self { avas })
    }

    /// Create a single-valued RDN.
    pub fn single(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            avas: vec![Ava::new(attribute, value)],
        }
    }

    /// Get the AVAs of this RDN, in text order.
    pub fn avas(&self) -> &[Ava] {
        &self.avas
    }

    /// Number of AVAs in this RDN.
    pub fn len(&self) -> usize {
        self.avas.len()
    }

    /// Check whether this RDN carries no AVAs. Never true for a parsed RDN.
    pub fn is_empty(&self) -> bool {
        self.avas.is_empty()
    }

    /// Set equality over AVAs, case-insensitive, order-irrelevant.
    ///
    /// A size mismatch is not-equal immediately; there are no partial
    /// matches. Sets are typically size 1-3, so membership is a plain
    /// quadratic scan.
    pub fn equals_ignore_case(&self, other: &Rdn) -> bool {
        if self.avas.len() != other.avas.len() {
            return false;
        }
        match self.avas.len() {
            1 => self.avas[0].matches(&other.avas[0]),
            _ => self.avas.iter().all(|ava| other.contains_ava(ava)),
        }
    }

    fn contains_ava(&self, ava: &Ava) -> bool {
        self.avas.iter().any(|candidate| candidate.matches(ava))
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ava) in self.avas.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{ava}")?;
        }
        Ok(())
    }
}

/// A distinguished name: an ordered sequence of RDNs, most specific (leaf)
/// component first — the conventional LDAP left-to-right string order.
/// Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dn {
    rdns: Vec<Rdn>,
}

impl Dn {
    /// Parse a DN from its string form.
    ///
    /// Unescaped `,` separates RDNs, unescaped `+` separates AVAs inside an
    /// RDN, and `=` splits attribute name from value. Backslash escapes
    /// (`\,`, `\+`, `\\`, ... and `\XX` hex pairs) are decoded. Parse failure
    /// is a recoverable error, never a silent default.
    pub fn parse(text: &str) -> LdapValueResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!(dn = %text, "rejecting empty DN");
            return Err(LdapValueError::invalid_dn(text, "DN must not be empty"));
        }

        let mut rdns = Vec::new();
        for rdn_text in split_unescaped(trimmed, b',') {
            rdns.push(parse_rdn(text, rdn_text)?);
        }
        Ok(Self { rdns })
    }

    /// Build a DN from RDN components, leaf component first.
    pub fn from_rdns(rdns: Vec<Rdn>) -> Self {
        Self { rdns }
    }

    /// Get the RDN components, leaf component first.
    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    /// Number of RDN components.
    pub fn len(&self) -> usize {
        self.rdns.len()
    }

    /// Check whether this is the empty (root) DN.
    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// The DN with the leaf RDN removed, or `None` for the empty DN.
    pub fn parent(&self) -> Option<Dn> {
        if self.rdns.is_empty() {
            return None;
        }
        Some(Dn {
            rdns: self.rdns[1..].to_vec(),
        })
    }

    /// True iff `upper`'s RDN sequence is a suffix-aligned prefix of this
    /// DN's sequence when both are walked from the root end inward.
    ///
    /// Equal DNs are descendants of themselves. An ancestor cannot have more
    /// components than its descendant.
    pub fn is_descendant_of(&self, upper: &Dn) -> bool {
        if upper.len() > self.len() {
            return false;
        }
        for i in 0..upper.len() {
            let upper_rdn = &upper.rdns[upper.len() - 1 - i];
            let lower_rdn = &self.rdns[self.len() - 1 - i];
            if !upper_rdn.equals_ignore_case(lower_rdn) {
                return false;
            }
        }
        true
    }

    /// Mirror of [`Dn::is_descendant_of`].
    pub fn is_ancestor_of(&self, lower: &Dn) -> bool {
        lower.is_descendant_of(self)
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{rdn}")?;
        }
        Ok(())
    }
}

impl FromStr for Dn {
    type Err = LdapValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Absence-tolerant form of [`Dn::is_descendant_of`]: an absent DN on either
/// side yields `false`, never an error. Callers that cannot compare simply
/// get a non-match; they cannot distinguish that from a failed comparison,
/// and are not meant to.
pub fn is_descendant_of(lower: Option<&Dn>, upper: Option<&Dn>) -> bool {
    match (lower, upper) {
        (Some(lower), Some(upper)) => lower.is_descendant_of(upper),
        _ => false,
    }
}

/// Absence-tolerant mirror of [`is_descendant_of`].
pub fn is_ancestor_of(upper: Option<&Dn>, lower: Option<&Dn>) -> bool {
    is_descendant_of(lower, upper)
}

/// Case-insensitive string equality with simple case folding.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    a.to_lowercase() == b.to_lowercase()
}

/// Escape an attribute value for DN text form per RFC 4514.
///
/// Always escaped: `, + " \ < > ; =` and NUL. Space only at the start or
/// end of the value, `#` only at the start.
pub fn escape_dn_value(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let char_count = value.chars().count();
    let mut result = String::with_capacity(value.len() * 2);

    for (i, ch) in value.chars().enumerate() {
        let is_first = i == 0;
        let is_last = i == char_count - 1;

        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                result.push('\\');
                result.push(ch);
            }
            '\0' => {
                result.push_str("\\00");
            }
            ' ' if is_first || is_last => {
                result.push_str("\\20");
            }
            '#' if is_first => {
                result.push_str("\\23");
            }
            _ => {
                result.push(ch);
            }
        }
    }

    result
}

/// Split on an unescaped single-byte separator. A backslash escapes the
/// character that follows it, so `\,` and the first digit of `\2c` are both
/// skipped over without ending a segment.
fn split_unescaped(text: &str, separator: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == separator => {
                segments.push(&text[start..i]);
                start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    segments.push(&text[start..]);
    segments
}

fn parse_rdn(dn_text: &str, rdn_text: &str) -> LdapValueResult<Rdn> {
    let mut avas = Vec::new();
    for ava_text in split_unescaped(rdn_text, b'+') {
        avas.push(parse_ava(dn_text, ava_text)?);
    }
    Rdn::new(avas).map_err(|_| {
        LdapValueError::invalid_dn(dn_text, format!("empty RDN component '{rdn_text}'"))
    })
}

fn parse_ava(dn_text: &str, ava_text: &str) -> LdapValueResult<Ava> {
    let eq_pos = find_unescaped(ava_text, b'=').ok_or_else(|| {
        LdapValueError::invalid_dn(
            dn_text,
            format!("component '{}' has no '=' separator", ava_text.trim()),
        )
    })?;

    let attribute = ava_text[..eq_pos].trim();
    if attribute.is_empty() {
        return Err(LdapValueError::invalid_dn(
            dn_text,
            format!("component '{}' has an empty attribute name", ava_text.trim()),
        ));
    }

    let raw_value = trim_end_unescaped(ava_text[eq_pos + 1..].trim_start());
    let value = unescape_dn_value(dn_text, raw_value)?;

    Ok(Ava::new(attribute, value))
}

fn find_unescaped(text: &str, needle: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == needle => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Strip trailing spaces that are not themselves escaped. A space preceded
/// by an odd number of backslashes is part of the value and stays.
fn trim_end_unescaped(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut end = bytes.len();
    while end > 0 && bytes[end - 1] == b' ' {
        let mut backslashes = 0;
        let mut i = end - 1;
        while i > 0 && bytes[i - 1] == b'\\' {
            backslashes += 1;
            i -= 1;
        }
        if backslashes % 2 == 1 {
            break;
        }
        end -= 1;
    }
    &text[..end]
}

/// Decode backslash escapes in an attribute value. `\XX` hex pairs decode to
/// the byte they name (values are UTF-8, so multi-byte characters arrive as
/// several pairs); `\c` for any other character decodes to that character.
fn unescape_dn_value(dn_text: &str, raw: &str) -> LdapValueResult<String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if i + 1 >= bytes.len() {
                return Err(LdapValueError::invalid_dn(
                    dn_text,
                    format!("value '{raw}' ends with a dangling escape"),
                ));
            }
            let hi = hex_digit(bytes[i + 1]);
            let lo = if i + 2 < bytes.len() {
                hex_digit(bytes[i + 2])
            } else {
                None
            };
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    out.push((hi << 4) | lo);
                    i += 3;
                }
                _ => {
                    out.push(bytes[i + 1]);
                    i += 2;
                }
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| {
        LdapValueError::invalid_dn(dn_text, format!("value '{raw}' is not valid UTF-8"))
    })
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dn(text: &str) -> Dn {
        Dn::parse(text).unwrap()
    }

    #[test]
    fn test_parse_simple_dn() {
        let parsed = dn("cn=jdoe,ou=People,dc=example,dc=com");
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed.rdns()[0].avas()[0].attribute(), "cn");
        assert_eq!(parsed.rdns()[0].avas()[0].value(), "jdoe");
        assert_eq!(parsed.rdns()[3].avas()[0].value(), "com");
    }

    #[test]
    fn test_parse_rejects_empty_and_garbage() {
        assert!(Dn::parse("").is_err());
        assert!(Dn::parse("   ").is_err());
        assert!(Dn::parse("no-equals-here").is_err());
        assert!(Dn::parse("cn=a,,dc=com").is_err());
        assert!(Dn::parse("=value,dc=com").is_err());
    }

    #[test]
    fn test_parse_format_round_trip() {
        for text in [
            "cn=jdoe,ou=People,dc=example,dc=com",
            "CN=Doe\\, John,OU=Users,DC=example,DC=com",
            "cn=jdoe+mail=jdoe@example.com,dc=example,dc=com",
            "ou=R\\+D,dc=example,dc=com",
        ] {
            let parsed = dn(text);
            assert_eq!(parsed.to_string(), text, "round trip of {text}");
        }
    }

    #[test]
    fn test_parse_trims_separator_whitespace() {
        let parsed = dn("cn=jdoe, ou=People , dc=example, dc=com");
        assert_eq!(parsed.to_string(), "cn=jdoe,ou=People,dc=example,dc=com");
    }

    #[test]
    fn test_parse_hex_escape() {
        let parsed = dn("cn=a\\2cb,dc=example,dc=com");
        assert_eq!(parsed.rdns()[0].avas()[0].value(), "a,b");
        // re-formatted with the symbolic escape
        assert_eq!(parsed.to_string(), "cn=a\\,b,dc=example,dc=com");
    }

    #[test]
    fn test_escaped_trailing_space_survives() {
        let parsed = dn("cn=trailing\\20,dc=example,dc=com");
        assert_eq!(parsed.rdns()[0].avas()[0].value(), "trailing ");
        assert_eq!(parsed.to_string(), "cn=trailing\\20,dc=example,dc=com");
    }

    #[test]
    fn test_dangling_escape_rejected() {
        assert!(Dn::parse("cn=oops\\").is_err());
    }

    #[test]
    fn test_descendant_reflexive() {
        let a = dn("cn=jdoe,ou=People,dc=example,dc=com");
        assert!(a.is_descendant_of(&a));
        assert!(a.is_ancestor_of(&a));
    }

    #[test]
    fn test_descendant_basic() {
        let lower = dn("cn=jdoe,ou=People,dc=example,dc=com");
        let upper = dn("ou=People,dc=example,dc=com");
        let other = dn("ou=Groups,dc=example,dc=com");

        assert!(lower.is_descendant_of(&upper));
        assert!(upper.is_ancestor_of(&lower));
        assert!(!lower.is_descendant_of(&other));
        // an ancestor cannot be longer than its descendant
        assert!(!upper.is_descendant_of(&lower));
    }

    #[test]
    fn test_descendant_case_insensitive() {
        let lower = dn("CN=JDoe,OU=PEOPLE,DC=Example,DC=COM");
        let upper = dn("ou=people,dc=example,dc=com");
        assert!(lower.is_descendant_of(&upper));
    }

    #[test]
    fn test_descendant_multi_valued_rdn_order_irrelevant() {
        let lower = dn("uid=x,cn=jdoe+mail=jdoe@example.com,dc=example,dc=com");
        let upper = dn("mail=JDOE@example.com+cn=JDoe,dc=example,dc=com");
        assert!(lower.is_descendant_of(&upper));
    }

    #[test]
    fn test_descendant_multi_valued_size_mismatch() {
        let lower = dn("cn=jdoe+mail=jdoe@example.com,dc=example,dc=com");
        let upper = dn("cn=jdoe,dc=example,dc=com");
        assert!(!lower.is_descendant_of(&upper));
    }

    #[test]
    fn test_descendant_of_empty_dn() {
        let lower = dn("dc=example,dc=com");
        let root = Dn::from_rdns(Vec::new());
        assert!(lower.is_descendant_of(&root));
        assert!(!root.is_descendant_of(&lower));
    }

    #[test]
    fn test_absent_dn_yields_false() {
        let a = dn("dc=example,dc=com");
        assert!(!is_descendant_of(None, Some(&a)));
        assert!(!is_descendant_of(Some(&a), None));
        assert!(!is_descendant_of(None, None));
        assert!(is_descendant_of(Some(&a), Some(&a)));
        assert!(!is_ancestor_of(None, Some(&a)));
    }

    #[test]
    fn test_parent() {
        let a = dn("cn=jdoe,ou=People,dc=example,dc=com");
        let parent = a.parent().unwrap();
        assert_eq!(parent.to_string(), "ou=People,dc=example,dc=com");

        let root = Dn::from_rdns(Vec::new());
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_escape_dn_value_rules() {
        assert_eq!(escape_dn_value("Doe, John"), "Doe\\, John");
        assert_eq!(escape_dn_value(" leading"), "\\20leading");
        assert_eq!(escape_dn_value("trailing "), "trailing\\20");
        assert_eq!(escape_dn_value("#tag"), "\\23tag");
        assert_eq!(escape_dn_value("in#side"), "in#side");
        assert_eq!(escape_dn_value("a=b"), "a\\=b");
        assert_eq!(escape_dn_value(""), "");
    }

    #[test]
    fn test_from_str() {
        let parsed: Dn = "ou=People,dc=example,dc=com".parse().unwrap();
        assert_eq!(parsed.len(), 3);
    }
}
