//! Directory value errors
//!
//! Typed failures for the value algebra. Every variant carries the offending
//! raw input and, where available, the attribute name and entry DN it came
//! from. All of these are deterministic, synchronous failures; retrying a
//! pure computation cannot change the outcome, so there is no
//! transient/permanent split here.

use thiserror::Error;

/// Error that can occur while parsing or converting directory values.
#[derive(Debug, Error)]
pub enum LdapValueError {
    /// Generalized-time or Windows-time text that does not parse.
    #[error("invalid timestamp value '{value}': {message}")]
    MalformedTimestamp {
        value: String,
        attribute: Option<String>,
        dn: Option<String>,
        message: String,
    },

    /// 64-bit tick arithmetic over- or underflowed converting Windows time.
    #[error("timestamp value '{value}' outside the representable range: {message}")]
    TimestampRange { value: String, message: String },

    /// Hex text with odd length or non-hex characters.
    #[error("invalid hex encoding '{value}': {message}")]
    MalformedEncoding { value: String, message: String },

    /// Search-filter text that is malformed or uses an unsupported construct.
    #[error("invalid search filter '{filter}': {message}")]
    InvalidFilterSyntax { filter: String, message: String },

    /// A string other than case-insensitive "true"/"false" where a boolean
    /// was required.
    #[error("invalid boolean value '{value}'")]
    InvalidBooleanLiteral {
        value: String,
        attribute: Option<String>,
        dn: Option<String>,
    },

    /// A present but unparseable integer attribute value.
    #[error("invalid integer value '{value}': {message}")]
    InvalidIntegerLiteral {
        value: String,
        attribute: Option<String>,
        dn: Option<String>,
        message: String,
    },

    /// Distinguished-name text that does not parse.
    #[error("cannot parse '{value}' as DN: {message}")]
    InvalidDn { value: String, message: String },

    /// A required identifier attribute is absent from an entry.
    #[error("attribute '{attribute}' not present in entry")]
    MissingAttribute {
        attribute: String,
        dn: Option<String>,
    },
}

impl LdapValueError {
    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            LdapValueError::MalformedTimestamp { .. } => "MALFORMED_TIMESTAMP",
            LdapValueError::TimestampRange { .. } => "TIMESTAMP_RANGE",
            LdapValueError::MalformedEncoding { .. } => "MALFORMED_ENCODING",
            LdapValueError::InvalidFilterSyntax { .. } => "INVALID_FILTER_SYNTAX",
            LdapValueError::InvalidBooleanLiteral { .. } => "INVALID_BOOLEAN_LITERAL",
            LdapValueError::InvalidIntegerLiteral { .. } => "INVALID_INTEGER_LITERAL",
            LdapValueError::InvalidDn { .. } => "INVALID_DN",
            LdapValueError::MissingAttribute { .. } => "MISSING_ATTRIBUTE",
        }
    }

    /// The attribute name the failing value was read from, if known.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            LdapValueError::MalformedTimestamp { attribute, .. }
            | LdapValueError::InvalidBooleanLiteral { attribute, .. }
            | LdapValueError::InvalidIntegerLiteral { attribute, .. } => attribute.as_deref(),
            LdapValueError::MissingAttribute { attribute, .. } => Some(attribute),
            _ => None,
        }
    }

    /// The DN of the entry the failing value was read from, if known.
    pub fn dn(&self) -> Option<&str> {
        match self {
            LdapValueError::MalformedTimestamp { dn, .. }
            | LdapValueError::InvalidBooleanLiteral { dn, .. }
            | LdapValueError::InvalidIntegerLiteral { dn, .. }
            | LdapValueError::MissingAttribute { dn, .. } => dn.as_deref(),
            _ => None,
        }
    }

    // Convenience constructors

    /// Create a malformed timestamp error without entry context.
    pub fn malformed_timestamp(value: impl Into<String>, message: impl Into<String>) -> Self {
        LdapValueError::MalformedTimestamp {
            value: value.into(),
            attribute: None,
            dn: None,
            message: message.into(),
        }
    }

    /// Create a malformed timestamp error with attribute and entry context.
    pub fn malformed_timestamp_in(
        value: impl Into<String>,
        attribute: impl Into<String>,
        dn: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LdapValueError::MalformedTimestamp {
            value: value.into(),
            attribute: Some(attribute.into()),
            dn: Some(dn.into()),
            message: message.into(),
        }
    }

    /// Create a timestamp range error.
    pub fn timestamp_range(value: impl Into<String>, message: impl Into<String>) -> Self {
        LdapValueError::TimestampRange {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a malformed encoding error.
    pub fn malformed_encoding(value: impl Into<String>, message: impl Into<String>) -> Self {
        LdapValueError::MalformedEncoding {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an invalid filter syntax error.
    pub fn invalid_filter_syntax(filter: impl Into<String>, message: impl Into<String>) -> Self {
        LdapValueError::InvalidFilterSyntax {
            filter: filter.into(),
            message: message.into(),
        }
    }

    /// Create an invalid boolean literal error without entry context.
    pub fn invalid_boolean(value: impl Into<String>) -> Self {
        LdapValueError::InvalidBooleanLiteral {
            value: value.into(),
            attribute: None,
            dn: None,
        }
    }

    /// Create an invalid boolean literal error with attribute and entry context.
    pub fn invalid_boolean_in(
        value: impl Into<String>,
        attribute: impl Into<String>,
        dn: impl Into<String>,
    ) -> Self {
        LdapValueError::InvalidBooleanLiteral {
            value: value.into(),
            attribute: Some(attribute.into()),
            dn: Some(dn.into()),
        }
    }

    /// Create an invalid integer literal error with attribute and entry context.
    pub fn invalid_integer_in(
        value: impl Into<String>,
        attribute: impl Into<String>,
        dn: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LdapValueError::InvalidIntegerLiteral {
            value: value.into(),
            attribute: Some(attribute.into()),
            dn: Some(dn.into()),
            message: message.into(),
        }
    }

    /// Create an invalid DN error.
    pub fn invalid_dn(value: impl Into<String>, message: impl Into<String>) -> Self {
        LdapValueError::InvalidDn {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a missing attribute error.
    pub fn missing_attribute(attribute: impl Into<String>, dn: impl Into<String>) -> Self {
        LdapValueError::MissingAttribute {
            attribute: attribute.into(),
            dn: Some(dn.into()),
        }
    }
}

/// Result type for directory value operations.
pub type LdapValueResult<T> = Result<T, LdapValueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LdapValueError::malformed_timestamp("x", "bad").error_code(),
            "MALFORMED_TIMESTAMP"
        );
        assert_eq!(
            LdapValueError::invalid_boolean("maybe").error_code(),
            "INVALID_BOOLEAN_LITERAL"
        );
        assert_eq!(
            LdapValueError::invalid_dn("::", "empty RDN").error_code(),
            "INVALID_DN"
        );
    }

    #[test]
    fn test_error_display() {
        let err = LdapValueError::invalid_boolean("maybe");
        assert_eq!(err.to_string(), "invalid boolean value 'maybe'");

        let err = LdapValueError::malformed_encoding("xyz", "odd length");
        assert_eq!(err.to_string(), "invalid hex encoding 'xyz': odd length");
    }

    #[test]
    fn test_error_context_accessors() {
        let err = LdapValueError::invalid_boolean_in(
            "maybe",
            "accountEnabled",
            "cn=jdoe,dc=example,dc=com",
        );
        assert_eq!(err.attribute(), Some("accountEnabled"));
        assert_eq!(err.dn(), Some("cn=jdoe,dc=example,dc=com"));

        let err = LdapValueError::malformed_encoding("zz", "bad digit");
        assert_eq!(err.attribute(), None);
        assert_eq!(err.dn(), None);
    }
}
