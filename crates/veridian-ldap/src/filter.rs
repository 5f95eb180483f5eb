//! Search filter expression trees
//!
//! Building, combining, and inspecting search filters. The tree is a closed
//! sum over equality, presence, and conjunction; traversal is exhaustive
//! pattern matching, so extending the algebra with new node shapes forces
//! every inspection site to be revisited at compile time.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dn::eq_ignore_case;
use crate::error::{LdapValueError, LdapValueResult};

/// The objectClass attribute, carried by every directory entry.
pub const OBJECT_CLASS_ATTR: &str = "objectClass";

/// A search filter expression.
///
/// Trees are rebuilt, never mutated in place. After construction through
/// [`filter_and`] or [`FilterExpr::and_with`], an `And` node's child list is
/// never empty and never contains another `And` directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterExpr {
    /// Match entries where attribute equals value.
    Equality { attribute: String, value: String },

    /// Match entries where attribute has any value.
    Presence { attribute: String },

    /// Logical AND of the child filters.
    And { filters: Vec<FilterExpr> },
}

impl FilterExpr {
    /// Create an equality filter.
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpr::Equality {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a presence filter.
    pub fn present(attribute: impl Into<String>) -> Self {
        FilterExpr::Presence {
            attribute: attribute.into(),
        }
    }

    /// Create an AND filter from already-flattened children.
    pub fn and(filters: Vec<FilterExpr>) -> Self {
        FilterExpr::And { filters }
    }

    /// Combine this filter with another using AND, flattening both sides.
    ///
    /// Children of `self` come first, then children of `other`, relative
    /// order preserved. Downstream containment checks and rendered output
    /// rely on this insertion order being stable.
    #[must_use]
    pub fn and_with(self, other: FilterExpr) -> FilterExpr {
        let mut children = match self {
            FilterExpr::And { filters } => filters,
            node => vec![node],
        };
        match other {
            FilterExpr::And { filters } => children.extend(filters),
            node => children.push(node),
        }
        FilterExpr::And { filters: children }
    }

    /// Render this filter as an RFC 4515 filter string.
    #[must_use]
    pub fn to_filter_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Equality { attribute, value } => {
                write!(f, "({}={})", attribute, escape_filter_value(value))
            }
            FilterExpr::Presence { attribute } => write!(f, "({attribute}=*)"),
            FilterExpr::And { filters } => {
                f.write_str("(&")?;
                for child in filters {
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Conjunction of two optional filters.
///
/// An absent operand passes the other through unchanged. When both are
/// present the result is a single flattened `And`: children of `f1` first,
/// then children of `f2`, never `And(And(..), ..)` nesting.
pub fn filter_and(f1: Option<FilterExpr>, f2: Option<FilterExpr>) -> Option<FilterExpr> {
    match (f1, f2) {
        (None, f2) => f2,
        (f1, None) => f1,
        (Some(f1), Some(f2)) => Some(f1.and_with(f2)),
    }
}

/// True iff an equality or presence node for `attribute` (case-insensitive)
/// appears in the tree, directly or through nested AND nodes.
///
/// The algebra supports only equality, presence, and conjunction; the match
/// below is exhaustive over those shapes. If the tree type ever grows
/// disjunction or negation this predicate must be revisited.
pub fn contains_attribute(filter: &FilterExpr, attribute: &str) -> bool {
    match filter {
        FilterExpr::Equality {
            attribute: node_attribute,
            ..
        }
        | FilterExpr::Presence {
            attribute: node_attribute,
        } => eq_ignore_case(node_attribute, attribute),
        FilterExpr::And { filters } => filters
            .iter()
            .any(|child| contains_attribute(child, attribute)),
    }
}

/// True iff the tree constrains the objectClass attribute.
pub fn contains_object_class_filter(filter: &FilterExpr) -> bool {
    contains_attribute(filter, OBJECT_CLASS_ATTR)
}

/// Build the equality filter selecting entries of one object class.
pub fn object_class_filter(class_name: impl Into<String>) -> FilterExpr {
    FilterExpr::eq(OBJECT_CLASS_ATTR, class_name)
}

/// Build the canonical "match every entry" filter. Every directory entry
/// carries at least one object class, so presence of objectClass matches all.
pub fn all_entries_filter() -> FilterExpr {
    FilterExpr::present(OBJECT_CLASS_ATTR)
}

/// Escape special characters in a filter value per RFC 4515.
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

/// Parse a search filter string into a [`FilterExpr`].
///
/// Only the grammar the tree can hold is accepted: parenthesized equality
/// items, presence items, and n-ary `&` conjunctions, with `\XX` value
/// escapes. Disjunction, negation, substring, and extensible matches are
/// rejected with [`LdapValueError::InvalidFilterSyntax`].
pub fn parse_filter(text: &str) -> LdapValueResult<FilterExpr> {
    let mut parser = FilterParser {
        input: text,
        bytes: text.as_bytes(),
        pos: 0,
    };
    let result = parser.parse_top();
    if let Err(err) = &result {
        debug!(filter = %text, error = %err, "rejecting search filter");
    }
    result
}

struct FilterParser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl FilterParser<'_> {
    fn parse_top(&mut self) -> LdapValueResult<FilterExpr> {
        self.skip_spaces();
        if self.at_end() {
            return Err(self.error("filter must not be empty"));
        }
        let node = self.parse_node()?;
        self.skip_spaces();
        if !self.at_end() {
            return Err(self.error("trailing characters after filter"));
        }
        Ok(node)
    }

    fn parse_node(&mut self) -> LdapValueResult<FilterExpr> {
        self.expect(b'(')?;
        let node = match self.peek() {
            Some(b'&') => {
                self.pos += 1;
                let mut children = Vec::new();
                while self.peek() == Some(b'(') {
                    children.push(self.parse_node()?);
                }
                if children.is_empty() {
                    return Err(self.error("conjunction must have at least one operand"));
                }
                FilterExpr::And { filters: children }
            }
            Some(b'|') => return Err(self.error("disjunction is not supported")),
            Some(b'!') => return Err(self.error("negation is not supported")),
            _ => self.parse_item()?,
        };
        self.expect(b')')?;
        Ok(node)
    }

    fn parse_item(&mut self) -> LdapValueResult<FilterExpr> {
        let attr_start = self.pos;
        while let Some(b) = self.peek() {
            match b {
                b'=' => break,
                b'(' | b')' | b'*' | b'\\' => {
                    return Err(self.error("invalid character in attribute name"))
                }
                b':' => return Err(self.error("extensible match is not supported")),
                _ => self.pos += 1,
            }
        }
        let attribute = self.input[attr_start..self.pos].trim();
        if attribute.is_empty() {
            return Err(self.error("attribute name must not be empty"));
        }
        self.expect(b'=')?;

        let value_start = self.pos;
        let mut stars = 0usize;
        let mut bytes_out = Vec::new();
        while let Some(b) = self.peek() {
            match b {
                b')' => break,
                b'(' => return Err(self.error("unescaped '(' in value")),
                b'*' => {
                    stars += 1;
                    self.pos += 1;
                }
                b'\\' => {
                    let (hi, lo) = (self.byte_at(self.pos + 1), self.byte_at(self.pos + 2));
                    match (hi.and_then(hex_digit), lo.and_then(hex_digit)) {
                        (Some(hi), Some(lo)) => {
                            bytes_out.push((hi << 4) | lo);
                            self.pos += 3;
                        }
                        _ => return Err(self.error("escape must be a two-digit hex pair")),
                    }
                }
                _ => {
                    bytes_out.push(b);
                    self.pos += 1;
                }
            }
        }
        let raw_value = &self.input[value_start..self.pos];

        if stars > 0 {
            if raw_value == "*" {
                return Ok(FilterExpr::present(attribute));
            }
            return Err(self.error("substring filters are not supported"));
        }

        let value = String::from_utf8(bytes_out)
            .map_err(|_| self.error("value is not valid UTF-8 after unescaping"))?;
        Ok(FilterExpr::eq(attribute, value))
    }

    fn expect(&mut self, expected: u8) -> LdapValueResult<()> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{}' at position {}",
                expected as char, self.pos
            )))
        }
    }

    fn peek(&self) -> Option<u8> {
        self.byte_at(self.pos)
    }

    fn byte_at(&self, pos: usize) -> Option<u8> {
        self.bytes.get(pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> LdapValueError {
        LdapValueError::invalid_filter_syntax(self.input, message)
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
