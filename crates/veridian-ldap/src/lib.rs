//! # Directory Value Algebra
//!
//! Pure value types and conversions shared by the veridian LDAP connector:
//! distinguished-name hierarchy comparison, search-filter trees, directory
//! timestamp codecs, and binary/hex conversion.
//!
//! Everything in this crate is a side-effect-free function over immutable
//! values: no connections, no retries, no shared mutable state. The pieces
//! that touch the network (binding, searching, schema discovery) live in the
//! connector crates and consume these values through narrow interfaces.
//!
//! ## Example
//!
//! ```
//! use veridian_ldap::dn::Dn;
//! use veridian_ldap::filter::{self, filter_and};
//!
//! let users = Dn::parse("ou=People,dc=example,dc=com")?;
//! let jdoe = Dn::parse("cn=jdoe,ou=People,dc=example,dc=com")?;
//! assert!(jdoe.is_descendant_of(&users));
//!
//! let search = filter_and(
//!     Some(filter::object_class_filter("person")),
//!     Some(filter::all_entries_filter()),
//! )
//! .unwrap();
//! assert_eq!(search.to_string(), "(&(objectClass=person)(objectClass=*))");
//! # Ok::<(), veridian_ldap::LdapValueError>(())
//! ```
//!
//! ## Crate Organization
//!
//! - [`dn`] - Distinguished-name values and the hierarchy relation
//! - [`filter`] - Search-filter trees: conjunction, containment, rendering
//! - [`time`] - Generalized-time and Windows file-time codecs
//! - [`binary`] - Byte-array / lowercase-hex conversion
//! - [`entry`] - Typed attribute readers over the `ldap3` entry model
//! - [`util`] - Random server selection, diagnostic cleanup, list splitting
//! - [`error`] - Typed failures carrying the offending raw input

pub mod binary;
pub mod dn;
pub mod entry;
pub mod error;
pub mod filter;
pub mod time;
pub mod util;

// Re-exports
pub use binary::{from_hex, to_hex, to_hex_opt};
pub use dn::{is_ancestor_of, is_descendant_of, Ava, Dn, Rdn};
pub use error::{LdapValueError, LdapValueResult};
pub use filter::{
    all_entries_filter, contains_attribute, contains_object_class_filter, filter_and,
    object_class_filter, parse_filter, FilterExpr, OBJECT_CLASS_ATTR,
};
pub use time::{
    decode_generalized_time, encode_generalized_time, millis_to_windows_time,
    windows_time_to_millis, WINDOWS_EPOCH_OFFSET,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports_compose() {
        let filter = filter_and(
            Some(object_class_filter("person")),
            Some(all_entries_filter()),
        )
        .unwrap();
        assert!(contains_attribute(&filter, "objectClass"));

        let dn: Dn = "dc=example,dc=com".parse().unwrap();
        assert!(is_descendant_of(Some(&dn), Some(&dn)));

        assert_eq!(from_hex(&to_hex(&[1, 2, 3])).unwrap(), vec![1, 2, 3]);
        assert_eq!(windows_time_to_millis("116444736000000000").unwrap(), 0);
    }
}
