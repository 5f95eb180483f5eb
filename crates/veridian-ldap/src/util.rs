//! Small shared helpers
//!
//! Uniform random selection over server pools, diagnostic-string cleanup,
//! and comma-list splitting for configuration values.

use rand::Rng;

/// Select one element of a collection uniformly at random, each with
/// probability `1/n`.
///
/// Draws a single index in `[0, n)` and advances a one-pass cursor to it;
/// no index array is materialized. The generator handle is passed in by the
/// caller, so there is no hidden process-wide state. Empty collections
/// yield `None`.
pub fn select_random_item<I>(rng: &mut impl Rng, collection: I) -> Option<I::Item>
where
    I: IntoIterator,
    I::IntoIter: ExactSizeIterator,
{
    let mut iter = collection.into_iter();
    let n = iter.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return iter.next();
    }
    let index = rng.gen_range(0..n);
    iter.nth(index)
}

/// Replace control characters with `?`.
///
/// Active Directory embeds non-printable characters in diagnostic messages;
/// they corrupt terminal output and structured logs in upper layers.
pub fn sanitize_string(input: &str) -> String {
    input
        .chars()
        .map(|ch| if ch.is_control() { '?' } else { ch })
        .collect()
}

/// Split a comma-separated configuration value into trimmed items. Absent
/// input yields an absent result.
pub fn split_comma(value: Option<&str>) -> Option<Vec<String>> {
    value.map(|value| {
        value
            .split(',')
            .map(|item| item.trim().to_string())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    #[test]
    fn test_select_random_item_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty: Vec<i32> = Vec::new();
        assert_eq!(select_random_item(&mut rng, empty), None);
    }

    #[test]
    fn test_select_random_item_singleton() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(select_random_item(&mut rng, vec!["only"]), Some("only"));
    }

    #[test]
    fn test_select_random_item_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let servers = ["ldap1", "ldap2", "ldap3"];
        let mut seen = BTreeSet::new();
        for _ in 0..200 {
            let picked = select_random_item(&mut rng, servers.iter()).unwrap();
            assert!(servers.contains(picked));
            seen.insert(*picked);
        }
        // 200 draws over 3 items reach every item for any sane generator
        assert_eq!(seen.len(), servers.len());
    }

    #[test]
    fn test_sanitize_string() {
        assert_eq!(sanitize_string("plain text"), "plain text");
        assert_eq!(sanitize_string("bad\0byte"), "bad?byte");
        assert_eq!(sanitize_string("line\r\nbreak\ttab"), "line??break?tab");
        assert_eq!(sanitize_string(""), "");
    }

    #[test]
    fn test_split_comma() {
        assert_eq!(
            split_comma(Some("a, b ,c")),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(split_comma(Some("single")), Some(vec!["single".to_string()]));
        assert_eq!(split_comma(None), None);
    }
}
