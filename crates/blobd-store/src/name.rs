//! Object name validation and listing order.
//!
//! The namespace is flat: a name maps to exactly one file directly under the
//! store root. Valid names:
//! - Must be non-empty
//! - Must not be `.` or `..`
//! - Must not contain `/`, `\` or NUL
//! - Must not start with [`STAGING_PREFIX`]
//!
//! Anything else is left to the backing filesystem.

use std::cmp::Ordering;

use crate::error::{StoreError, StoreResult};

/// Prefix of the files overwrites stream into before commit.
///
/// Staging names do not embed the object name, so every object name the
/// filesystem accepts can also be overwritten.
pub const STAGING_PREFIX: &str = ".blobd-staging-";

/// Characters that would let a name address something other than a direct
/// child of the store root.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '\0'];

/// Validate an object name, returning `Ok(())` if it can be stored.
///
/// # Examples
///
/// ```
/// use blobd_store::name::validate_name;
///
/// assert!(validate_name("report.pdf").is_ok());
/// assert!(validate_name("a..b").is_ok());
/// assert!(validate_name("").is_err());
/// assert!(validate_name("../etc/passwd").is_err());
/// ```
pub fn validate_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::invalid_name(name, "name must not be empty"));
    }

    if name == "." || name == ".." {
        return Err(StoreError::invalid_name(name, "name must not be a directory reference"));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(StoreError::invalid_name(
                name,
                format!("contains forbidden character: {ch:?}"),
            ));
        }
    }

    if is_staging_name(name) {
        return Err(StoreError::invalid_name(
            name,
            format!("must not start with reserved prefix {STAGING_PREFIX:?}"),
        ));
    }

    Ok(())
}

/// File name of the staging file with sequence number `id`.
///
/// Always `STAGING_PREFIX` plus 16 hex digits, whatever object it is for.
pub fn staging_name(id: u64) -> String {
    format!("{STAGING_PREFIX}{id:016x}")
}

/// Returns `true` for file names in the reserved staging namespace.
pub fn is_staging_name(file_name: &str) -> bool {
    file_name.starts_with(STAGING_PREFIX)
}

/// Total order used by listings.
///
/// Names compare case-insensitively first; names equal after lowercasing
/// compare by raw code point, so `"A.txt"` sorts before `"a.txt"`. A name
/// that is a prefix of another sorts first.
pub fn name_order(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}

/// Sort names in place with [`name_order`].
pub fn sort_names(names: &mut [String]) {
    names.sort_by(|a, b| name_order(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_names() {
        assert!(validate_name("a").is_ok());
        assert!(validate_name("A.txt").is_ok());
        assert!(validate_name("archive.tar.gz").is_ok());
        assert!(validate_name(".hidden").is_ok());
        assert!(validate_name("with space").is_ok());
        assert!(validate_name("a..b").is_ok());
        assert!(validate_name("données.csv").is_ok());
    }

    #[test]
    fn reject_empty_name() {
        assert!(matches!(
            validate_name(""),
            Err(StoreError::InvalidName { .. })
        ));
    }

    #[test]
    fn reject_directory_references() {
        assert!(validate_name(".").is_err());
        assert!(validate_name("..").is_err());
    }

    #[test]
    fn reject_separators() {
        assert!(validate_name("../secret").is_err());
        assert!(validate_name("dir/file").is_err());
        assert!(validate_name("/abs").is_err());
        assert!(validate_name("..\\win").is_err());
        assert!(validate_name("nul\0byte").is_err());
    }

    #[test]
    fn reject_staging_prefix() {
        assert!(validate_name(".blobd-staging-anything").is_err());
        assert!(validate_name(&staging_name(3)).is_err());
        assert!(validate_name("report.blobd-staging").is_ok());
    }

    #[test]
    fn staging_names_have_fixed_length() {
        let s = staging_name(0x2a);
        assert_eq!(s, ".blobd-staging-000000000000002a");
        assert!(is_staging_name(&s));
        assert_eq!(staging_name(u64::MAX).len(), s.len());
        assert!(!is_staging_name("report.pdf"));
    }

    #[test]
    fn list_order_example() {
        let mut names = vec!["b.txt".to_string(), "A.txt".to_string(), "a.txt".to_string()];
        sort_names(&mut names);
        assert_eq!(names, vec!["A.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn case_insensitive_before_raw() {
        // 'B' < 'a' by code point, but case-insensitively "apple" comes first.
        let mut names = vec!["Banana".to_string(), "apple".to_string()];
        sort_names(&mut names);
        assert_eq!(names, vec!["apple", "Banana"]);

        // Whole-name case folding decides before any raw comparison.
        assert_eq!(name_order("ab", "Ac"), Ordering::Less);
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(name_order("file", "File1"), Ordering::Less);
        assert_eq!(name_order("FILE", "file"), Ordering::Less);
        assert_eq!(name_order("file", "file"), Ordering::Equal);
    }

    proptest! {
        #[test]
        fn order_is_antisymmetric(a in "[a-zA-Z0-9._-]{0,12}", b in "[a-zA-Z0-9._-]{0,12}") {
            prop_assert_eq!(name_order(&a, &b), name_order(&b, &a).reverse());
        }

        #[test]
        fn equal_only_when_identical(a in "[a-zA-Z]{0,8}", b in "[a-zA-Z]{0,8}") {
            prop_assert_eq!(name_order(&a, &b) == Ordering::Equal, a == b);
        }

        #[test]
        fn case_insensitive_is_primary(a in "[a-zA-Z]{0,8}", b in "[a-zA-Z]{0,8}") {
            let (la, lb) = (a.to_ascii_lowercase(), b.to_ascii_lowercase());
            if la != lb {
                prop_assert_eq!(name_order(&a, &b), la.cmp(&lb));
            }
        }

        #[test]
        fn sorted_output_is_ordered(mut names in proptest::collection::vec("[a-cA-C]{1,4}", 0..16)) {
            sort_names(&mut names);
            for pair in names.windows(2) {
                prop_assert_ne!(name_order(&pair[0], &pair[1]), Ordering::Greater);
            }
        }
    }
}
