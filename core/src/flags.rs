//! Ordered flag collections: display ordering, scope building, and
//! required-flag checks.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{ConfigurationError, MissingRequiredFlags};
use crate::flag::Flag;
use crate::scope::FlagScope;

/// Case-insensitive comparison, falling back to case-sensitive order for
/// names that differ only in case.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use cmdtree_core::lexicographic_cmp;
///
/// assert_eq!(lexicographic_cmp("apple", "Banana"), Ordering::Less);
/// assert_eq!(lexicographic_cmp("Apple", "apple"), Ordering::Less);
/// assert_eq!(lexicographic_cmp("app", "apple"), Ordering::Less);
/// ```
pub fn lexicographic_cmp(a: &str, b: &str) -> Ordering {
    for (x, y) in a.chars().zip(b.chars()) {
        let (lx, ly) = (lower(x), lower(y));
        if lx != ly {
            return lx.cmp(&ly);
        }
        if x != y {
            return x.cmp(&y);
        }
    }
    a.cmp(b)
}

fn lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Display order for flags: by first name, nameless flags last.
pub fn compare_flags(a: &dyn Flag, b: &dyn Flag) -> Ordering {
    let (a_names, b_names) = (a.names(), b.names());
    match (a_names.first(), b_names.first()) {
        (Some(x), Some(y)) => lexicographic_cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort of a flag slice into display order.
pub fn sort_flags(flags: &mut [&dyn Flag]) {
    flags.sort_by(|a, b| compare_flags(*a, *b));
}

/// Builds a scope by applying `flags` in order.
///
/// Stops at the first failing flag; the partial scope is dropped.
pub fn build_scope(name: &str, flags: &[&dyn Flag]) -> Result<FlagScope, ConfigurationError> {
    let mut scope = FlagScope::new(name);
    for flag in flags {
        flag.apply(&mut scope)?;
    }
    Ok(scope)
}

/// Reports every required flag whose canonical name was not set in `scope`.
pub fn check_required_flags(
    flags: &[&dyn Flag],
    scope: &FlagScope,
) -> Result<(), MissingRequiredFlags> {
    let seen: HashSet<&str> = scope.set_names().collect();
    let missing: Vec<String> = flags
        .iter()
        .filter(|f| f.is_required())
        .filter_map(|f| f.names().into_iter().next())
        .filter(|name| !seen.contains(name.as_str()))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(MissingRequiredFlags::new(missing))
    }
}

/// An ordered set of flags owned by one command level.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    inner: Vec<Arc<dyn Flag>>,
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, flag: impl Flag + 'static) {
        self.inner.push(Arc::new(flag));
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Flags in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Flag> {
        self.inner.iter().map(as_dyn)
    }

    /// Flags in display order. The collection itself is not reordered.
    pub fn sorted(&self) -> Vec<&dyn Flag> {
        let mut flags: Vec<&dyn Flag> = self.iter().collect();
        sort_flags(&mut flags);
        flags
    }

    /// Builds a fresh scope from the sorted flags.
    pub fn flag_scope(&self, name: &str) -> Result<FlagScope, ConfigurationError> {
        build_scope(name, &self.sorted())
    }
}

fn as_dyn(flag: &Arc<dyn Flag>) -> &dyn Flag {
    flag.as_ref()
}

impl<F: Flag + 'static> FromIterator<F> for Flags {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        let mut flags = Self::new();
        for flag in iter {
            flags.push(flag);
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::error::ConfigurationError;
    use crate::flag::TypedFlag;
    use crate::value::FlagValue;

    /// A custom flag with no names at all.
    #[derive(Debug)]
    struct Nameless;

    impl Flag for Nameless {
        fn names(&self) -> Vec<String> {
            Vec::new()
        }

        fn is_required(&self) -> bool {
            false
        }

        fn describe(&self) -> String {
            String::new()
        }

        fn apply(&self, _scope: &mut FlagScope) -> Result<(), ConfigurationError> {
            Ok(())
        }
    }

    fn first_names(flags: &[&dyn Flag]) -> Vec<Option<String>> {
        flags.iter().map(|f| f.names().into_iter().next()).collect()
    }

    #[test]
    fn test_sorted_puts_nameless_last() {
        let mut flags = Flags::new();
        flags.push(Nameless);
        flags.push(TypedFlag::new("zeta", false));
        flags.push(TypedFlag::new("Alpha", false));
        flags.push(TypedFlag::new("beta", false));

        assert_eq!(
            first_names(&flags.sorted()),
            vec![
                Some("Alpha".to_string()),
                Some("beta".to_string()),
                Some("zeta".to_string()),
                None
            ]
        );
        // Declaration order is untouched.
        assert_eq!(flags.iter().next().map(|f| f.names().len()), Some(0));
    }

    #[test]
    fn test_flag_scope_stops_at_first_error() {
        let flags: Flags = [
            TypedFlag::new("alpha", 1i64),
            TypedFlag::without_value("broken"),
            TypedFlag::new("zulu", 2i64),
        ]
        .into_iter()
        .collect();

        let err = flags.flag_scope("cmd").unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingValue {
                flag: "broken".to_string()
            }
        );
    }

    #[test]
    fn test_check_required_reports_all_missing() {
        let flags: Flags = [
            TypedFlag::new("name", "").required(),
            TypedFlag::new("port", 0u64).required(),
            TypedFlag::new("verbose", false),
        ]
        .into_iter()
        .collect();
        let sorted = flags.sorted();

        let mut scope = build_scope("cmd", &sorted).unwrap();
        scope.parse(&["-verbose".to_string()]).unwrap();
        let err = check_required_flags(&sorted, &scope).unwrap_err();
        assert_eq!(err.names(), ["name".to_string(), "port".to_string()]);

        let mut scope = build_scope("cmd", &sorted).unwrap();
        scope
            .parse(&["-name=a".to_string(), "-port=1".to_string()])
            .unwrap();
        assert!(check_required_flags(&sorted, &scope).is_ok());
    }

    #[test]
    fn test_required_satisfied_by_alias() {
        let flags: Flags = [TypedFlag::new("flag1", "").with_aliases(["f1"]).required()]
            .into_iter()
            .collect();
        let sorted = flags.sorted();
        let mut scope = build_scope("cmd", &sorted).unwrap();
        scope.parse(&["-f1".to_string(), "x".to_string()]).unwrap();

        assert!(check_required_flags(&sorted, &scope).is_ok());
        assert_eq!(scope.lookup("flag1"), Some(&FlagValue::from("x")));
    }

    proptest! {
        #[test]
        fn prop_sorted_is_ordered_and_stable(names in prop::collection::vec("[a-zA-Z]{0,6}", 0..12)) {
            let flags: Flags = names.iter().map(|n| TypedFlag::new(n.as_str(), false)).collect();
            let sorted = flags.sorted();
            prop_assert_eq!(sorted.len(), names.len());
            for pair in sorted.windows(2) {
                prop_assert_ne!(compare_flags(pair[0], pair[1]), Ordering::Greater);
            }

            let mut expected = names.clone();
            expected.sort_by(|a, b| lexicographic_cmp(a, b));
            let got: Vec<String> = sorted.iter().map(|f| f.names()[0].clone()).collect();
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn prop_lexicographic_cmp_is_antisymmetric(a in "[a-zA-Z]{0,5}", b in "[a-zA-Z]{0,5}") {
            prop_assert_eq!(lexicographic_cmp(&a, &b), lexicographic_cmp(&b, &a).reverse());
        }
    }
}
