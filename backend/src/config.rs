//! Run configuration loaded from the environment.
//!
//! The allowed categories come from the `ProductCategory` variable, usually set
//! in a `.env` file next to the binary:
//!
//! ```text
//! ProductCategory=Desktops,Laptops,Monitors,Workstations
//! ```

use std::collections::HashSet;

/// Environment variable holding the comma-separated category list.
pub const CATEGORY_ENV_VAR: &str = "ProductCategory";

/// The set of source categories that may be copied.
///
/// Built once per run and never mutated by a transfer. Keeps the configured
/// order for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedCategories {
    ordered: Vec<String>,
    lookup: HashSet<String>,
}

impl AllowedCategories {
    /// Parse a comma-separated list. Entries are trimmed; empty entries and
    /// repeats are dropped.
    pub fn parse(list: &str) -> Self {
        list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
    }

    /// Read [`CATEGORY_ENV_VAR`] from the process environment.
    ///
    /// A missing variable yields an empty set; the caller decides whether that
    /// deserves a warning.
    pub fn from_env() -> Self {
        Self::parse(&std::env::var(CATEGORY_ENV_VAR).unwrap_or_default())
    }

    /// Whether `category` (already trimmed) is allowed.
    pub fn contains(&self, category: &str) -> bool {
        self.lookup.contains(category)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.ordered.clone()
    }
}

impl<S: Into<String>> FromIterator<S> for AllowedCategories {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut categories = AllowedCategories::default();
        for item in iter {
            let item = item.into();
            if categories.lookup.insert(item.clone()) {
                categories.ordered.push(item);
            }
        }
        categories
    }
}

impl std::fmt::Display for AllowedCategories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ordered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_drops_empty() {
        let cats = AllowedCategories::parse(" Desktops , Laptops,, Monitors ,  ");
        assert_eq!(cats.len(), 3);
        assert!(cats.contains("Desktops"));
        assert!(cats.contains("Laptops"));
        assert!(cats.contains("Monitors"));
        assert!(!cats.contains(""));
    }

    #[test]
    fn test_parse_empty_string() {
        assert!(AllowedCategories::parse("").is_empty());
        assert!(AllowedCategories::parse(" , ,").is_empty());
    }

    #[test]
    fn test_membership_is_exact() {
        let cats = AllowedCategories::parse("Laptops");
        assert!(!cats.contains("laptops"));
        assert!(!cats.contains("Laptop"));
    }

    #[test]
    fn test_duplicates_collapse_keeping_order() {
        let cats = AllowedCategories::parse("B,A,B,C,A");
        assert_eq!(cats.iter().collect::<Vec<_>>(), vec!["B", "A", "C"]);
        assert_eq!(cats.to_string(), "B, A, C");
    }

    #[test]
    fn test_from_env() {
        std::env::set_var(CATEGORY_ENV_VAR, "Workstations, Tablets");
        let cats = AllowedCategories::from_env();
        std::env::remove_var(CATEGORY_ENV_VAR);

        assert_eq!(cats.len(), 2);
        assert!(cats.contains("Tablets"));
    }
}
