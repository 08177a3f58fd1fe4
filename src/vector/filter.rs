//! Attribute filter restricting which features of a layer are burned.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Predicate "`column` is one of `values`", compared as strings.
///
/// The filter is a plain value: it is evaluated per feature and never
/// installed on a dataset handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFilter {
    column: String,
    values: BTreeSet<String>,
}

impl FeatureFilter {
    pub fn new<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    /// An empty filter selects nothing.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Test a feature's field value. Null fields never match.
    pub fn matches(&self, field_value: Option<&str>) -> bool {
        field_value.is_some_and(|v| self.values.contains(v))
    }

    /// OGR SQL rendering, e.g. `"TYPE" IN ('river', 'O''Brien')`.
    pub fn to_sql(&self) -> String {
        if self.values.is_empty() {
            return "0 = 1".to_string();
        }
        let values: Vec<String> = self
            .values
            .iter()
            .map(|v| format!("'{}'", v.replace('\'', "''")))
            .collect();
        format!(
            "\"{}\" IN ({})",
            self.column.replace('"', "\"\""),
            values.join(", ")
        )
    }
}

impl fmt::Display for FeatureFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_only_listed_values() {
        let f = FeatureFilter::new("TYPE", ["river"]);
        assert!(f.matches(Some("river")));
        assert!(!f.matches(Some("road")));
        assert!(!f.matches(Some("River")));
        assert!(!f.matches(None));
    }

    #[test]
    fn test_empty_selects_nothing() {
        let f = FeatureFilter::new("TYPE", Vec::<String>::new());
        assert!(f.is_empty());
        assert!(!f.matches(Some("")));
        assert_eq!(f.to_sql(), "0 = 1");
    }

    #[test]
    fn test_sql_escapes_quotes() {
        let f = FeatureFilter::new("TYPE", ["river", "O'Brien"]);
        assert_eq!(f.to_sql(), "\"TYPE\" IN ('O''Brien', 'river')");

        let f = FeatureFilter::new("we\"ird", ["x') OR ('1'='1"]);
        assert_eq!(f.to_string(), "\"we\"\"ird\" IN ('x'') OR (''1''=''1')");
    }

    #[test]
    fn test_quote_value_matches_literally() {
        let f = FeatureFilter::new("NAME", ["O'Brien"]);
        assert!(f.matches(Some("O'Brien")));
        assert!(!f.matches(Some("O")));
        assert!(!f.matches(Some("Brien")));
        assert!(!f.matches(Some("O''Brien")));
    }

    #[test]
    fn test_duplicates_collapse() {
        let f = FeatureFilter::new("TYPE", ["a", "b", "a"]);
        assert_eq!(f.values().len(), 2);
    }
}
