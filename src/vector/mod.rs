//! Vector overlay access: schema inspection and distinct attribute values.
//!
//! Only the first layer of a dataset is ever read.

mod filter;

pub use filter::FeatureFilter;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use gdal::vector::{Layer, LayerAccess};
use gdal::Dataset;

use crate::util::{Error, Result};

/// An opened vector dataset.
pub struct VectorSource {
    dataset: Dataset,
    path: PathBuf,
}

impl VectorSource {
    /// Open a vector dataset and check that it has a first layer.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let dataset = Dataset::open(path).map_err(|source| Error::DatasetOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Self {
            dataset,
            path: path.to_path_buf(),
        };
        source.layer()?;
        Ok(source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The first layer.
    pub fn layer(&self) -> Result<Layer<'_>> {
        self.dataset.layer(0).map_err(|source| Error::DatasetOpen {
            path: self.path.clone(),
            source,
        })
    }

    /// Field names of the first layer, in schema order.
    pub fn field_names(&self) -> Result<Vec<String>> {
        let layer = self.layer()?;
        Ok(layer.defn().fields().map(|f| f.name()).collect())
    }

    /// Fail with [`Error::AttributeRead`] unless `column` is in the schema.
    pub fn require_field(&self, column: &str) -> Result<()> {
        if self.field_names()?.iter().any(|name| name == column) {
            Ok(())
        } else {
            Err(Error::AttributeRead {
                path: self.path.clone(),
                column: column.to_string(),
            })
        }
    }

    /// Distinct non-blank string values of `column` over all features.
    pub fn distinct_values(&self, column: &str) -> Result<BTreeSet<String>> {
        self.require_field(column)?;
        let mut layer = self.layer()?;
        let mut values = BTreeSet::new();
        for feature in layer.features() {
            if let Some(value) = feature.field_as_string_by_name(column)? {
                if !value.trim().is_empty() {
                    values.insert(value);
                }
            }
        }
        tracing::trace!(
            "{} distinct values of '{}' in {}",
            values.len(),
            column,
            self.path.display()
        );
        Ok(values)
    }
}

/// Field names of the first layer of the dataset at `path`.
pub fn list_fields(path: impl AsRef<Path>) -> Result<Vec<String>> {
    VectorSource::open(path)?.field_names()
}

/// Distinct non-blank values of `field` in the dataset at `path`.
pub fn list_distinct_values(path: impl AsRef<Path>, field: &str) -> Result<BTreeSet<String>> {
    VectorSource::open(path)?.distinct_values(field)
}

/// Pick a likely height column: first name containing `ELEV`, then
/// `HEIGHT` (case-insensitive), else the first field.
pub fn suggest_attribute_column(fields: &[String]) -> Option<&str> {
    let containing = |needle: &str| {
        fields
            .iter()
            .find(|f| f.to_uppercase().contains(needle))
            .map(String::as_str)
    };
    containing("ELEV")
        .or_else(|| containing("HEIGHT"))
        .or_else(|| fields.first().map(String::as_str))
}

/// Pick a likely filter column: a field named `type`, any case.
pub fn suggest_filter_column(fields: &[String]) -> Option<&str> {
    fields
        .iter()
        .find(|f| f.eq_ignore_ascii_case("type"))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_suggest_attribute_prefers_elev() {
        let fields = names(&["ID", "bldg_height", "Elevation", "TYPE"]);
        assert_eq!(suggest_attribute_column(&fields), Some("Elevation"));
    }

    #[test]
    fn test_suggest_attribute_falls_back() {
        let fields = names(&["ID", "bldg_height"]);
        assert_eq!(suggest_attribute_column(&fields), Some("bldg_height"));

        let fields = names(&["ID", "NAME"]);
        assert_eq!(suggest_attribute_column(&fields), Some("ID"));

        assert_eq!(suggest_attribute_column(&[]), None);
    }

    #[test]
    fn test_suggest_filter_column() {
        assert_eq!(suggest_filter_column(&names(&["ID", "Type"])), Some("Type"));
        assert_eq!(suggest_filter_column(&names(&["ID", "TYPES"])), None);
    }
}
