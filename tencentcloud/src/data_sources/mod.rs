//! Data source implementations

mod data_source_mariadb_db_instances;
mod data_source_mps_transcode_templates;
mod data_source_mps_workflows;

pub use data_source_mariadb_db_instances::MariadbDbInstancesDataSource;
pub use data_source_mps_transcode_templates::MpsTranscodeTemplatesDataSource;
pub use data_source_mps_workflows::MpsWorkflowsDataSource;

use std::collections::HashMap;
use tfplug::schema::AttributeType;
use tfplug::types::{AttributePath, Dynamic, DynamicValue};

use crate::api::signer::sha256_hex;

/// Stable id for a list result, derived from the ids it contains.
pub(crate) fn ids_hash<S: AsRef<str>>(ids: &[S]) -> String {
    let joined = ids.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("-");
    sha256_hex(joined.as_bytes())[..16].to_string()
}

/// Whole numbers of a list attribute; unset lists give `None`.
pub(crate) fn number_list(value: &DynamicValue, name: &str) -> Option<Vec<i64>> {
    let items = value.get_list(&AttributePath::new(name)).ok()?;
    let numbers: Vec<i64> = items.iter().filter_map(Dynamic::as_i64).collect();
    (!numbers.is_empty()).then_some(numbers)
}

/// Object type for a computed list, built from `(name, type)` pairs.
pub(crate) fn object_type(fields: &[(&str, AttributeType)]) -> AttributeType {
    AttributeType::Object(
        fields
            .iter()
            .map(|(name, type_)| (name.to_string(), type_.clone()))
            .collect::<HashMap<_, _>>(),
    )
}

/// Object value; `None` fields become null.
pub(crate) fn object_value<'a, I>(fields: I) -> Dynamic
where
    I: IntoIterator<Item = (&'a str, Option<Dynamic>)>,
{
    Dynamic::Map(
        fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.unwrap_or(Dynamic::Null)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_hash_is_stable_and_order_sensitive() {
        let a = ids_hash(&["tdsql-1", "tdsql-2"]);
        assert_eq!(a.len(), 16);
        assert_eq!(a, ids_hash(&["tdsql-1", "tdsql-2"]));
        assert_ne!(a, ids_hash(&["tdsql-2", "tdsql-1"]));
    }

    #[test]
    fn number_list_skips_unset_and_empty() {
        let value = DynamicValue::new(Dynamic::Map(
            [
                (
                    "ids".to_string(),
                    Dynamic::List(vec![Dynamic::Number(1.0), Dynamic::Number(2.0)]),
                ),
                ("empty".to_string(), Dynamic::List(vec![])),
                ("null".to_string(), Dynamic::Null),
            ]
            .into_iter()
            .collect(),
        ));
        assert_eq!(number_list(&value, "ids"), Some(vec![1, 2]));
        assert_eq!(number_list(&value, "empty"), None);
        assert_eq!(number_list(&value, "null"), None);
        assert_eq!(number_list(&value, "missing"), None);
    }
}
