//! First-page field validation against the mapping.

use std::collections::BTreeSet;

use serde_json::Value;

use graphsync_types::Record;

use crate::mapping::Mapping;

/// Collect the dotted field-name set of one record.
///
/// Nested maps are walked recursively with dot-joined keys; for a list of
/// objects, only the first element is descended into.
pub fn collect_field_names(record: &Record) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for (key, value) in record {
        walk(key, value, &mut names);
    }
    names
}

fn walk(prefix: &str, value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if map.is_empty() {
                names.insert(prefix.to_string());
                return;
            }
            for (key, child) in map {
                walk(&format!("{prefix}.{key}"), child, names);
            }
        }
        Value::Array(items) => match items.first() {
            Some(first @ Value::Object(_)) => walk(prefix, first, names),
            _ => {
                names.insert(prefix.to_string());
            }
        },
        _ => {
            names.insert(prefix.to_string());
        }
    }
}

/// Check the field set of a page against the mapping.
///
/// Returns the sorted list of unmapped field names, or `Ok(())` when every
/// field in the page is declared. A non-empty list aborts the whole index,
/// not just the offending page.
pub fn validate_page(page: &[Record], mapping: &Mapping) -> Result<(), Vec<String>> {
    let mut unmapped = BTreeSet::new();
    for record in page {
        for name in collect_field_names(record) {
            if !is_mapped(&name, mapping) {
                unmapped.insert(name);
            }
        }
    }
    if unmapped.is_empty() {
        Ok(())
    } else {
        Err(unmapped.into_iter().collect())
    }
}

fn is_mapped(name: &str, mapping: &Mapping) -> bool {
    match name.split_once('.') {
        None => mapping.contains(name),
        Some((parent, child)) => mapping
            .nested_properties(parent)
            .map(|properties| properties.contains_key(child))
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(text: &str) -> Mapping {
        Mapping::parse(&serde_yaml::from_str(text).unwrap()).unwrap()
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_collect_flat_and_nested() {
        let names = collect_field_names(&record(json!({
            "sku": "a-1",
            "dims": { "width": 2.0, "unit": "cm" },
            "tags": ["red", "blue"],
        })));
        let expected: BTreeSet<String> = ["sku", "dims.width", "dims.unit", "tags"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_collect_descends_first_list_object() {
        let names = collect_field_names(&record(json!({
            "variants": [{ "color": "red" }, { "size": "xl" }],
        })));
        assert!(names.contains("variants.color"));
        assert!(!names.contains("variants.size"));
    }

    #[test]
    fn test_valid_page() {
        let mapping = mapping("keyword: [sku]\ndouble: [dims.width]");
        let page = vec![record(json!({ "sku": "a-1", "dims": { "width": 2.0 } }))];
        assert!(validate_page(&page, &mapping).is_ok());
    }

    #[test]
    fn test_extra_field_reported() {
        let mapping = mapping("keyword: [sku]");
        let page = vec![record(json!({ "sku": "a-1", "color": "red" }))];
        assert_eq!(
            validate_page(&page, &mapping).unwrap_err(),
            vec!["color".to_string()]
        );
    }

    #[test]
    fn test_unmapped_nested_child() {
        let mapping = mapping("double: [dims.width]");
        let page = vec![record(json!({ "dims": { "width": 1.0, "depth": 3.0 } }))];
        assert_eq!(
            validate_page(&page, &mapping).unwrap_err(),
            vec!["dims.depth".to_string()]
        );
    }

    #[test]
    fn test_unmapped_fields_sorted_and_deduplicated() {
        let mapping = mapping("keyword: [sku]");
        let page = vec![
            record(json!({ "sku": "a", "zeta": 1, "alpha": 2 })),
            record(json!({ "sku": "b", "alpha": 3 })),
        ];
        assert_eq!(
            validate_page(&page, &mapping).unwrap_err(),
            vec!["alpha".to_string(), "zeta".to_string()]
        );
    }

    #[test]
    fn test_plain_object_without_properties_rejects_children() {
        // A field declared as a bare `object` has no declared child
        // properties, so dotted children from data are unmapped.
        let mapping = mapping("object: [meta]\nkeyword: [sku]");
        let page = vec![record(json!({ "sku": "a", "meta": { "x": 1 } }))];
        assert_eq!(
            validate_page(&page, &mapping).unwrap_err(),
            vec!["meta.x".to_string()]
        );
    }
}
