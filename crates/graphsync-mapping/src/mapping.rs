//! Normalized per-field mapping parsed from a grouped declaration.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::json;

use crate::error::MappingError;

/// The closed set of field types an index may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Keyword,
    Text,
    SearchAsYouType,
    Long,
    Integer,
    Double,
    Float,
    Boolean,
    Date,
    Object,
}

impl FieldType {
    /// Wire name of the type, as the search backend expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Keyword => "keyword",
            FieldType::Text => "text",
            FieldType::SearchAsYouType => "search_as_you_type",
            FieldType::Long => "long",
            FieldType::Integer => "integer",
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Object => "object",
        }
    }
}

impl FromStr for FieldType {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keyword" => Ok(FieldType::Keyword),
            "text" => Ok(FieldType::Text),
            "search_as_you_type" => Ok(FieldType::SearchAsYouType),
            "long" => Ok(FieldType::Long),
            "integer" => Ok(FieldType::Integer),
            "double" => Ok(FieldType::Double),
            "float" => Ok(FieldType::Float),
            "boolean" => Ok(FieldType::Boolean),
            "date" => Ok(FieldType::Date),
            "object" => Ok(FieldType::Object),
            other => Err(MappingError::UnknownType(other.to_string())),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The normalized mapping of one top-level field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub field_type: FieldType,
    /// Child field types for synthesized object parents; empty otherwise.
    pub properties: BTreeMap<String, FieldType>,
}

impl FieldMapping {
    fn scalar(field_type: FieldType) -> Self {
        Self {
            field_type,
            properties: BTreeMap::new(),
        }
    }
}

/// The declared field-name -> type contract for one index.
///
/// Built once per index from the raw grouped declaration; immutable
/// thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    fields: BTreeMap<String, FieldMapping>,
}

impl Mapping {
    /// Parse a grouped declaration (`type -> [field, ...]`).
    ///
    /// Dotted fields (`parent.child`) group into a synthesized `object`
    /// parent whose properties hold the child types. Every leaf name must
    /// be unique across top-level and nested scopes.
    pub fn parse(raw: &serde_yaml::Value) -> Result<Self, MappingError> {
        let groups = raw
            .as_mapping()
            .ok_or(MappingError::EmptyDeclaration)?;
        if groups.is_empty() {
            return Err(MappingError::EmptyDeclaration);
        }

        let mut top: BTreeMap<String, FieldType> = BTreeMap::new();
        let mut nested: BTreeMap<String, BTreeMap<String, FieldType>> = BTreeMap::new();
        let mut leaves: BTreeMap<String, ()> = BTreeMap::new();

        for (group_key, group_value) in groups {
            let type_name = group_key
                .as_str()
                .ok_or(MappingError::EmptyDeclaration)?;
            let field_type: FieldType = type_name.parse()?;

            let names = group_value
                .as_sequence()
                .ok_or_else(|| MappingError::InvalidGroup(type_name.to_string()))?;

            for name in names {
                let name = name
                    .as_str()
                    .ok_or_else(|| MappingError::InvalidGroup(type_name.to_string()))?
                    .trim();
                if name.is_empty() {
                    return Err(MappingError::BlankField(type_name.to_string()));
                }

                let parts: Vec<&str> = name.split('.').collect();
                match parts.as_slice() {
                    [leaf] => {
                        if leaves.insert(leaf.to_string(), ()).is_some() {
                            return Err(MappingError::DuplicateField(leaf.to_string()));
                        }
                        if nested.contains_key(*leaf) {
                            return Err(MappingError::ParentCollision(leaf.to_string()));
                        }
                        top.insert(leaf.to_string(), field_type);
                    }
                    [parent, child] => {
                        if parent.is_empty() || child.is_empty() {
                            return Err(MappingError::BlankField(type_name.to_string()));
                        }
                        if top.contains_key(*parent) {
                            return Err(MappingError::ParentCollision(parent.to_string()));
                        }
                        if leaves.insert(child.to_string(), ()).is_some() {
                            return Err(MappingError::DuplicateField(child.to_string()));
                        }
                        nested
                            .entry(parent.to_string())
                            .or_default()
                            .insert(child.to_string(), field_type);
                    }
                    _ => return Err(MappingError::TooDeep(name.to_string())),
                }
            }
        }

        let mut fields: BTreeMap<String, FieldMapping> = top
            .into_iter()
            .map(|(name, field_type)| (name, FieldMapping::scalar(field_type)))
            .collect();
        for (parent, properties) in nested {
            fields.insert(
                parent,
                FieldMapping {
                    field_type: FieldType::Object,
                    properties,
                },
            );
        }

        if fields.is_empty() {
            return Err(MappingError::EmptyDeclaration);
        }

        Ok(Self { fields })
    }

    /// All top-level fields, including synthesized object parents.
    pub fn fields(&self) -> &BTreeMap<String, FieldMapping> {
        &self.fields
    }

    /// Whether `name` is a declared top-level field.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Declared child properties of a nested parent, if any.
    pub fn nested_properties(&self, parent: &str) -> Option<&BTreeMap<String, FieldType>> {
        self.fields
            .get(parent)
            .filter(|f| !f.properties.is_empty())
            .map(|f| &f.properties)
    }

    /// Index-creation body for the search backend.
    pub fn creation_body(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for (name, field) in &self.fields {
            if field.properties.is_empty() {
                properties.insert(name.clone(), json!({ "type": field.field_type.as_str() }));
            } else {
                let children: serde_json::Map<String, serde_json::Value> = field
                    .properties
                    .iter()
                    .map(|(child, child_type)| {
                        (child.clone(), json!({ "type": child_type.as_str() }))
                    })
                    .collect();
                properties.insert(
                    name.clone(),
                    json!({ "type": "object", "properties": children }),
                );
            }
        }
        json!({ "mappings": { "properties": properties } })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> serde_yaml::Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_parse_flat_groups() {
        let mapping = Mapping::parse(&yaml("keyword: [sku, vendor]\nlong: [stock]")).unwrap();
        assert_eq!(mapping.fields().len(), 3);
        assert_eq!(
            mapping.fields()["sku"].field_type,
            FieldType::Keyword
        );
        assert_eq!(mapping.fields()["stock"].field_type, FieldType::Long);
        assert!(mapping.contains("vendor"));
        assert!(!mapping.contains("color"));
    }

    #[test]
    fn test_parse_dotted_fields_group_into_object() {
        let mapping =
            Mapping::parse(&yaml("keyword: [dims.unit]\ndouble: [dims.width, dims.height]"))
                .unwrap();
        let parent = &mapping.fields()["dims"];
        assert_eq!(parent.field_type, FieldType::Object);
        assert_eq!(parent.properties.len(), 3);
        assert_eq!(parent.properties["unit"], FieldType::Keyword);
        assert_eq!(parent.properties["width"], FieldType::Double);
        assert_eq!(
            mapping.nested_properties("dims").unwrap().len(),
            3
        );
    }

    #[test]
    fn test_empty_declaration() {
        assert_eq!(
            Mapping::parse(&yaml("{}")).unwrap_err(),
            MappingError::EmptyDeclaration
        );
        assert_eq!(
            Mapping::parse(&yaml("null")).unwrap_err(),
            MappingError::EmptyDeclaration
        );
    }

    #[test]
    fn test_group_not_a_sequence() {
        assert_eq!(
            Mapping::parse(&yaml("keyword: sku")).unwrap_err(),
            MappingError::InvalidGroup("keyword".to_string())
        );
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(
            Mapping::parse(&yaml("varchar: [sku]")).unwrap_err(),
            MappingError::UnknownType("varchar".to_string())
        );
    }

    #[test]
    fn test_blank_field() {
        assert_eq!(
            Mapping::parse(&yaml("keyword: ['  ']")).unwrap_err(),
            MappingError::BlankField("keyword".to_string())
        );
    }

    #[test]
    fn test_duplicate_top_level() {
        assert_eq!(
            Mapping::parse(&yaml("keyword: [sku]\ntext: [sku]")).unwrap_err(),
            MappingError::DuplicateField("sku".to_string())
        );
    }

    #[test]
    fn test_duplicate_cross_scope() {
        // Leaf names must be unique even across nested parents.
        assert_eq!(
            Mapping::parse(&yaml("keyword: [unit]\ndouble: [dims.unit]")).unwrap_err(),
            MappingError::DuplicateField("unit".to_string())
        );
        assert_eq!(
            Mapping::parse(&yaml("keyword: [a.unit, b.unit]")).unwrap_err(),
            MappingError::DuplicateField("unit".to_string())
        );
    }

    #[test]
    fn test_too_deep() {
        assert_eq!(
            Mapping::parse(&yaml("keyword: [a.b.c]")).unwrap_err(),
            MappingError::TooDeep("a.b.c".to_string())
        );
    }

    #[test]
    fn test_parent_collision() {
        assert_eq!(
            Mapping::parse(&yaml("keyword: [dims]\ndouble: [dims.width]")).unwrap_err(),
            MappingError::ParentCollision("dims".to_string())
        );
        assert_eq!(
            Mapping::parse(&yaml("double: [dims.width]\nkeyword: [dims]")).unwrap_err(),
            MappingError::ParentCollision("dims".to_string())
        );
    }

    #[test]
    fn test_creation_body() {
        let mapping = Mapping::parse(&yaml("keyword: [sku]\ndouble: [dims.width]")).unwrap();
        let body = mapping.creation_body();
        assert_eq!(body["mappings"]["properties"]["sku"]["type"], "keyword");
        assert_eq!(body["mappings"]["properties"]["dims"]["type"], "object");
        assert_eq!(
            body["mappings"]["properties"]["dims"]["properties"]["width"]["type"],
            "double"
        );
    }
}
