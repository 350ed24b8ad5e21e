//! # graphsync-model
//!
//! Reader for graph-schema model YAML files.
//!
//! A model file describes the node types of the graph: per node a list of
//! properties, and per property a type, a required flag, and an optional
//! enumeration of allowed values. The pipeline uses this only to
//! synthesize the node/property/value documents of `model` indices.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

const NODES: &str = "Nodes";
const RELATIONSHIPS: &str = "Relationships";
const PROPS: &str = "Props";
const PROP_DEFINITIONS: &str = "PropDefinitions";
const PROP_TYPE: &str = "Type";
const PROP_ENUM: &str = "Enum";
const REQUIRED: &str = "Req";
const KEY: &str = "Key";
const DEFAULT_TYPE: &str = "String";

/// Source-type names map through a fixed table; anything else falls back
/// to the default type.
const TYPE_MAPPING: &[(&str, &str)] = &[
    ("string", "String"),
    ("number", "Float"),
    ("integer", "Int"),
    ("boolean", "Boolean"),
    ("array", "Array"),
    ("list", "Array"),
    ("object", "Object"),
    ("datetime", "DateTime"),
    ("date", "Date"),
    ("TBD", "String"),
];

/// Errors raised while loading model files.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model file list is empty")]
    EmptyFileList,

    #[error("Model file does not exist: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No nodes found in model")]
    MissingNodes,

    #[error("No property definitions found in model")]
    MissingPropDefinitions,

    #[error("More than one key property found for node {0}: {1:?}")]
    MultipleKeys(String, Vec<String>),
}

/// Metadata of one declared property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropModel {
    pub prop_type: String,
    pub required: bool,
    pub enum_values: Option<BTreeSet<String>>,
}

/// One node (or relationship with properties) of the model.
#[derive(Debug, Clone, Default)]
pub struct NodeModel {
    pub properties: BTreeMap<String, PropModel>,
    /// Property marked `Key` in the model, when exactly one exists.
    pub id_field: Option<String>,
}

/// The merged, processed graph-schema model.
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    nodes: BTreeMap<String, NodeModel>,
}

impl SchemaModel {
    /// Load and merge model YAML files, then process nodes.
    pub fn load(files: &[String]) -> Result<Self, ModelError> {
        if files.is_empty() {
            return Err(ModelError::EmptyFileList);
        }
        for file in files {
            if !Path::new(file).is_file() {
                return Err(ModelError::FileNotFound(file.clone()));
            }
        }

        let mut merged = serde_yaml::Mapping::new();
        for file in files {
            info!(file = %file, "Reading model file");
            let text = std::fs::read_to_string(file)?;
            let doc: serde_yaml::Value = serde_yaml::from_str(&text)?;
            if let serde_yaml::Value::Mapping(map) = doc {
                for (key, value) in map {
                    merged.insert(key, value);
                }
            }
        }
        Self::parse(&serde_yaml::Value::Mapping(merged))
    }

    /// Process a merged model document.
    pub fn parse(doc: &serde_yaml::Value) -> Result<Self, ModelError> {
        let nodes_section = doc.get(NODES).ok_or(ModelError::MissingNodes)?;
        let nodes_section = nodes_section
            .as_mapping()
            .ok_or(ModelError::MissingNodes)?;
        let definitions = doc
            .get(PROP_DEFINITIONS)
            .and_then(|v| v.as_mapping())
            .ok_or(ModelError::MissingPropDefinitions)?;

        let mut nodes = BTreeMap::new();
        for (name, desc) in nodes_section {
            let Some(name) = name.as_str() else { continue };
            // Keys starting with '_' are metadata, not nodes.
            if name.starts_with('_') {
                continue;
            }
            let node = process_node(name, desc, definitions)?;
            nodes.insert(name.to_string(), node);
        }

        // Relationships with properties participate in model documents too.
        if let Some(relationships) = doc.get(RELATIONSHIPS).and_then(|v| v.as_mapping()) {
            for (name, desc) in relationships {
                let Some(name) = name.as_str() else { continue };
                if name.starts_with('_') {
                    continue;
                }
                let node = process_node(name, desc, definitions)?;
                if !node.properties.is_empty() {
                    nodes.insert(name.to_string(), node);
                }
            }
        }

        if nodes.is_empty() {
            return Err(ModelError::MissingNodes);
        }
        Ok(Self { nodes })
    }

    /// All processed nodes, keyed by node name.
    pub fn nodes(&self) -> &BTreeMap<String, NodeModel> {
        &self.nodes
    }
}

fn process_node(
    name: &str,
    desc: &serde_yaml::Value,
    definitions: &serde_yaml::Mapping,
) -> Result<NodeModel, ModelError> {
    let mut node = NodeModel::default();
    let mut keys = Vec::new();

    let props = desc.get(PROPS).and_then(|v| v.as_sequence());
    for prop in props.into_iter().flatten() {
        let Some(prop_name) = prop.as_str() else {
            continue;
        };
        let definition = definitions.get(prop_name);
        node.properties
            .insert(prop_name.to_string(), prop_model(definition));
        if definition
            .and_then(|d| d.get(KEY))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            keys.push(prop_name.to_string());
        }
    }

    match keys.len() {
        0 => debug!(node = %name, "No key property in model"),
        1 => {
            debug!(node = %name, key = %keys[0], "Derived id field from model");
            node.id_field = Some(keys.remove(0));
        }
        _ => return Err(ModelError::MultipleKeys(name.to_string(), keys)),
    }
    Ok(node)
}

fn prop_model(definition: Option<&serde_yaml::Value>) -> PropModel {
    let mut model = PropModel {
        prop_type: DEFAULT_TYPE.to_string(),
        required: false,
        enum_values: None,
    };
    let Some(definition) = definition else {
        return model;
    };

    model.required = is_truthy(definition.get(REQUIRED));

    match definition.get(PROP_TYPE) {
        Some(serde_yaml::Value::String(type_name)) => {
            model.prop_type = map_type(type_name);
        }
        // A list-valued Type is an enumeration of allowed values.
        Some(serde_yaml::Value::Sequence(values)) => {
            let set = enum_set(values);
            if !set.is_empty() {
                model.enum_values = Some(set);
            }
        }
        _ => {
            if let Some(serde_yaml::Value::Sequence(values)) = definition.get(PROP_ENUM) {
                let set = enum_set(values);
                if !set.is_empty() {
                    model.enum_values = Some(set);
                    model.prop_type = PROP_ENUM.to_string();
                }
            }
        }
    }
    model
}

fn enum_set(values: &[serde_yaml::Value]) -> BTreeSet<String> {
    values
        .iter()
        .filter_map(|v| v.as_str().map(|s| s.to_string()))
        .collect()
}

fn is_truthy(value: Option<&serde_yaml::Value>) -> bool {
    match value {
        Some(serde_yaml::Value::Bool(b)) => *b,
        Some(serde_yaml::Value::String(s)) => {
            matches!(s.to_lowercase().as_str(), "true" | "yes")
        }
        _ => false,
    }
}

fn map_type(type_name: &str) -> String {
    TYPE_MAPPING
        .iter()
        .find(|(from, _)| *from == type_name)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| {
            debug!(source_type = %type_name, "No type mapping, using default");
            DEFAULT_TYPE.to_string()
        })
}
