//! Document synthesis for `model` indices.
//!
//! The graph-schema model expands into three document shapes: one per
//! node, one per declared property, and one per allowed enumeration
//! value. Ids are derived from the names so repeated runs overwrite
//! rather than duplicate.

use serde_json::json;

use graphsync_model::SchemaModel;
use graphsync_types::Record;

/// Build the full `(id, body)` document set for a model index.
pub fn build_model_documents(model: &SchemaModel) -> Vec<(String, Record)> {
    let mut documents = Vec::new();
    for (node_name, node) in model.nodes() {
        documents.push((
            format!("node_{node_name}"),
            record(json!({ "type": "node", "node": node_name })),
        ));
        for (prop_name, prop) in &node.properties {
            documents.push((
                format!("property_{node_name}_{prop_name}"),
                record(json!({
                    "type": "property",
                    "node": node_name,
                    "property": prop_name,
                    "property_type": prop.prop_type,
                    "required": prop.required,
                })),
            ));
            for value in prop.enum_values.iter().flatten() {
                documents.push((
                    format!("value_{node_name}_{prop_name}_{value}"),
                    record(json!({
                        "type": "value",
                        "node": node_name,
                        "property": prop_name,
                        "value": value,
                    })),
                ));
            }
        }
    }
    documents
}

fn record(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!("model documents are always objects"),
    }
}
