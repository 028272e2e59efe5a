use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};

use crate::database::{Collection, DatabaseError, Document, Store};
use crate::filter::FilterData;

/// Embeds related documents into query results. Configured per resource.
#[derive(Debug, Clone, Copy)]
pub enum Populate {
    /// `as_field` becomes the document `local_field` points at, limited to `select`.
    Reference {
        local_field: &'static str,
        target: &'static Collection,
        as_field: &'static str,
        select: &'static [&'static str],
    },
    /// `as_field` becomes every `target` document whose `foreign_field` is this document's id.
    Children {
        target: &'static Collection,
        foreign_field: &'static str,
        as_field: &'static str,
    },
}

pub async fn populate(store: &dyn Store, docs: &mut [Document], populate: &[Populate]) -> Result<(), DatabaseError> {
    for spec in populate {
        match *spec {
            Populate::Reference { local_field, target, as_field, select } => {
                let ids = distinct(docs.iter().filter_map(|d| d.get(local_field)));
                if ids.is_empty() {
                    continue;
                }
                let mut columns: Vec<String> = select.iter().map(|c| c.to_string()).collect();
                if !columns.iter().any(|c| c == "id") {
                    columns.insert(0, "id".to_string());
                }
                let found = store
                    .find(
                        target,
                        FilterData {
                            select: Some(columns),
                            where_clause: Some(json!({ "id": { "$in": ids } })),
                            ..Default::default()
                        },
                    )
                    .await?;
                let by_id: HashMap<String, Document> = found
                    .into_iter()
                    .filter_map(|d| id_of(&d).map(|id| (id, strip_hidden(target, d))))
                    .collect();
                for doc in docs.iter_mut() {
                    if let Some(key) = doc.get(local_field).and_then(Value::as_str).map(str::to_string) {
                        let embedded = by_id.get(&key).cloned().map(Value::Object).unwrap_or(Value::Null);
                        doc.insert(as_field.to_string(), embedded);
                    }
                }
            }
            Populate::Children { target, foreign_field, as_field } => {
                let ids = distinct(docs.iter().filter_map(|d| d.get("id")));
                if ids.is_empty() {
                    continue;
                }
                let children = store
                    .find(
                        target,
                        FilterData {
                            where_clause: Some(json!({ foreign_field: { "$in": ids } })),
                            order: Some(json!(["created_at asc", "id asc"])),
                            ..Default::default()
                        },
                    )
                    .await?;
                let mut grouped: HashMap<String, Vec<Value>> = HashMap::new();
                for child in children {
                    if let Some(parent) = child.get(foreign_field).and_then(Value::as_str).map(str::to_string) {
                        grouped.entry(parent).or_default().push(Value::Object(strip_hidden(target, child)));
                    }
                }
                for doc in docs.iter_mut() {
                    if let Some(id) = id_of(doc) {
                        let items = grouped.remove(&id).unwrap_or_default();
                        doc.insert(as_field.to_string(), Value::Array(items));
                    }
                }
            }
        }
    }
    Ok(())
}

fn id_of(doc: &Document) -> Option<String> {
    doc.get("id").and_then(Value::as_str).map(str::to_string)
}

fn distinct<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    values
        .filter_map(Value::as_str)
        .filter(|v| seen.insert(v.to_string()))
        .map(|v| json!(v))
        .collect()
}

pub fn strip_hidden(collection: &Collection, mut doc: Document) -> Document {
    for hidden in collection.hidden_fields {
        doc.remove(*hidden);
    }
    doc
}
