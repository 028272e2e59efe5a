use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::database::collections::Collection;
use crate::database::store::{DatabaseError, Document, Store};
use crate::filter::filter_order::FilterOrder;
use crate::filter::{matcher, FilterData};

/// In-process store for development and tests. Evaluates the same filter
/// syntax as the SQL store and enforces each collection's unique keys.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<&'static str, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(
        collection: &Collection,
        rows: &[Document],
        candidate: &Document,
        skip: Option<usize>,
    ) -> Result<(), DatabaseError> {
        for key in collection.unique {
            let values: Vec<&Value> = key.iter().map(|f| candidate.get(*f).unwrap_or(&Value::Null)).collect();
            if values.iter().any(|v| v.is_null()) {
                continue;
            }
            let clash = rows.iter().enumerate().any(|(i, row)| {
                Some(i) != skip && key.iter().zip(&values).all(|(f, v)| row.get(*f) == Some(*v))
            });
            if clash {
                return Err(DatabaseError::Duplicate(format!("{}_{}_key", collection.name, key.join("_"))));
            }
        }
        Ok(())
    }

    fn known_fields(collection: &Collection, doc: Document) -> Document {
        doc.into_iter().filter(|(k, _)| collection.field(k).is_some()).collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find(&self, collection: &Collection, query: FilterData) -> Result<Vec<Document>, DatabaseError> {
        let order = match query.order {
            Some(ref order) => FilterOrder::validate_and_parse(order)?,
            None => vec![],
        };
        let where_clause = query.where_clause.unwrap_or(Value::Null);

        let mut docs = {
            let guard = self.collections.read();
            let mut out = Vec::new();
            for doc in guard.get(collection.name).into_iter().flatten() {
                if matcher::matches(doc, &where_clause)? {
                    out.push(doc.clone());
                }
            }
            out
        };

        matcher::sort(&mut docs, &order);

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        let select = query.select.unwrap_or_default();
        Ok(docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|doc| matcher::project(doc, &select))
            .collect())
    }

    async fn count(&self, collection: &Collection, where_clause: Option<Value>) -> Result<i64, DatabaseError> {
        let where_clause = where_clause.unwrap_or(Value::Null);
        let guard = self.collections.read();
        let mut count = 0;
        for doc in guard.get(collection.name).into_iter().flatten() {
            if matcher::matches(doc, &where_clause)? {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn insert(&self, collection: &Collection, doc: Document) -> Result<Document, DatabaseError> {
        let doc = Self::known_fields(collection, doc);
        let mut guard = self.collections.write();
        let rows = guard.entry(collection.name).or_default();
        Self::check_unique(collection, rows, &doc, None)?;
        rows.push(doc.clone());
        Ok(doc)
    }

    async fn update_where(
        &self,
        collection: &Collection,
        where_clause: Value,
        changes: Document,
    ) -> Result<Vec<Document>, DatabaseError> {
        let changes = Self::known_fields(collection, changes);
        let mut guard = self.collections.write();
        let rows = guard.entry(collection.name).or_default();

        let mut targets = Vec::new();
        for (i, doc) in rows.iter().enumerate() {
            if matcher::matches(doc, &where_clause)? {
                targets.push(i);
            }
        }

        // Validate every target before touching any so the update is all-or-nothing.
        let mut updated = Vec::with_capacity(targets.len());
        for &i in &targets {
            let mut next = rows[i].clone();
            for (k, v) in &changes {
                next.insert(k.clone(), v.clone());
            }
            Self::check_unique(collection, rows, &next, Some(i))?;
            updated.push((i, next));
        }

        let mut out = Vec::with_capacity(updated.len());
        for (i, next) in updated {
            rows[i] = next.clone();
            out.push(next);
        }
        Ok(out)
    }

    async fn delete_where(&self, collection: &Collection, where_clause: Value) -> Result<u64, DatabaseError> {
        let mut guard = self.collections.write();
        let rows = guard.entry(collection.name).or_default();
        let before = rows.len();
        let mut kept = Vec::with_capacity(before);
        for doc in rows.drain(..) {
            if !matcher::matches(&doc, &where_clause)? {
                kept.push(doc);
            }
        }
        *rows = kept;
        Ok((before - rows.len()) as u64)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
