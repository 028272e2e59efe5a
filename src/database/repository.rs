use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::collections::Collection;
use crate::database::store::{DatabaseError, Document, Store};
use crate::filter::FilterData;

/// Typed access to one collection of a `Store`.
pub struct Repository<T> {
    collection: &'static Collection,
    store: Arc<dyn Store>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection,
            store: self.store.clone(),
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    pub fn new(collection: &'static Collection, store: Arc<dyn Store>) -> Self {
        Self {
            collection,
            store,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        let docs = self.store.find(self.collection, filter_data).await?;
        docs.into_iter().map(decode).collect()
    }

    pub async fn select_one(&self, mut filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        filter_data.limit = Some(1);
        let mut docs = self.store.find(self.collection, filter_data).await?;
        docs.pop().map(decode).transpose()
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        self.select_one(FilterData::matching(json!({ "id": id }))).await
    }

    pub async fn get_404(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Resource not found with id of {}", id)))
    }

    pub async fn count(&self, where_clause: Option<Value>) -> Result<i64, DatabaseError> {
        self.store.count(self.collection, where_clause).await
    }

    pub async fn insert(&self, record: &T) -> Result<T, DatabaseError> {
        let doc = encode(record)?;
        decode(self.store.insert(self.collection, doc).await?)
    }

    pub async fn update_where(&self, where_clause: Value, changes: Document) -> Result<Vec<T>, DatabaseError> {
        let docs = self.store.update_where(self.collection, where_clause, changes).await?;
        docs.into_iter().map(decode).collect()
    }

    pub async fn update_by_id(&self, id: Uuid, changes: Document) -> Result<T, DatabaseError> {
        self.update_where(json!({ "id": id }), changes)
            .await?
            .pop()
            .ok_or_else(|| DatabaseError::NotFound(format!("Resource not found with id of {}", id)))
    }

    pub async fn delete_where(&self, where_clause: Value) -> Result<u64, DatabaseError> {
        self.store.delete_where(self.collection, where_clause).await
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.delete_where(json!({ "id": id })).await? > 0)
    }
}

pub fn encode<S: Serialize>(record: &S) -> Result<Document, DatabaseError> {
    match serde_json::to_value(record)? {
        Value::Object(doc) => Ok(doc),
        _ => Err(DatabaseError::Query("Record did not serialize to an object".to_string())),
    }
}

pub fn decode<T: DeserializeOwned>(doc: Document) -> Result<T, DatabaseError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}
