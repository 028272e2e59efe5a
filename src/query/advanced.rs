use serde::Serialize;
use serde_json::{json, Value};

use crate::config::FilterConfig;
use crate::database::{Collection, DatabaseError, Document, Store};
use crate::filter::FilterData;

use super::pagination::{PageRequest, Pagination};
use super::params::{build_where, QueryParams};
use super::populate::{populate, Populate};

pub const DEFAULT_SORT: &str = "created_at desc";

/// One list request, fully resolved against a collection.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub where_clause: Value,
    pub select: Vec<String>,
    pub order: Vec<String>,
    pub page: PageRequest,
}

impl QuerySpec {
    pub fn from_params(params: &QueryParams, collection: &Collection, config: &FilterConfig) -> Self {
        Self {
            where_clause: build_where(params, collection),
            select: select_fields(params.get("select"), collection),
            order: sort_keys(params.get("sort"), collection),
            page: PageRequest::from_params(params.get("page"), params.get("limit"), config.default_limit, config.max_limit),
        }
    }

    pub fn filter_data(&self) -> FilterData {
        FilterData {
            select: Some(self.select.clone()),
            where_clause: Some(self.where_clause.clone()),
            order: Some(json!(self.order)),
            limit: Some(self.page.limit),
            offset: Some(self.page.start_index()),
        }
    }
}

/// `select=a,b` restricted to visible fields, always with `id`. Without a
/// `select` every visible field is returned; a `select` naming nothing
/// visible projects only `id`.
fn select_fields(raw: Option<&str>, collection: &Collection) -> Vec<String> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty());
    let requested: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|f| collection.visible_field(f).is_some())
        .map(str::to_string)
        .collect();

    if raw.is_none() {
        return collection
            .fields
            .iter()
            .filter(|f| !collection.is_hidden(f.name))
            .map(|f| f.name.to_string())
            .collect();
    }

    let mut fields = vec!["id".to_string()];
    for f in requested {
        if !fields.contains(&f) {
            fields.push(f);
        }
    }
    fields
}

/// `sort=a,-b` into order strings; newest first by default. `id` breaks ties
/// so paging is stable.
fn sort_keys(raw: Option<&str>, collection: &Collection) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    for token in raw.unwrap_or_default().split(|c: char| c == ',' || c.is_whitespace()) {
        let (name, direction) = match token.strip_prefix('-') {
            Some(name) => (name, "desc"),
            None => (token.strip_prefix('+').unwrap_or(token), "asc"),
        };
        let Some(field) = collection.visible_field(name) else { continue };
        if seen.contains(&field.name) {
            continue;
        }
        seen.push(field.name);
        keys.push(format!("{} {}", field.name, direction));
    }
    if keys.is_empty() {
        keys.push(DEFAULT_SORT.to_string());
        seen.push("created_at");
    }
    if !seen.contains(&"id") {
        keys.push("id asc".to_string());
    }
    keys
}

/// A page of a collection plus its pagination envelope.
#[derive(Debug, Clone, Serialize)]
pub struct AdvancedResults {
    pub success: bool,
    pub count: usize,
    pub total: i64,
    pub pagination: Pagination,
    pub data: Vec<Document>,
}

/// Runs a list request: filters, projection, sort and paging from the query
/// string, then the collection's configured populate step. Malformed
/// parameters fall back to defaults; only storage failures surface.
pub async fn advanced_results(
    store: &dyn Store,
    collection: &Collection,
    params: &QueryParams,
    populate_with: &[Populate],
    config: &FilterConfig,
) -> Result<AdvancedResults, DatabaseError> {
    let spec = QuerySpec::from_params(params, collection, config);
    if config.debug_logging {
        tracing::debug!(collection = collection.name, "advanced results: {:?}", spec);
    }

    let total = store.count(collection, Some(spec.where_clause.clone())).await?;
    let mut data = store.find(collection, spec.filter_data()).await?;
    populate(store, &mut data, populate_with).await?;

    Ok(AdvancedResults {
        success: true,
        count: data.len(),
        total,
        pagination: Pagination::compute(&spec.page, total),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::{MemoryStore, BOOTCAMPS, USERS};

    fn filter_config() -> FilterConfig {
        AppConfig::test().filter
    }

    #[test]
    fn default_spec() {
        let spec = QuerySpec::from_params(&QueryParams::default(), &BOOTCAMPS, &filter_config());
        assert_eq!(spec.order, vec!["created_at desc", "id asc"]);
        assert_eq!(spec.page, PageRequest { page: 1, limit: 10 });
        assert_eq!(spec.where_clause, json!({}));
        assert_eq!(spec.select.len(), BOOTCAMPS.fields.len());
    }

    #[test]
    fn select_and_sort_are_restricted_to_visible_fields() {
        let params = QueryParams::from_pairs([("select", "name,password,bogus"), ("sort", "-name,password,email")]);
        let spec = QuerySpec::from_params(&params, &USERS, &filter_config());
        assert_eq!(spec.select, vec!["id", "name"]);
        assert_eq!(spec.order, vec!["name desc", "email asc", "id asc"]);

        let all = QuerySpec::from_params(&QueryParams::default(), &USERS, &filter_config());
        assert!(!all.select.iter().any(|f| f == "password"));
    }

    #[test]
    fn select_of_nothing_visible_projects_only_id() {
        let params = QueryParams::from_pairs([("select", "password,bogus")]);
        let spec = QuerySpec::from_params(&params, &USERS, &filter_config());
        assert_eq!(spec.select, vec!["id"]);

        let params = QueryParams::from_pairs([("select", " ")]);
        let spec = QuerySpec::from_params(&params, &USERS, &filter_config());
        assert!(spec.select.len() > 1);
    }

    #[tokio::test]
    async fn pages_through_matching_documents() {
        let store = MemoryStore::new();
        for i in 0..25 {
            let mut doc = Document::new();
            doc.insert("id".into(), json!(format!("{:02}", i)));
            doc.insert("name".into(), json!(format!("Camp {:02}", i)));
            doc.insert("housing".into(), json!(i % 5 != 0));
            doc.insert("created_at".into(), json!(format!("2024-01-01T00:00:{:02}Z", i)));
            store.insert(&BOOTCAMPS, doc).await.unwrap();
        }

        let params = QueryParams::from_pairs([("page", "3"), ("sort", "name")]);
        let page = advanced_results(&store, &BOOTCAMPS, &params, &[], &filter_config()).await.unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.count, 5);
        assert_eq!(page.data[0]["name"], json!("Camp 20"));
        assert!(page.pagination.next.is_none());
        assert_eq!(page.pagination.prev.unwrap().page, 2);

        let params = QueryParams::from_pairs([("housing", "false"), ("limit", "2")]);
        let page = advanced_results(&store, &BOOTCAMPS, &params, &[], &filter_config()).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.count, 2);
        // newest first by default
        assert_eq!(page.data[0]["name"], json!("Camp 20"));
        assert_eq!(page.pagination.next.unwrap().page, 2);
    }
}
