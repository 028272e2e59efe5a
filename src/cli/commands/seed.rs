use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::hash_password;
use crate::cli::OutputFormat;
use crate::database::models::bootcamp::{slugify, DEFAULT_PHOTO};
use crate::database::models::{Bootcamp, Course, Review, UserRecord};
use crate::database::repository::decode;
use crate::database::{Collection, Document, Repository, Store, BOOTCAMPS, COURSES, REVIEWS, USERS};
use crate::services::refresh_bootcamp_averages;

/// Documents written per collection, in import order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub bootcamps: usize,
    pub courses: usize,
    pub reviews: usize,
}

pub async fn handle_import(store: Arc<dyn Store>, dir: &Path, bcrypt_cost: u32, output_format: OutputFormat) -> anyhow::Result<()> {
    let summary = import_dir(&store, dir, bcrypt_cost).await?;
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => println!(
            "Data imported: {} users, {} bootcamps, {} courses, {} reviews",
            summary.users, summary.bootcamps, summary.courses, summary.reviews
        ),
    }
    Ok(())
}

pub async fn handle_destroy(store: Arc<dyn Store>, users: bool, output_format: OutputFormat) -> anyhow::Result<()> {
    let summary = destroy(&store, users).await?;
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => println!(
            "Data deleted: {} users, {} bootcamps, {} courses, {} reviews",
            summary.users, summary.bootcamps, summary.courses, summary.reviews
        ),
    }
    Ok(())
}

/// Loads `<collection>.json` files from `dir`. Missing files are skipped;
/// user passwords in the files are plaintext and hashed on the way in.
pub async fn import_dir(store: &Arc<dyn Store>, dir: &Path, bcrypt_cost: u32) -> anyhow::Result<SeedSummary> {
    if !dir.is_dir() {
        bail!("Data directory not found: {}", dir.display());
    }

    let mut summary = SeedSummary::default();

    for mut doc in read_documents(dir, &USERS)? {
        let plain = doc
            .get("password")
            .and_then(Value::as_str)
            .context("every seeded user needs a password")?
            .to_string();
        doc.insert("password".into(), json!(hash_password(&plain, bcrypt_cost)?));
        doc.entry("role").or_insert(json!("user"));
        summary.users += insert::<UserRecord>(store, &USERS, doc).await?;
    }

    let mut bootcamp_ids = Vec::new();
    for mut doc in read_documents(dir, &BOOTCAMPS)? {
        let slug = doc.get("name").and_then(Value::as_str).map(slugify).unwrap_or_default();
        doc.entry("slug").or_insert(json!(slug));
        doc.entry("photo").or_insert(json!(DEFAULT_PHOTO));
        doc.entry("careers").or_insert(json!([]));
        for flag in ["housing", "job_assistance", "job_guarantee", "accept_gi"] {
            doc.entry(flag).or_insert(json!(false));
        }
        if let Some(id) = doc.get("id").and_then(Value::as_str).and_then(|id| id.parse::<Uuid>().ok()) {
            bootcamp_ids.push(id);
        }
        summary.bootcamps += insert::<Bootcamp>(store, &BOOTCAMPS, doc).await?;
    }

    for mut doc in read_documents(dir, &COURSES)? {
        doc.entry("scholarship_available").or_insert(json!(false));
        summary.courses += insert::<Course>(store, &COURSES, doc).await?;
    }

    for doc in read_documents(dir, &REVIEWS)? {
        summary.reviews += insert::<Review>(store, &REVIEWS, doc).await?;
    }

    for id in bootcamp_ids {
        refresh_bootcamp_averages(store, id).await?;
    }

    Ok(summary)
}

pub async fn destroy(store: &Arc<dyn Store>, users: bool) -> anyhow::Result<SeedSummary> {
    let all = || json!({});
    let mut summary = SeedSummary {
        reviews: store.delete_where(&REVIEWS, all()).await? as usize,
        courses: store.delete_where(&COURSES, all()).await? as usize,
        bootcamps: store.delete_where(&BOOTCAMPS, all()).await? as usize,
        users: 0,
    };
    if users {
        summary.users = store.delete_where(&USERS, all()).await? as usize;
    }
    Ok(summary)
}

fn read_documents(dir: &Path, collection: &Collection) -> anyhow::Result<Vec<Document>> {
    let path = dir.join(format!("{}.json", collection.name));
    if !path.exists() {
        tracing::info!("No {} to import", path.display());
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let docs: Vec<Document> = serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON array of objects", path.display()))?;

    Ok(docs
        .into_iter()
        .map(|mut doc| {
            doc.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
            doc.entry("created_at").or_insert_with(|| json!(Utc::now()));
            doc
        })
        .collect())
}

/// Decodes through the model type first so malformed seed rows fail before
/// reaching the store.
async fn insert<T>(store: &Arc<dyn Store>, collection: &'static Collection, doc: Document) -> anyhow::Result<usize>
where
    T: Serialize + DeserializeOwned + Send,
{
    let id = doc.get("id").cloned().unwrap_or(Value::Null);
    let record: T = decode(doc).with_context(|| format!("invalid {} row {}", collection.name, id))?;
    Repository::<T>::new(collection, store.clone())
        .insert(&record)
        .await
        .with_context(|| format!("failed to insert {} row {}", collection.name, id))?;
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn write(dir: &Path, name: &str, value: Value) {
        fs::write(dir.join(name), serde_json::to_string(&value).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn imports_then_destroys() {
        let dir = std::env::temp_dir().join(format!("bootcamp-seed-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        let owner = Uuid::new_v4();
        let bootcamp = Uuid::new_v4();
        write(&dir, "users.json", json!([{ "id": owner, "name": "Pub", "email": "pub@example.com", "password": "123456", "role": "publisher" }]));
        write(&dir, "bootcamps.json", json!([{
            "id": bootcamp, "user_id": owner, "name": "Devworks Bootcamp",
            "description": "d", "address": "Boston", "careers": ["Web Development"]
        }]));
        write(&dir, "courses.json", json!([
            { "user_id": owner, "bootcamp_id": bootcamp, "title": "A", "description": "d", "weeks": 8, "tuition": 8000.0, "minimum_skill": "beginner" },
            { "user_id": owner, "bootcamp_id": bootcamp, "title": "B", "description": "d", "weeks": 12, "tuition": 12000.0, "minimum_skill": "advanced" }
        ]));

        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let summary = import_dir(&store, &dir, 4).await.unwrap();
        assert_eq!(summary, SeedSummary { users: 1, bootcamps: 1, courses: 2, reviews: 0 });

        let saved: Bootcamp = Repository::new(&BOOTCAMPS, store.clone()).get_404(bootcamp).await.unwrap();
        assert_eq!(saved.slug, "devworks-bootcamp");
        assert_eq!(saved.average_cost, Some(10000.0));

        let user: UserRecord = Repository::new(&USERS, store.clone()).get_404(owner).await.unwrap();
        assert_ne!(user.password, "123456");

        let wiped = destroy(&store, false).await.unwrap();
        assert_eq!(wiped.courses, 2);
        assert_eq!(wiped.users, 0);
        assert_eq!(store.count(&USERS, None).await.unwrap(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        assert!(import_dir(&store, Path::new("/definitely/not/here"), 4).await.is_err());
    }
}
