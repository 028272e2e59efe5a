use std::sync::Arc;

use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::database::models::{Course, Review};
use crate::database::{DatabaseError, Document, Repository, Store, BOOTCAMPS, COURSES, REVIEWS};
use crate::filter::FilterData;

/// Mean tuition rounded up to the next multiple of ten.
pub fn average_cost(courses: &[Course]) -> Option<f64> {
    if courses.is_empty() {
        return None;
    }
    let mean = courses.iter().map(|c| c.tuition).sum::<f64>() / courses.len() as f64;
    Some((mean / 10.0).ceil() * 10.0)
}

pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    Some(reviews.iter().map(|r| r.rating as f64).sum::<f64>() / reviews.len() as f64)
}

/// Recomputes a bootcamp's `average_cost` and `average_rating` from its
/// current courses and reviews. A bootcamp that no longer exists is skipped.
pub async fn refresh_bootcamp_averages(store: &Arc<dyn Store>, bootcamp_id: Uuid) -> Result<(), DatabaseError> {
    let by_bootcamp = || FilterData::matching(json!({ "bootcamp_id": bootcamp_id }));

    let courses: Vec<Course> = Repository::new(&COURSES, store.clone()).select_any(by_bootcamp()).await?;
    let reviews: Vec<Review> = Repository::new(&REVIEWS, store.clone()).select_any(by_bootcamp()).await?;

    let mut changes = Document::new();
    changes.insert("average_cost".into(), json!(average_cost(&courses)));
    changes.insert("average_rating".into(), json!(average_rating(&reviews)));
    debug!(%bootcamp_id, "Refreshing averages: {:?}", changes);

    store
        .update_where(&BOOTCAMPS, json!({ "id": bootcamp_id }), changes)
        .await?;
    Ok(())
}
