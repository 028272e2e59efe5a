mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{id_of, spawn_server, TestServer};

async fn review(server: &TestServer, token: &str, bootcamp_id: &str, rating: i64) -> Result<(StatusCode, Value)> {
    server
        .post(
            &format!("/api/v1/bootcamps/{}/reviews", bootcamp_id),
            Some(token),
            json!({ "title": "Review", "text": "Some text", "rating": rating }),
        )
        .await
}

#[tokio::test]
async fn courses_belong_to_the_bootcamp_owner() -> Result<()> {
    let server = spawn_server().await?;
    let owner = server.register("Owner", "owner@example.com", "publisher").await?;
    let other = server.register("Other", "other@example.com", "publisher").await?;
    let bootcamp = id_of(&server.create_bootcamp(&owner, "Devworks").await?);

    let (status, _) = server
        .post(
            &format!("/api/v1/bootcamps/{}/courses", bootcamp),
            Some(&other),
            json!({ "title": "x", "description": "x", "weeks": 1, "tuition": 1.0, "minimum_skill": "beginner" }),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let course = server.add_course(&owner, &bootcamp, "Front End", 8000.0).await?;
    assert_eq!(course["bootcamp_id"], json!(bootcamp));

    let (status, body) = server.get(&format!("/api/v1/bootcamps/{}/courses", bootcamp), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["data"][0]["title"], json!("Front End"));

    let path = format!("/api/v1/courses/{}", id_of(&course));
    let (status, body) = server.get(&path, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bootcamp"]["name"], json!("Devworks"));

    let (status, _) = server.put(&path, Some(&other), json!({ "weeks": 10 })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = server.put(&path, Some(&owner), json!({ "weeks": 10 })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["weeks"], json!(10));

    let (status, _) = server.put(&path, Some(&owner), json!({ "minimum_skill": "guru" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn average_cost_follows_courses() -> Result<()> {
    let server = spawn_server().await?;
    let owner = server.register("Owner", "owner@example.com", "publisher").await?;
    let bootcamp = id_of(&server.create_bootcamp(&owner, "Devworks").await?);
    let bootcamp_path = format!("/api/v1/bootcamps/{}", bootcamp);

    server.add_course(&owner, &bootcamp, "A", 8000.0).await?;
    let course = server.add_course(&owner, &bootcamp, "B", 10001.0).await?;
    let (_, body) = server.get(&bootcamp_path, None).await?;
    assert_eq!(body["data"]["average_cost"], json!(9010.0));

    let (status, _) = server.delete(&format!("/api/v1/courses/{}", id_of(&course)), Some(&owner)).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = server.get(&bootcamp_path, None).await?;
    assert_eq!(body["data"]["average_cost"], json!(8000.0));
    Ok(())
}

#[tokio::test]
async fn reviews_are_for_users_once_per_bootcamp() -> Result<()> {
    let server = spawn_server().await?;
    let owner = server.register("Owner", "owner@example.com", "publisher").await?;
    let alice = server.register("Alice", "alice@example.com", "user").await?;
    let bob = server.register("Bob", "bob@example.com", "user").await?;
    let bootcamp = id_of(&server.create_bootcamp(&owner, "Devworks").await?);

    let (status, _) = review(&server, &owner, &bootcamp, 5).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = review(&server, &alice, &bootcamp, 11).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, first) = review(&server, &alice, &bootcamp, 7).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = review(&server, &alice, &bootcamp, 9).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Duplicate field value entered"));
    review(&server, &bob, &bootcamp, 8).await?;

    let (_, body) = server.get(&format!("/api/v1/bootcamps/{}", bootcamp), None).await?;
    assert_eq!(body["data"]["average_rating"], json!(7.5));

    let (status, _) = server.get(&format!("/api/v1/bootcamps/{}/reviews", uuid::Uuid::new_v4()), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = review(&server, &alice, &uuid::Uuid::new_v4().to_string(), 5).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let path = format!("/api/v1/reviews/{}", id_of(&first["data"]));
    let (status, _) = server.put(&path, Some(&bob), json!({ "rating": 1 })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = server.put(&path, Some(&alice), json!({ "rating": 3 })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rating"], json!(3));

    let (_, body) = server.get(&path, None).await?;
    assert_eq!(body["data"]["bootcamp"]["name"], json!("Devworks"));

    let (status, _) = server.delete(&path, Some(&alice)).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = server.get(&format!("/api/v1/bootcamps/{}/reviews", bootcamp), None).await?;
    assert_eq!(body["count"], json!(1));
    Ok(())
}
