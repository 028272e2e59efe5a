mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{bootcamp_body, id_of, spawn_server};

#[tokio::test]
async fn create_requires_auth_and_publisher_role() -> Result<()> {
    let server = spawn_server().await?;

    let (status, _) = server.post("/api/v1/bootcamps", None, bootcamp_body("Devworks")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = server.register("Reader", "reader@example.com", "user").await?;
    let (status, body) = server.post("/api/v1/bootcamps", Some(&user), bootcamp_body("Devworks")).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], json!("User role user is not authorized to access this route"));

    let publisher = server.register("Pub", "pub@example.com", "publisher").await?;
    let bootcamp = server.create_bootcamp(&publisher, "Devworks Bootcamp").await?;
    assert_eq!(bootcamp["slug"], json!("devworks-bootcamp"));
    assert_eq!(bootcamp["photo"], json!("no-photo.jpg"));
    Ok(())
}

#[tokio::test]
async fn publishers_get_one_bootcamp_admins_are_unlimited() -> Result<()> {
    let server = spawn_server().await?;
    let publisher = server.register("Pub", "pub@example.com", "publisher").await?;
    server.create_bootcamp(&publisher, "First").await?;

    let (status, body) = server.post("/api/v1/bootcamps", Some(&publisher), bootcamp_body("Second")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("already published a bootcamp"));

    let admin = server.admin_token().await?;
    server.create_bootcamp(&admin, "Admin One").await?;
    server.create_bootcamp(&admin, "Admin Two").await?;
    Ok(())
}

#[tokio::test]
async fn concurrent_creates_by_one_publisher_yield_one_bootcamp() -> Result<()> {
    let server = spawn_server().await?;
    let publisher = server.register("Pub", "pub@example.com", "publisher").await?;

    let (first, second, third) = tokio::join!(
        server.post("/api/v1/bootcamps", Some(&publisher), bootcamp_body("Alpha")),
        server.post("/api/v1/bootcamps", Some(&publisher), bootcamp_body("Beta")),
        server.post("/api/v1/bootcamps", Some(&publisher), bootcamp_body("Gamma")),
    );
    let statuses = [first?.0, second?.0, third?.0];
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1, "{:?}", statuses);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::BAD_REQUEST).count(), 2, "{:?}", statuses);

    let (_, body) = server.get("/api/v1/bootcamps", None).await?;
    assert_eq!(body["total"], json!(1));
    Ok(())
}

#[tokio::test]
async fn invalid_bodies_are_rejected() -> Result<()> {
    let server = spawn_server().await?;
    let publisher = server.register("Pub", "pub@example.com", "publisher").await?;

    let mut body = bootcamp_body("Devworks");
    body["careers"] = json!(["Basket Weaving"]);
    let (status, res) = server.post("/api/v1/bootcamps", Some(&publisher), body).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res["field_errors"]["careers"].is_string(), "{}", res);

    let (status, _) = server
        .post("/api/v1/bootcamps", Some(&publisher), json!({ "description": "no name" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn only_owner_or_admin_may_modify() -> Result<()> {
    let server = spawn_server().await?;
    let owner = server.register("Owner", "owner@example.com", "publisher").await?;
    let other = server.register("Other", "other@example.com", "publisher").await?;
    let id = id_of(&server.create_bootcamp(&owner, "Devworks").await?);
    let path = format!("/api/v1/bootcamps/{}", id);

    let (status, _) = server.put(&path, Some(&other), json!({ "housing": false })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = server.delete(&path, Some(&other)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server.put(&path, Some(&owner), json!({ "name": "Devworks Reloaded" })).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["slug"], json!("devworks-reloaded"));
    assert_eq!(body["data"]["housing"], json!(true));

    let admin = server.admin_token().await?;
    let (status, body) = server.put(&path, Some(&admin), json!({ "job_guarantee": true })).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["job_guarantee"], json!(true));
    Ok(())
}

#[tokio::test]
async fn missing_and_malformed_ids_are_not_found() -> Result<()> {
    let server = spawn_server().await?;
    let owner = server.register("Owner", "owner@example.com", "publisher").await?;

    let (status, body) = server.get("/api/v1/bootcamps/not-an-id", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Resource not found with id of not-an-id"));

    let missing = uuid::Uuid::new_v4();
    let (status, _) = server.get(&format!("/api/v1/bootcamps/{}", missing), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // existence is checked before ownership
    let (status, _) = server
        .put(&format!("/api/v1/bootcamps/{}", missing), Some(&owner), json!({ "housing": true }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_removes_courses_and_reviews() -> Result<()> {
    let server = spawn_server().await?;
    let owner = server.register("Owner", "owner@example.com", "publisher").await?;
    let reader = server.register("Reader", "reader@example.com", "user").await?;
    let id = id_of(&server.create_bootcamp(&owner, "Devworks").await?);
    server.add_course(&owner, &id, "Front End", 8000.0).await?;
    let (status, _) = server
        .post(
            &format!("/api/v1/bootcamps/{}/reviews", id),
            Some(&reader),
            json!({ "title": "Great", "text": "Loved it", "rating": 9 }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = server.delete(&format!("/api/v1/bootcamps/{}", id), Some(&owner)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({}));

    let (_, courses) = server.get("/api/v1/courses", None).await?;
    assert_eq!(courses["total"], json!(0));
    let (_, reviews) = server.get("/api/v1/reviews", None).await?;
    assert_eq!(reviews["total"], json!(0));
    Ok(())
}

#[tokio::test]
async fn service_info_health_and_unknown_routes() -> Result<()> {
    let server = spawn_server().await?;
    let (status, body) = server.get("/", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let (status, body) = server.get("/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], json!("ok"));

    let (status, body) = server.get("/api/v1/nothing-here", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    Ok(())
}
