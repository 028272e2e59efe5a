mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{bootcamp_body, id_of, spawn_server, TestServer};

/// Twelve bootcamps owned by an admin; every third one without housing.
async fn seeded() -> Result<(TestServer, String)> {
    let server = spawn_server().await?;
    let admin = server.admin_token().await?;
    for i in 0..12 {
        let mut body = bootcamp_body(&format!("Camp {:02}", i));
        body["housing"] = json!(i % 3 != 0);
        if i % 2 == 0 {
            body["careers"] = json!(["Data Science"]);
        }
        let (status, res) = server.post("/api/v1/bootcamps", Some(&admin), body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "{}", res);
    }
    Ok((server, admin))
}

fn names(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|items| items.iter().filter_map(|b| b["name"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn paginates_with_defaults() -> Result<()> {
    let (server, _) = seeded().await?;

    let (status, body) = server.get("/api/v1/bootcamps", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["total"], json!(12));
    assert_eq!(body["count"], json!(10));
    assert_eq!(body["pagination"]["next"], json!({ "page": 2, "limit": 10 }));
    assert!(body["pagination"].get("prev").is_none());
    // newest first
    assert_eq!(names(&body)[0], "Camp 11");

    let (_, body) = server.get("/api/v1/bootcamps?page=2", None).await?;
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["pagination"]["prev"], json!({ "page": 1, "limit": 10 }));
    assert!(body["pagination"].get("next").is_none());
    Ok(())
}

#[tokio::test]
async fn malformed_paging_falls_back_to_defaults() -> Result<()> {
    let (server, _) = seeded().await?;
    for query in ["page=abc&limit=-5", "page=0&limit=0", "limit=ten"] {
        let (status, body) = server.get(&format!("/api/v1/bootcamps?{}", query), None).await?;
        assert_eq!(status, StatusCode::OK, "{}", query);
        assert_eq!(body["count"], json!(10), "{}", query);
    }
    Ok(())
}

#[tokio::test]
async fn filters_select_and_sort() -> Result<()> {
    let (server, _) = seeded().await?;

    let (_, body) = server.get("/api/v1/bootcamps?housing=false&sort=name", None).await?;
    assert_eq!(body["total"], json!(4));
    assert_eq!(names(&body), vec!["Camp 00", "Camp 03", "Camp 06", "Camp 09"]);

    let (_, body) = server.get("/api/v1/bootcamps?careers[in]=Data%20Science&housing=true", None).await?;
    assert_eq!(body["total"], json!(4));

    let (_, body) = server
        .get("/api/v1/bootcamps?name[gte]=Camp%2005&name[lt]=Camp%2008&sort=-name", None)
        .await?;
    assert_eq!(names(&body), vec!["Camp 07", "Camp 06", "Camp 05"]);

    let (_, body) = server.get("/api/v1/bootcamps?select=name,housing&limit=1", None).await?;
    let first = body["data"][0].as_object().cloned().unwrap_or_default();
    let mut keys: Vec<&str> = first.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["courses", "housing", "id", "name"]);

    let (status, body) = server.get("/api/v1/bootcamps?bogus=1&housing[regex]=x", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(12));
    Ok(())
}

#[tokio::test]
async fn list_results_are_populated() -> Result<()> {
    let (server, admin) = seeded().await?;
    let (_, body) = server.get("/api/v1/bootcamps?sort=name&limit=1", None).await?;
    let bootcamp = id_of(&body["data"][0]);
    server.add_course(&admin, &bootcamp, "Front End", 9000.0).await?;

    let (_, body) = server.get("/api/v1/bootcamps?sort=name&limit=1", None).await?;
    assert_eq!(body["data"][0]["courses"][0]["title"], json!("Front End"));

    let (_, body) = server.get("/api/v1/courses", None).await?;
    assert_eq!(body["total"], json!(1));
    assert_eq!(body["data"][0]["bootcamp"]["name"], json!("Camp 00"));
    assert_eq!(body["data"][0]["bootcamp"]["id"], json!(bootcamp));

    let (_, body) = server.get("/api/v1/courses?tuition[gt]=9000", None).await?;
    assert_eq!(body["total"], json!(0));
    Ok(())
}
