#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use bootcamp_api::auth::{hash_password, Role};
use bootcamp_api::config::AppConfig;
use bootcamp_api::database::models::UserRecord;
use bootcamp_api::database::MemoryStore;
use bootcamp_api::services::{EmailMessage, MailError, Mailer};
use bootcamp_api::{app, AppState};

pub const PASSWORD: &str = "123456";

/// Keeps every message so tests can read reset links back out.
#[derive(Default)]
pub struct CapturingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: Mutex<bool>,
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        if *self.fail.lock() {
            return Err(MailError::Transport("smtp down".into()));
        }
        self.sent.lock().push(message);
        Ok(())
    }
}

pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    pub mailer: Arc<CapturingMailer>,
    pub client: reqwest::Client,
}

/// Serves the real router on a free port, backed by a fresh memory store.
pub async fn spawn_server() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let mut config = AppConfig::test();
    config.server.port = port;
    config.server.public_url = format!("http://127.0.0.1:{}", port);

    let mailer = Arc::new(CapturingMailer::default());
    let state = AppState::new(config, Arc::new(MemoryStore::new()), mailer.clone())?;

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    let router = app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        state,
        mailer,
        client: reqwest::Client::new(),
    })
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and returns the status with the parsed JSON body.
    pub async fn call(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.call(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::PUT, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.call(Method::DELETE, path, token, None).await
    }

    /// Registers an identity and returns its session token.
    pub async fn register(&self, name: &str, email: &str, role: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/api/v1/auth/register",
                None,
                json!({ "name": name, "email": email, "password": PASSWORD, "role": role }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);
        token_of(&body)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(StatusCode, Value)> {
        self.post("/api/v1/auth/login", None, json!({ "email": email, "password": password }))
            .await
    }

    /// Admins cannot self-register, so one is written straight to the store.
    pub async fn admin_token(&self) -> Result<String> {
        let record = UserRecord {
            id: uuid::Uuid::new_v4(),
            name: "Admin".into(),
            email: "admin@example.com".into(),
            role: Role::Admin,
            password: hash_password(PASSWORD, 4)?,
            reset_password_token: None,
            reset_password_expire: None,
            created_at: chrono::Utc::now(),
        };
        self.state.users().insert(&record).await?;
        let (status, body) = self.login("admin@example.com", PASSWORD).await?;
        anyhow::ensure!(status == StatusCode::OK, "admin login failed: {}", body);
        token_of(&body)
    }

    pub async fn create_bootcamp(&self, token: &str, name: &str) -> Result<Value> {
        let (status, body) = self.post("/api/v1/bootcamps", Some(token), bootcamp_body(name)).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create bootcamp failed: {} {}", status, body);
        Ok(body["data"].clone())
    }

    pub async fn add_course(&self, token: &str, bootcamp_id: &str, title: &str, tuition: f64) -> Result<Value> {
        let (status, body) = self
            .post(
                &format!("/api/v1/bootcamps/{}/courses", bootcamp_id),
                Some(token),
                json!({
                    "title": title,
                    "description": "Learn things",
                    "weeks": 8,
                    "tuition": tuition,
                    "minimum_skill": "beginner"
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "add course failed: {} {}", status, body);
        Ok(body["data"].clone())
    }
}

pub fn bootcamp_body(name: &str) -> Value {
    json!({
        "name": name,
        "description": "A bootcamp",
        "website": "https://example.com",
        "email": "camp@example.com",
        "address": "233 Bay State Rd Boston MA 02215",
        "careers": ["Web Development", "Business"],
        "housing": true
    })
}

pub fn token_of(body: &Value) -> Result<String> {
    body["token"].as_str().map(str::to_string).context("no token in response")
}

pub fn id_of(data: &Value) -> String {
    data["id"].as_str().unwrap_or_default().to_string()
}
