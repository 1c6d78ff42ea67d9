#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use storefront_api::database::models::Role;
use storefront_api::database::{MemoryStore, Store};
use storefront_api::{app, AppConfig, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

/// A live server on a free port, backed by its own in-memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = TEST_SECRET.to_string();
    // Cheap hashing keeps the suite fast
    config.security.password_memory_kib = 1024;
    config.security.password_iterations = 1;
    config
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone())?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;

        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.ok();
        });

        Ok(Self {
            port,
            base_url,
            store,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register and return the created user body
    pub async fn register(&self, email: &str, password: &str) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());
        Ok(res.json().await?)
    }

    /// Log in and return the bearer token
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }

    /// Register a fresh account and return (user id, token)
    pub async fn user(&self, email: &str) -> Result<(i64, String)> {
        let user = self.register(email, "secret-pw").await?;
        let id = user["id"].as_i64().context("user has no id")?;
        let token = self.login(email, "secret-pw").await?;
        Ok((id, token))
    }

    /// Register, promote through the store, and log in again for an ADMIN token
    pub async fn admin(&self, email: &str) -> Result<(i64, String)> {
        let (id, _) = self.user(email).await?;
        self.store.set_user_role(id, Role::Admin).await?;
        let token = self.login(email, "secret-pw").await?;
        Ok((id, token))
    }

    pub async fn create_product(&self, name: &str, description: Option<&str>, price: f64) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/products"))
            .json(&json!({ "name": name, "description": description, "price": price }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create product failed: {}", res.status());
        Ok(res.json().await?)
    }
}
