//! Test harness driving the router in-process.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};
use tally_api::{AppState, create_router};
use tally_db::migration::Migrator;
use tally_shared::JwtConfig;
use tower::ServiceExt;

/// Rows written per periodic series in HTTP tests.
pub const SERIES_LENGTH: usize = 10;

/// A response with its body parsed as JSON (`Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Returns the `Set-Cookie` header values.
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}

/// A registered user.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// The router over a fresh in-memory database.
pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options)
            .await
            .expect("Failed to open in-memory database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let jwt = JwtConfig {
            secret: "api-test-secret-key-at-least-32-bytes".to_string(),
            ..JwtConfig::default()
        };
        let state = AppState::new(db, jwt, false, SERIES_LENGTH);

        Self {
            router: create_router(state),
        }
    }

    /// Sends a request built by the caller.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Sends a JSON request with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).expect("valid request")).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers a user and looks up its ID.
    pub async fn register(&self, email: &str) -> TestUser {
        let response = self
            .post(
                "/auth/register",
                None,
                json!({ "email": email, "password": "password123" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        let access_token = response.body["access_token"].as_str().unwrap().to_string();
        let refresh_token = response.body["refresh_token"].as_str().unwrap().to_string();
        let profile = self.get("/auth/profile", &access_token).await;

        TestUser {
            id: profile.body["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            access_token,
            refresh_token,
        }
    }

    /// Creates an account and returns its ID.
    pub async fn create_account(&self, owner: &TestUser, name: &str) -> String {
        let response = self
            .post(
                "/accounts",
                Some(&owner.access_token),
                json!({ "name": name }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }

    /// Invites `member` into `account_id` with `role`.
    pub async fn invite(&self, owner: &TestUser, account_id: &str, member: &TestUser, role: &str) {
        let response = self
            .post(
                &format!("/accounts/{account_id}/members"),
                Some(&owner.access_token),
                json!({ "email": member.email, "role": role }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    }

    /// Creates a one-off transaction and returns its ID.
    pub async fn create_transaction(
        &self,
        user: &TestUser,
        account_id: &str,
        title: &str,
        amount: &str,
    ) -> String {
        let response = self
            .post(
                &format!("/accounts/{account_id}/transactions"),
                Some(&user.access_token),
                json!({
                    "title": title,
                    "amount": amount,
                    "occurred_at": "2024-12-13T14:30:00Z"
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }
}
