/// Common test utilities for integration tests
///
/// Provides a test context that wires the full router against a real
/// Postgres database, plus helpers for identity tokens and request
/// building. Tests skip themselves when no database is configured.

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use taskhive_api::app::{build_router, AppState};
use taskhive_api::config::{ApiConfig, Config, DatabaseConfig, IdentityConfig};
use taskhive_shared::auth::identity::{issue_identity_token, IdentityClaims};
use taskhive_shared::db::migrations;

/// Shared secret used to sign test identity tokens
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Test context holding the database pool and a ready-to-call router
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
}

impl TestContext {
    /// Connects to the test database and builds the app
    ///
    /// Returns None when neither TEST_DATABASE_URL nor DATABASE_URL is set,
    /// so database-backed tests skip on machines without Postgres.
    pub async fn try_new() -> Option<Self> {
        let url = std::env::var("TEST_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .ok()?;

        let db = PgPool::connect(&url)
            .await
            .expect("failed to connect to test database");

        migrations::run_migrations(&db)
            .await
            .expect("failed to run migrations");

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
            },
            identity: IdentityConfig {
                jwt_secret: TEST_SECRET.to_string(),
            },
        };

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Some(TestContext { db, app })
    }

    /// Issues a provider-style identity token for a test subject
    pub fn token_for(&self, subject: &str, email: &str) -> String {
        let claims = IdentityClaims::new(subject, email);
        issue_identity_token(&claims, TEST_SECRET).expect("failed to sign test token")
    }

    /// Generates a unique (subject, email) pair for one test actor
    pub fn fresh_actor(&self) -> (String, String) {
        let id = Uuid::new_v4().simple().to_string();
        (format!("sub-{}", id), format!("test-{}@example.com", id))
    }

    /// Sends a request through the router
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("request failed")
    }

    /// Sends a request and asserts the status, returning the parsed body
    pub async fn send_expect(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
        expected: StatusCode,
    ) -> serde_json::Value {
        let response = self.send(method, uri, token, body).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");

        assert_eq!(
            status,
            expected,
            "{}",
            String::from_utf8_lossy(&bytes)
        );

        if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response was not JSON")
        }
    }

    /// Deletes test users by email; workspaces and tasks cascade
    pub async fn cleanup(&self, emails: &[&str]) {
        for email in emails {
            sqlx::query("DELETE FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .execute(&self.db)
                .await
                .expect("cleanup failed");
        }
    }
}

/// Skips the current test when no test database is configured
#[macro_export]
macro_rules! require_db {
    () => {
        match common::TestContext::try_new().await {
            Some(ctx) => ctx,
            None => {
                eprintln!("skipping: TEST_DATABASE_URL / DATABASE_URL not set");
                return;
            }
        }
    };
}
