#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use shelf_db::Db;
use shelf_kernel::settings::Settings;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub db: Db,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub async fn spawn_app() -> TestApp {
    let db = Db::connect_in_memory().await.unwrap();
    let registry = shelf_app::bootstrap::build_registry();
    registry.run_migrations(&db).await.unwrap();

    let router = shelf_http::build_router(&registry, &Settings::default(), db.clone());
    TestApp { router, db }
}

impl TestApp {
    pub async fn send(&self, method: &str, path: &str, body: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();

        TestResponse {
            status,
            location,
            body,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send("GET", path, None).await
    }

    pub async fn post(&self, path: &str, body: &str) -> TestResponse {
        self.send("POST", path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &str) -> TestResponse {
        self.send("PUT", path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.send("DELETE", path, None).await
    }

    /// Create an author and return its id
    pub async fn create_author(&self, first_name: &str, last_name: &str) -> i64 {
        let response = self
            .post(
                "/api/author",
                &format!(r#"{{"firstName":"{first_name}","lastName":"{last_name}"}}"#),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.json()["id"].as_i64().unwrap()
    }

    /// Create a book attached to `author_id` and return its id
    pub async fn create_book(&self, title: &str, author_id: i64) -> i64 {
        let response = self
            .post(
                "/api/book",
                &format!(r#"{{"title":"{title}","coverText":"about {title}","idAuthor":{author_id}}}"#),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.json()["id"].as_i64().unwrap()
    }

    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(self.db.pool()).await.unwrap()
    }
}
