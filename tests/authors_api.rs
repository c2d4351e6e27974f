mod common;

use axum::http::StatusCode;
use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn list_is_empty_on_a_fresh_store() {
    let app = spawn_app().await;

    let response = app.get("/api/author/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!([]));
}

#[tokio::test]
async fn created_author_is_served_at_its_location() {
    let app = spawn_app().await;

    let created = app
        .post("/api/author", r#"{"firstName":"Jane","lastName":"Doe"}"#)
        .await;
    assert_eq!(created.status, StatusCode::CREATED);

    let body = created.json();
    assert_eq!(body["firstName"], "Jane");
    assert_eq!(body["lastName"], "Doe");
    assert_eq!(body["books"], json!([]));

    let id = body["id"].as_i64().unwrap();
    let location = created.location.unwrap();
    assert_eq!(location, format!("/api/author/{id}"));

    let fetched = app.get(&location).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json(), body);
}

#[tokio::test]
async fn author_nests_its_books_in_id_order() {
    let app = spawn_app().await;
    let author = app.create_author("Frank", "Herbert").await;
    let other = app.create_author("Iain", "Banks").await;
    app.create_book("Dune", author).await;
    app.create_book("Excession", other).await;
    app.create_book("Dune Messiah", author).await;

    let response = app.get(&format!("/api/author/{author}")).await;
    let titles: Vec<String> = response.json()["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Dune", "Dune Messiah"]);

    let list = app.get("/api/author/").await.json();
    assert_eq!(list.as_array().unwrap().len(), 2);
    assert_eq!(list[1]["books"][0]["title"], "Excession");
    assert_eq!(list[1]["books"][0]["coverText"], "about Excession");
}

#[tokio::test]
async fn unknown_author_is_a_404_envelope() {
    let app = spawn_app().await;

    let response = app.get("/api/author/999").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.json(),
        json!({"status": 404, "message": "Author object not found"})
    );

    assert_eq!(
        app.put("/api/author/999", r#"{"firstName":"X"}"#).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.delete("/api/author/999").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_does_not_match_a_route() {
    let app = spawn_app().await;

    let response = app.get("/api/author/abc").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["status"], 404);
}

#[tokio::test]
async fn update_only_touches_fields_present() {
    let app = spawn_app().await;
    let id = app.create_author("Jane", "Doe").await;

    let response = app
        .put(&format!("/api/author/{id}"), r#"{"lastName":"Austen"}"#)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());

    let body = app.get(&format!("/api/author/{id}")).await.json();
    assert_eq!(body["firstName"], "Jane");
    assert_eq!(body["lastName"], "Austen");
    assert_eq!(body["id"], id);
}

#[tokio::test]
async fn invalid_author_is_rejected_with_violations() {
    let app = spawn_app().await;

    let response = app.post("/api/author", r#"{"firstName":""}"#).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let violations = response.json();
    let paths: Vec<&str> = violations
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["propertyPath"].as_str().unwrap())
        .collect();
    assert!(paths.contains(&"firstName"));
    assert!(paths.contains(&"lastName"));
    assert_eq!(app.count("SELECT COUNT(*) FROM authors").await, 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request_envelope() {
    let app = spawn_app().await;

    let response = app.post("/api/author", "{\"firstName\":").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let body = response.json();
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "HTTP Exception");
}

#[tokio::test]
async fn deleting_an_author_cascades_to_its_books() {
    let app = spawn_app().await;
    let doomed = app.create_author("Frank", "Herbert").await;
    let kept = app.create_author("Iain", "Banks").await;
    for title in ["Dune", "Dune Messiah", "Children of Dune"] {
        app.create_book(title, doomed).await;
    }
    app.create_book("Excession", kept).await;

    let response = app.delete(&format!("/api/author/{doomed}")).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());

    assert_eq!(
        app.count(&format!("SELECT COUNT(*) FROM books WHERE author_id = {doomed}"))
            .await,
        0
    );
    assert_eq!(app.count("SELECT COUNT(*) FROM books").await, 1);
    assert_eq!(
        app.get(&format!("/api/author/{doomed}")).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn unsupported_method_is_an_http_exception() {
    let app = spawn_app().await;
    let id = app.create_author("Jane", "Doe").await;

    let response = app
        .send("PATCH", &format!("/api/author/{id}"), Some(r#"{"lastName":"Austen"}"#))
        .await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);

    let body = response.json();
    assert_eq!(body["status"], 405);
    assert_eq!(body["error"], "HTTP Exception");
}

#[tokio::test]
async fn oversized_update_body_is_an_http_exception() {
    let app = spawn_app().await;
    let id = app.create_author("Jane", "Doe").await;

    let huge = format!(r#"{{"lastName":"{}"}}"#, "x".repeat(3 * 1024 * 1024));
    let response = app.put(&format!("/api/author/{id}"), &huge).await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);

    let body = response.json();
    assert_eq!(body["status"], 413);
    assert_eq!(body["error"], "HTTP Exception");

    let stored = app.get(&format!("/api/author/{id}")).await.json();
    assert_eq!(stored["lastName"], "Doe");
}
