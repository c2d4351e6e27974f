//! Error handling for SHELF HTTP layer

use std::any::Any;

use axum::{
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

const HTTP_EXCEPTION: &str = "HTTP Exception";
const INTERNAL_ERROR: &str = "Internal Server Error";
const INTERNAL_DETAILS: &str = "An unexpected error occurred";

/// Standard error envelope for every non-2xx response except validation failures
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'static str>,
}

/// One failed field constraint
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub property_path: String,
    pub message: String,
}

impl Violation {
    pub fn new(property_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property_path: property_path.into(),
            message: message.into(),
        }
    }
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("http {status}: {message}")]
    Http { status: StatusCode, message: String },

    #[error("validation failed with {} violation(s)", .0.len())]
    Validation(Vec<Violation>),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an error carrying an explicit status code
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::http(StatusCode::BAD_REQUEST, message)
    }

    /// Create a validation error
    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::Validation(violations)
    }

    /// Status code this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Http { status, .. } => *status,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<garde::Report> for AppError {
    fn from(report: garde::Report) -> Self {
        let violations = report
            .iter()
            .map(|(path, error)| {
                let path = path.to_string();
                let path = if path.is_empty() {
                    "value".to_string()
                } else {
                    camel_case(&path)
                };
                Violation::new(path, error.message().to_string())
            })
            .collect();
        Self::Validation(violations)
    }
}

/// Property paths are reported the way the JSON payload spells them.
fn camel_case(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut upper_next = false;
    for c in path.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl From<shelf_db::DbError> for AppError {
    fn from(err: shelf_db::DbError) -> Self {
        match err {
            shelf_db::DbError::Query(e) => Self::Database(e),
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();

        let body = match self {
            AppError::Validation(violations) => {
                tracing::warn!(
                    error_id = %error_id,
                    status_code = %status.as_u16(),
                    violations = violations.len(),
                    "Request failed validation"
                );
                return (status, Json(violations)).into_response();
            }
            AppError::NotFound { message } => ErrorBody {
                status: status.as_u16(),
                message,
                error: None,
                details: None,
            },
            AppError::Http { message, .. } => ErrorBody {
                status: status.as_u16(),
                message,
                error: Some(HTTP_EXCEPTION),
                details: None,
            },
            AppError::Database(e) => internal_body(e.to_string()),
            AppError::Internal(e) => internal_body(format!("{e:#}")),
        };

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                error = %body.message,
                "Request error"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                message = %body.message,
                "Request error"
            );
        }

        (status, Json(body)).into_response()
    }
}

fn internal_body(message: String) -> ErrorBody {
    // Release builds never echo internal error text to clients
    let message = if cfg!(not(debug_assertions)) {
        "An internal server error occurred".to_string()
    } else {
        message
    };

    ErrorBody {
        status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        message,
        error: Some(INTERNAL_ERROR),
        details: Some(INTERNAL_DETAILS),
    }
}

/// Router fallback for paths no module serves
pub async fn route_not_found(method: Method, uri: Uri) -> AppError {
    AppError::not_found(format!("No route found for \"{} {}\"", method, uri.path()))
}

/// Router fallback for known paths hit with an unsupported method
pub async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::http(
        StatusCode::METHOD_NOT_ALLOWED,
        format!(
            "No route found for \"{} {}\": Method Not Allowed",
            method,
            uri.path()
        ),
    )
}

/// Wrap error responses produced by middleware (timeouts, body limits) in the
/// JSON envelope. Responses that already carry a content type pass through.
pub async fn envelope_bare_errors(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error())
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let message = status.canonical_reason().unwrap_or("Unexpected error");
    let mut enveloped = AppError::http(status, message).into_response();
    if let Some(allow) = allow {
        enveloped.headers_mut().insert(header::ALLOW, allow);
    }
    enveloped
}

/// Response for a handler that panicked
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let reason = if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Internal(anyhow::anyhow!("handler panicked: {reason}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_carries_status_and_message_only() {
        let response = AppError::not_found("Book object not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"status": 404, "message": "Book object not found"})
        );
    }

    #[tokio::test]
    async fn explicit_status_is_reported_as_http_exception() {
        let response = AppError::http(StatusCode::CONFLICT, "already there").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(response).await,
            json!({"status": 409, "message": "already there", "error": "HTTP Exception"})
        );
    }

    #[tokio::test]
    async fn internal_error_mapping() {
        let error = AppError::Internal(anyhow::anyhow!("Database connection failed"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["status"], 500);
        assert_eq!(body["error"], "Internal Server Error");
        assert_eq!(body["details"], "An unexpected error occurred");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn validation_errors_are_a_bare_list() {
        let error = AppError::validation(vec![Violation::new("title", "length is lower than 1")]);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!([{"propertyPath": "title", "message": "length is lower than 1"}])
        );
    }

    #[test]
    fn garde_report_becomes_violations() {
        #[derive(garde::Validate)]
        struct Draft {
            #[garde(length(min = 1))]
            title: String,
        }

        let report = garde::Validate::validate(&Draft {
            title: String::new(),
        })
        .unwrap_err();

        match AppError::from(report) {
            AppError::Validation(violations) => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].property_path, "title");
            }
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn property_paths_are_camel_cased() {
        assert_eq!(camel_case("cover_text"), "coverText");
        assert_eq!(camel_case("title"), "title");
        assert_eq!(camel_case("books[0].first_name"), "books[0].firstName");
    }

    #[tokio::test]
    async fn fallback_names_method_and_path() {
        let error = route_not_found(Method::GET, Uri::from_static("/api/nope")).await;
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await["message"],
            "No route found for \"GET /api/nope\""
        );
    }

    #[tokio::test]
    async fn unsupported_method_is_an_http_exception() {
        let error = method_not_allowed(Method::DELETE, Uri::from_static("/api/book/1")).await;
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_json(response).await,
            json!({
                "status": 405,
                "message": "No route found for \"DELETE /api/book/1\": Method Not Allowed",
                "error": "HTTP Exception"
            })
        );
    }

    #[tokio::test]
    async fn bodiless_error_gets_the_envelope() {
        let response = envelope_bare_errors(StatusCode::REQUEST_TIMEOUT.into_response()).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            body_json(response).await,
            json!({"status": 408, "message": "Request Timeout", "error": "HTTP Exception"})
        );
    }

    #[tokio::test]
    async fn json_errors_and_successes_pass_through() {
        let response = envelope_bare_errors(StatusCode::NO_CONTENT.into_response()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let not_found = AppError::not_found("Author object not found").into_response();
        let response = envelope_bare_errors(not_found).await;
        assert_eq!(
            body_json(response).await,
            json!({"status": 404, "message": "Author object not found"})
        );
    }

    #[test]
    fn panic_payload_maps_to_500() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
