//! Request extractors that reject with [`AppError`] instead of plain-text bodies.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;

/// Integer identifier taken from the single `{id}` segment of the route.
///
/// A segment that is not an integer does not address any resource, so it is
/// reported as not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId(pub i64);

impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        raw.parse::<i64>().map(EntityId).map_err(|_| {
            AppError::not_found(format!(
                "No route found for \"{} {}\"",
                parts.method,
                parts.uri.path()
            ))
        })
    }
}

/// Raw request body, read but not yet decoded.
///
/// Lets a handler look the target entity up before judging the payload.
#[derive(Debug, Clone, Default)]
pub struct RawBody(pub Bytes);

impl<S> FromRequest<S> for RawBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Bytes::from_request(req, state)
            .await
            .map(RawBody)
            .map_err(body_rejection)
    }
}

/// Body read failures keep their status (413 for oversized payloads)
fn body_rejection(rejection: BytesRejection) -> AppError {
    AppError::http(rejection.status(), rejection.body_text())
}

/// Request body decoded as a JSON object.
///
/// Keeps the raw fields around so handlers can read keys that are not part of
/// the entity they hydrate.
#[derive(Debug, Clone, Default)]
pub struct JsonObject(pub Map<String, Value>);

impl JsonObject {
    /// Parse raw bytes into an object
    pub fn parse(bytes: &[u8]) -> Result<Self, AppError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::bad_request("Request body is empty."));
        }

        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(fields)) => Ok(Self(fields)),
            Ok(_) => Err(AppError::bad_request(
                "JSON content was expected to decode to an object.",
            )),
            Err(e) => Err(AppError::bad_request(format!(
                "Could not decode request body: {e}"
            ))),
        }
    }

    /// Raw value of a single field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the payload carries `key` at all
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Hydrate a typed value from the whole object
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| AppError::bad_request(format!("Invalid request payload: {e}")))
    }
}

impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let RawBody(bytes) = RawBody::from_request(req, state).await?;
        Self::parse(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn object_payload_keeps_extra_fields() {
        let payload = JsonObject::parse(br#"{"title":"Dune","idAuthor":3}"#).unwrap();
        assert_eq!(payload.get("idAuthor"), Some(&Value::from(3)));
        assert!(payload.contains("title"));
        assert!(!payload.contains("coverText"));
    }

    #[test]
    fn decode_ignores_unknown_keys() {
        #[derive(Deserialize)]
        struct Title {
            title: String,
        }

        let payload = JsonObject::parse(br#"{"title":"Dune","idAuthor":3}"#).unwrap();
        let decoded: Title = payload.decode().unwrap();
        assert_eq!(decoded.title, "Dune");
    }

    #[test]
    fn empty_and_malformed_bodies_are_bad_requests() {
        let bodies: [&[u8]; 4] = [b"", b"  ", b"{not json", b"[1, 2]"];
        for body in bodies {
            let err = JsonObject::parse(body).unwrap_err();
            assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        }
    }
}
