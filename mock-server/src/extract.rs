//! Request extractors: lenient JSON bodies and admin authentication.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::error::ApiFailure;
use crate::AppState;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// JSON body that reads an empty request body as `T::default()` and turns
/// malformed JSON into a `{"error": ...}` 400.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiFailure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiFailure::bad_request(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| ApiFailure::bad_request(format!("invalid JSON body: {e}")))
    }
}

/// Caller authenticated with an admin key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admin {
    /// Holder of the server-wide master key.
    Master,
    /// Holder of one booth's key; limited to that booth.
    Booth(String),
}

impl Admin {
    pub fn role(&self) -> &'static str {
        match self {
            Admin::Master => "MASTER",
            Admin::Booth(_) => "BOOTH",
        }
    }

    pub fn allowed_booth_id(&self) -> Option<&str> {
        match self {
            Admin::Master => None,
            Admin::Booth(id) => Some(id),
        }
    }

    pub fn ensure_master(&self) -> Result<(), ApiFailure> {
        match self {
            Admin::Master => Ok(()),
            Admin::Booth(_) => Err(ApiFailure::forbidden("master key required")),
        }
    }

    /// Booth keys may only touch their own booth.
    pub fn ensure_booth(&self, booth_id: &str, message: &str) -> Result<(), ApiFailure> {
        match self {
            Admin::Booth(own) if own != booth_id => Err(ApiFailure::forbidden(message)),
            _ => Ok(()),
        }
    }
}

#[derive(Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

fn presented_key(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|k| !k.is_empty())
        .map(str::to_string);
    from_header.or_else(|| {
        Query::<KeyQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.key)
            .filter(|k| !k.is_empty())
    })
}

impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiFailure;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(key) = presented_key(parts) else {
            return Err(ApiFailure::unauthorized("Unauthorized: admin key required"));
        };
        if key == state.master_key() {
            return Ok(Admin::Master);
        }
        let store = state.db.read().await;
        store
            .booth_by_key(&key)
            .map(|booth| Admin::Booth(booth.id.clone()))
            .ok_or_else(|| ApiFailure::unauthorized("Unauthorized: invalid admin key"))
    }
}
