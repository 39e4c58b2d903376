//! Blocking JSON client for the booth reservation API.
//!
//! # Overview
//! Resolves the API base URL from a page origin, attaches the standard
//! headers (and the admin key when one is stored), sends JSON bodies and
//! normalizes failures into `ApiError`.
//!
//! # Design
//! - `ApiClient` is stateless apart from its immutable `ApiConfig`, an
//!   injected `AdminKeySource` and a `Transport`.
//! - Each request is split into `build_request` (produces an `HttpRequest`)
//!   and `parse_response` (consumes an `HttpResponse`), so the I/O boundary
//!   is explicit and the core can be tested without a network.
//! - `get`/`post`/`put` are thin shorthands over `request`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod storage;
pub mod transport;
pub mod url;

pub use client::ApiClient;
pub use config::ApiConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use storage::{AdminKeySource, LocalStorage, NoAdminKey, StaticAdminKey};
pub use transport::{Transport, UreqTransport};
pub use url::join_url;
