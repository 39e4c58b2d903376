//! In-memory booth reservation API.
//!
//! Serves the JSON routes the booth client talks to under `/api/v1`. State
//! lives in a single `Store` behind a `RwLock` and is lost on restart.

pub mod admin;
pub mod error;
pub mod extract;
pub mod model;
pub mod public;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub use error::ApiFailure;
pub use extract::Admin;
pub use model::{Booth, Menu, OrderItem, Reservation, ReservationStatus, Store};

pub const API_PREFIX: &str = "/api/v1";

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    master_key: Arc<str>,
    pub db: Db,
}

impl AppState {
    pub fn new(master_key: &str) -> Self {
        Self {
            master_key: Arc::from(master_key),
            db: Arc::new(RwLock::new(Store::default())),
        }
    }

    pub fn master_key(&self) -> &str {
        &self.master_key
    }
}

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/booths", get(public::list_booths))
        .route("/booths/{booth_id}", get(public::get_booth))
        .route("/booths/{booth_id}/menus", get(public::booth_menus))
        .route("/orders", post(public::create_order))
        .route("/admin/whoami", get(admin::whoami))
        .route("/admin/booths", post(admin::create_booth))
        .route("/admin/booths/status", post(admin::set_booth_status))
        .route("/admin/menus", get(admin::list_menus).post(admin::create_menu))
        .route("/admin/reservations", get(admin::list_reservations))
        .route("/admin/reservations/status", post(admin::set_reservation_status));

    Router::new().nest(API_PREFIX, api).with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!("booth api listening on {addr}");
    }
    axum::serve(listener, app(state)).await
}

/// Integer field that also accepts numeric strings such as `"2"`.
///
/// `null` and blank strings read as missing; fractional numbers are truncated.
pub(crate) fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("not an integer: {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("not an integer: {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("not an integer: {other}"))),
    }
}

/// Trimmed copy of an optional string field; missing reads as empty.
pub(crate) fn trimmed(value: Option<String>) -> String {
    value.as_deref().unwrap_or_default().trim().to_string()
}
