//! Routes that require an admin key.
//!
//! The master key may act on any booth; a booth key only on its own booth.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiFailure, ApiResult};
use crate::extract::{Admin, JsonBody};
use crate::model::{now_iso, Booth, Menu, ReservationStatus};
use crate::{lenient_int, trimmed, AppState};

const DEFAULT_PAUSE_REASON: &str = "Paused because of high demand.";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateBooth {
    pub id: Option<String>,
    pub name: Option<String>,
    pub admin_key: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub capacity: Option<i64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoothStatus {
    pub booth_id: Option<String>,
    pub is_open: Option<bool>,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateMenu {
    pub id: Option<String>,
    pub booth_id: Option<String>,
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub price: Option<i64>,
    pub image_url: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub max_qty: Option<i64>,
    /// Free-form option objects, stored as sent.
    pub options: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReservationUpdate {
    /// Integer or digit string.
    pub id: Option<Value>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoothQuery {
    pub booth_id: Option<String>,
}

pub async fn whoami(admin: Admin) -> Json<Value> {
    Json(json!({ "role": admin.role(), "allowedBoothId": admin.allowed_booth_id() }))
}

pub async fn create_booth(
    State(state): State<AppState>,
    admin: Admin,
    JsonBody(input): JsonBody<CreateBooth>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    admin.ensure_master()?;

    let id = trimmed(input.id);
    let name = trimmed(input.name);
    let admin_key = trimmed(input.admin_key);
    if id.is_empty() || name.is_empty() || admin_key.is_empty() {
        return Err(ApiFailure::bad_request("id, name and adminKey are required"));
    }

    let mut store = state.db.write().await;
    if store.booth(&id).is_some() {
        return Err(ApiFailure::conflict(format!("booth id already exists: {id}")));
    }
    if admin_key == state.master_key() || store.booth_by_key(&admin_key).is_some() {
        return Err(ApiFailure::conflict("adminKey is already in use"));
    }

    store.booths.push(Booth {
        id: id.clone(),
        name,
        description: trimmed(input.description),
        capacity: input.capacity.unwrap_or_default(),
        image_url: trimmed(input.image_url),
        admin_key,
        is_open: true,
        closed_reason: String::new(),
    });
    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "id": id }))))
}

pub async fn set_booth_status(
    State(state): State<AppState>,
    admin: Admin,
    JsonBody(input): JsonBody<BoothStatus>,
) -> ApiResult<Json<Value>> {
    let booth_id = trimmed(input.booth_id);
    let (false, Some(is_open)) = (booth_id.is_empty(), input.is_open) else {
        return Err(ApiFailure::bad_request("boothId and isOpen (boolean) are required"));
    };

    let mut store = state.db.write().await;
    let booth = store
        .booth_mut(&booth_id)
        .ok_or_else(|| ApiFailure::not_found("Booth not found"))?;
    admin.ensure_booth(&booth_id, "Forbidden")?;

    let reason = trimmed(input.reason);
    booth.is_open = is_open;
    booth.closed_reason = match (is_open, reason.is_empty()) {
        (true, _) => String::new(),
        (false, true) => DEFAULT_PAUSE_REASON.to_string(),
        (false, false) => reason,
    };

    Ok(Json(json!({
        "ok": true,
        "boothId": booth_id,
        "isOpen": booth.is_open,
        "reason": booth.closed_reason,
    })))
}

pub async fn create_menu(
    State(state): State<AppState>,
    admin: Admin,
    JsonBody(input): JsonBody<CreateMenu>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = trimmed(input.id);
    let booth_id = trimmed(input.booth_id);
    let name = trimmed(input.name);
    let price = input.price.unwrap_or_default();
    let max_qty = input.max_qty.unwrap_or_default();

    if id.is_empty() || booth_id.is_empty() || name.is_empty() {
        return Err(ApiFailure::bad_request("id, boothId and name are required"));
    }
    if price < 0 {
        return Err(ApiFailure::bad_request("price must be 0 or more"));
    }
    if max_qty < 0 {
        return Err(ApiFailure::bad_request("maxQty must be 0 or more"));
    }

    let mut store = state.db.write().await;
    if store.booth(&booth_id).is_none() {
        return Err(ApiFailure::not_found("Booth not found"));
    }
    admin.ensure_booth(&booth_id, "Forbidden: cannot add menus to another booth")?;
    if store.menu(&id).is_some() {
        return Err(ApiFailure::conflict(format!("menu id already exists: {id}")));
    }

    store.menus.push(Menu {
        id: id.clone(),
        booth_id,
        name,
        price,
        image_url: trimmed(input.image_url),
        max_qty,
        options: input.options.unwrap_or_default(),
    });
    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "id": id }))))
}

pub async fn list_menus(
    State(state): State<AppState>,
    admin: Admin,
    Query(query): Query<BoothQuery>,
) -> ApiResult<Json<Value>> {
    let booth_id = required_booth(query)?;
    admin.ensure_booth(&booth_id, "Forbidden: cannot view another booth's menus")?;

    let store = state.db.read().await;
    Ok(Json(json!({ "items": store.booth_menus(&booth_id) })))
}

pub async fn list_reservations(
    State(state): State<AppState>,
    admin: Admin,
    Query(query): Query<BoothQuery>,
) -> ApiResult<Json<Value>> {
    let booth_id = required_booth(query)?;
    admin.ensure_booth(&booth_id, "Forbidden: cannot view another booth's reservations")?;

    let store = state.db.read().await;
    let mut rows: Vec<_> = store
        .reservations
        .iter()
        .filter(|r| r.booth_id == booth_id)
        .cloned()
        .collect();
    // Newest first; ids break ties within the same second.
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(Json(json!({ "items": rows })))
}

pub async fn set_reservation_status(
    State(state): State<AppState>,
    admin: Admin,
    JsonBody(input): JsonBody<ReservationUpdate>,
) -> ApiResult<Json<Value>> {
    let raw_id = input.id.filter(|id| !id.is_null());
    let status = trimmed(input.status);
    let Some(raw_id) = raw_id.filter(|_| !status.is_empty()) else {
        return Err(ApiFailure::bad_request("id and status are required"));
    };
    let status = ReservationStatus::parse(&status)
        .ok_or_else(|| ApiFailure::bad_request("status must be one of CONFIRMED/DONE/CANCELLED"))?;

    let mut store = state.db.write().await;
    let found = match reservation_id(&raw_id) {
        Some(id) => store.reservation_mut(id),
        None => None,
    };
    let reservation = found.ok_or_else(|| ApiFailure::not_found("Reservation not found"))?;
    admin.ensure_booth(
        &reservation.booth_id,
        "Forbidden: cannot change another booth's reservations",
    )?;

    reservation.status = status;
    match status {
        ReservationStatus::Done => reservation.done_at = Some(now_iso()),
        ReservationStatus::Cancelled => reservation.cancelled_at = Some(now_iso()),
        ReservationStatus::Confirmed => {}
    }

    Ok(Json(json!({ "ok": true, "id": reservation.id, "status": reservation.status })))
}

fn required_booth(query: BoothQuery) -> ApiResult<String> {
    let booth_id = trimmed(query.booth_id);
    if booth_id.is_empty() {
        return Err(ApiFailure::bad_request("boothId is required"));
    }
    Ok(booth_id)
}

fn reservation_id(raw: &Value) -> Option<u64> {
    match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s.parse().ok(),
        _ => None,
    }
}
