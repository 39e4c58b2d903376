//! Routes anyone can call: browsing booths and placing orders.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiFailure, ApiResult};
use crate::extract::JsonBody;
use crate::model::{now_iso, Booth, Menu, OrderItem, Reservation, ReservationStatus};
use crate::{lenient_int, trimmed, AppState};

const DEFAULT_CLOSED_REASON: &str = "The queue is paused for now.";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateOrder {
    pub booth_id: Option<String>,
    pub student_no: Option<String>,
    pub student_name: Option<String>,
    pub phone: Option<String>,
    pub items: Option<Vec<OrderItemInput>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderItemInput {
    pub menu_id: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub qty: Option<i64>,
}

pub async fn list_booths(State(state): State<AppState>) -> Json<Vec<Booth>> {
    let store = state.db.read().await;
    Json(store.booths.clone())
}

pub async fn get_booth(
    State(state): State<AppState>,
    Path(booth_id): Path<String>,
) -> ApiResult<Json<Booth>> {
    let store = state.db.read().await;
    store
        .booth(&booth_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiFailure::not_found("Booth not found"))
}

pub async fn booth_menus(
    State(state): State<AppState>,
    Path(booth_id): Path<String>,
) -> ApiResult<Json<Vec<Menu>>> {
    let store = state.db.read().await;
    if store.booth(&booth_id).is_none() {
        return Err(ApiFailure::not_found("Booth not found"));
    }
    Ok(Json(store.booth_menus(&booth_id)))
}

pub async fn create_order(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateOrder>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let booth_id = trimmed(input.booth_id);
    let student_no = trimmed(input.student_no);
    let student_name = trimmed(input.student_name);
    let phone = trimmed(input.phone);
    let items = input.items.unwrap_or_default();

    if booth_id.is_empty() || student_no.is_empty() || student_name.is_empty() || phone.is_empty() {
        return Err(ApiFailure::bad_request(
            "boothId, studentNo, studentName and phone are required",
        ));
    }
    if student_no.len() != 4 || !student_no.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiFailure::bad_request("studentNo must be 4 digits"));
    }
    if items.is_empty() {
        return Err(ApiFailure::bad_request("items are required"));
    }

    let mut store = state.db.write().await;
    let booth = store
        .booth(&booth_id)
        .ok_or_else(|| ApiFailure::not_found("Booth not found"))?;
    if !booth.is_open {
        let reason = if booth.closed_reason.is_empty() {
            DEFAULT_CLOSED_REASON.to_string()
        } else {
            booth.closed_reason.clone()
        };
        return Err(ApiFailure::conflict(reason).with_code("BOOTH_CLOSED"));
    }

    let (total, items) = price_order(&store.booth_menus(&booth_id), &items)?;

    let reservation = Reservation {
        id: store.next_reservation_id(),
        booth_id,
        student_no,
        student_name,
        phone,
        items,
        total,
        status: ReservationStatus::Confirmed,
        created_at: now_iso(),
        done_at: None,
        cancelled_at: None,
    };
    let id = reservation.id;
    store.reservations.push(reservation);

    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "id": id, "total": total }))))
}

/// Validate order lines against a booth's menus and compute the total.
///
/// Lines with a non-positive quantity are skipped. Every remaining line must
/// name one of `menus` and respect its `maxQty`.
pub fn price_order(menus: &[Menu], items: &[OrderItemInput]) -> ApiResult<(i64, Vec<OrderItem>)> {
    let menus: HashMap<&str, &Menu> = menus.iter().map(|m| (m.id.as_str(), m)).collect();
    let mut total: i64 = 0;
    let mut lines = Vec::new();

    for item in items {
        let menu_id = item.menu_id.as_deref().unwrap_or_default().trim();
        let qty = item.qty.unwrap_or_default();
        if qty <= 0 {
            continue;
        }
        let menu = menus
            .get(menu_id)
            .ok_or_else(|| ApiFailure::bad_request(format!("unknown menu for this booth: {menu_id}")))?;
        if menu.max_qty > 0 && qty > menu.max_qty {
            return Err(ApiFailure::bad_request(format!(
                "{} is limited to {} per order",
                menu.name, menu.max_qty
            )));
        }
        total = menu
            .price
            .checked_mul(qty)
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| ApiFailure::bad_request("order total is too large"))?;
        lines.push(OrderItem {
            menu_id: menu_id.to_string(),
            qty,
        });
    }

    if lines.is_empty() {
        return Err(ApiFailure::bad_request("no valid order items"));
    }
    Ok((total, lines))
}
