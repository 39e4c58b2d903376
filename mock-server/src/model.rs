use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Booth {
    pub id: String,
    pub name: String,
    pub description: String,
    pub capacity: i64,
    pub image_url: String,
    /// Never sent to clients.
    #[serde(skip_serializing, default)]
    pub admin_key: String,
    pub is_open: bool,
    pub closed_reason: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: String,
    pub booth_id: String,
    pub name: String,
    pub price: i64,
    pub image_url: String,
    /// Per-order quantity limit; 0 means unlimited.
    pub max_qty: i64,
    /// Option objects as the admin sent them, e.g. `{code, label, priceDelta}`.
    pub options: Vec<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub menu_id: String,
    pub qty: i64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Confirmed,
    Done,
    Cancelled,
}

impl ReservationStatus {
    /// Case-insensitive parse of `CONFIRMED`, `DONE` or `CANCELLED`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CONFIRMED" => Some(Self::Confirmed),
            "DONE" => Some(Self::Done),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: u64,
    pub booth_id: String,
    pub student_no: String,
    pub student_name: String,
    pub phone: String,
    pub items: Vec<OrderItem>,
    pub total: i64,
    pub status: ReservationStatus,
    pub created_at: String,
    pub done_at: Option<String>,
    pub cancelled_at: Option<String>,
}

/// Everything the server knows, kept in memory.
#[derive(Debug, Default)]
pub struct Store {
    pub booths: Vec<Booth>,
    pub menus: Vec<Menu>,
    pub reservations: Vec<Reservation>,
}

impl Store {
    pub fn booth(&self, id: &str) -> Option<&Booth> {
        self.booths.iter().find(|b| b.id == id)
    }

    pub fn booth_mut(&mut self, id: &str) -> Option<&mut Booth> {
        self.booths.iter_mut().find(|b| b.id == id)
    }

    pub fn booth_by_key(&self, key: &str) -> Option<&Booth> {
        self.booths.iter().find(|b| b.admin_key == key)
    }

    pub fn menu(&self, id: &str) -> Option<&Menu> {
        self.menus.iter().find(|m| m.id == id)
    }

    pub fn booth_menus(&self, booth_id: &str) -> Vec<Menu> {
        self.menus
            .iter()
            .filter(|m| m.booth_id == booth_id)
            .cloned()
            .collect()
    }

    pub fn reservation_mut(&mut self, id: u64) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.id == id)
    }

    pub fn next_reservation_id(&self) -> u64 {
        self.reservations.iter().map(|r| r.id).max().map_or(1, |id| id + 1)
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
